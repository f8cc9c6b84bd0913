// Copyright 2022 Spanfile
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Batch k-means (Lloyd's algorithm) over RGB.
//!
//! Each iteration assigns every sample to its nearest centroid and then moves every centroid to the
//! mean of its samples. Centroid channels are integers, so the set of reachable states is finite and
//! the iteration stops once a pass leaves every centroid exactly where it was. An iteration cap
//! bounds pathological runs regardless.

use crate::{seed::check_k, Centroid, PixelSample, QuantizeError, DEFAULT_ITERATION_CAP};
use rand::{seq::SliceRandom, Rng};

/// The outcome of a clustering run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Clustering {
    centroids: Vec<Centroid>,
    populations: Vec<usize>,
    iterations: usize,
    converged: bool,
}

/// The clustering engine. Holds the samples and the iteration cap; the centroids are passed in.
#[derive(Debug, Clone, Copy)]
pub struct Kmeans<'a> {
    samples: &'a [PixelSample],
    iteration_cap: usize,
}

/// A centroid and the samples assigned to it during one iteration.
struct Cluster<'a> {
    centroid: Centroid,
    members: Vec<&'a PixelSample>,
}

enum State<'a> {
    Assigning(Vec<Centroid>),
    Updating(Vec<Cluster<'a>>),
    Converged(Vec<Cluster<'a>>),
}

impl Clustering {
    /// The final centroids, in seed order.
    pub fn centroids(&self) -> &[Centroid] {
        &self.centroids
    }

    /// The number of samples assigned to each centroid in the last assignment pass.
    pub fn populations(&self) -> &[usize] {
        &self.populations
    }

    /// How many assignment passes ran. Never more than the iteration cap.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Whether the centroids stopped moving before the iteration cap was reached.
    pub fn converged(&self) -> bool {
        self.converged
    }

    pub(crate) fn into_parts(self) -> (Vec<Centroid>, Vec<usize>) {
        (self.centroids, self.populations)
    }
}

impl<'a> Kmeans<'a> {
    pub fn new(samples: &'a [PixelSample]) -> Self {
        Self {
            samples,
            iteration_cap: DEFAULT_ITERATION_CAP,
        }
    }

    pub fn iteration_cap(self, iteration_cap: usize) -> Self {
        Self { iteration_cap, ..self }
    }

    /// Run k-means starting from `centroids` until the centroids stop moving or the iteration cap
    /// is hit. `rng` is used to reseed clusters that end up with no samples.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no samples, or if the number of centroids is zero or larger
    /// than the number of samples.
    pub fn run<R>(self, centroids: Vec<Centroid>, rng: &mut R) -> Result<Clustering, QuantizeError>
    where
        R: Rng + ?Sized,
    {
        check_k(self.samples, centroids.len())?;

        let mut iterations = 0;
        let mut state = State::Assigning(centroids);

        loop {
            state = match state {
                State::Assigning(centroids) if iterations >= self.iteration_cap => {
                    tracing::warn!(
                        iterations,
                        k = centroids.len(),
                        "k-means hit the iteration cap before converging"
                    );

                    let populations = self.assign(&centroids).iter().map(|c| c.members.len()).collect();
                    return Ok(Clustering {
                        centroids,
                        populations,
                        iterations,
                        converged: false,
                    });
                }
                State::Assigning(centroids) => {
                    iterations += 1;
                    State::Updating(self.assign(&centroids))
                }
                State::Updating(clusters) => {
                    let centroids = self.update(&clusters, rng);

                    if clusters.iter().map(|c| c.centroid).eq(centroids.iter().copied()) {
                        State::Converged(clusters)
                    } else {
                        tracing::trace!(iteration = iterations, "centroids moved");
                        State::Assigning(centroids)
                    }
                }
                State::Converged(clusters) => {
                    tracing::debug!(iterations, k = clusters.len(), "k-means converged");

                    let (centroids, populations) =
                        clusters.into_iter().map(|c| (c.centroid, c.members.len())).unzip();
                    return Ok(Clustering {
                        centroids,
                        populations,
                        iterations,
                        converged: true,
                    });
                }
            };
        }
    }

    /// Partition the samples by their nearest centroid. Ties go to the earliest centroid.
    fn assign(&self, centroids: &[Centroid]) -> Vec<Cluster<'a>> {
        let mut clusters = centroids
            .iter()
            .map(|&centroid| Cluster {
                centroid,
                members: Vec::new(),
            })
            .collect::<Vec<_>>();

        for sample in self.samples {
            clusters[nearest_centroid(centroids, sample)].members.push(sample);
        }

        clusters
    }

    /// Move every centroid to the mean of its members. A cluster without members gets a random
    /// sample as its new centroid.
    fn update<R>(&self, clusters: &[Cluster<'a>], rng: &mut R) -> Vec<Centroid>
    where
        R: Rng + ?Sized,
    {
        clusters
            .iter()
            .enumerate()
            .map(|(index, cluster)| {
                Centroid::mean(cluster.members.iter().copied()).unwrap_or_else(|| {
                    tracing::trace!(cluster = index, "reseeding empty cluster");
                    // samples is never empty once run has checked its input
                    self.samples
                        .choose(rng)
                        .map(|&sample| Centroid::from(sample))
                        .unwrap_or(cluster.centroid)
                })
            })
            .collect()
    }
}

fn nearest_centroid(centroids: &[Centroid], sample: &PixelSample) -> usize {
    let mut best = 0;
    let mut best_distance = u32::MAX;

    for (i, centroid) in centroids.iter().enumerate() {
        let distance = centroid.distance_squared(sample);
        if distance < best_distance {
            best = i;
            best_distance = distance;
        }
    }

    best
}
