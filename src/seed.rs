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

//! k-means++ seeding.
//!
//! The first centroid is picked uniformly at random. Every following centroid is drawn from the
//! samples not yet picked, with a probability proportional to the squared distance between the
//! sample and its nearest already picked centroid. Samples close to an existing centroid are
//! unlikely to be picked again, which spreads the initial centroids across the color space.

use crate::{Centroid, PixelSample, QuantizeError};
use rand::Rng;

/// Pick `k` initial centroids from `samples` using k-means++.
///
/// # Errors
///
/// Returns [`QuantizeError::EmptyInput`] for an empty slice and [`QuantizeError::InvalidK`] if `k`
/// is zero or larger than the number of samples.
pub fn seed_centroids<R>(samples: &[PixelSample], k: usize, rng: &mut R) -> Result<Vec<Centroid>, QuantizeError>
where
    R: Rng + ?Sized,
{
    check_k(samples, k)?;

    let mut centroids = Vec::with_capacity(k);
    let mut chosen = vec![false; samples.len()];

    let first = rng.gen_range(0..samples.len());
    chosen[first] = true;
    centroids.push(Centroid::from(samples[first]));

    // squared distance from each sample to its nearest chosen centroid, updated as centroids are added
    let mut nearest = samples
        .iter()
        .map(|sample| centroids[0].distance_squared(sample) as u64)
        .collect::<Vec<_>>();

    while centroids.len() < k {
        let next = pick_weighted(&nearest, &chosen, rng).unwrap_or_else(|| pick_uniform(&chosen, rng));

        chosen[next] = true;
        let centroid = Centroid::from(samples[next]);
        centroids.push(centroid);

        for (distance, sample) in nearest.iter_mut().zip(samples) {
            *distance = (*distance).min(centroid.distance_squared(sample) as u64);
        }
    }

    tracing::trace!(k, samples = samples.len(), "seeded centroids");
    Ok(centroids)
}

pub(crate) fn check_k(samples: &[PixelSample], k: usize) -> Result<(), QuantizeError> {
    if samples.is_empty() {
        Err(QuantizeError::EmptyInput)
    } else if k == 0 || k > samples.len() {
        Err(QuantizeError::InvalidK { k, len: samples.len() })
    } else {
        Ok(())
    }
}

/// Draw an index with probability proportional to its distance by inverting the cumulative
/// distribution. Returns `None` if every remaining sample has zero distance.
fn pick_weighted<R>(distances: &[u64], chosen: &[bool], rng: &mut R) -> Option<usize>
where
    R: Rng + ?Sized,
{
    let remaining = || {
        distances
            .iter()
            .zip(chosen)
            .enumerate()
            .filter(|(_, (_, &chosen))| !chosen)
            .map(|(i, (&distance, _))| (i, distance))
    };

    let total: u64 = remaining().map(|(_, distance)| distance).sum();
    if total == 0 {
        return None;
    }

    let target = rng.gen_range(0..total);
    invert_cumulative(remaining(), target)
}

/// The index of the first weight whose running sum exceeds `target`.
fn invert_cumulative<I>(weights: I, target: u64) -> Option<usize>
where
    I: IntoIterator<Item = (usize, u64)>,
{
    let mut cumulative = 0;

    weights.into_iter().find_map(|(i, weight)| {
        cumulative += weight;
        (cumulative > target).then_some(i)
    })
}

fn pick_uniform<R>(chosen: &[bool], rng: &mut R) -> usize
where
    R: Rng + ?Sized,
{
    let remaining = chosen.iter().filter(|&&chosen| !chosen).count();
    let nth = rng.gen_range(0..remaining);

    chosen
        .iter()
        .enumerate()
        .filter(|(_, &chosen)| !chosen)
        .nth(nth)
        .map(|(i, _)| i)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn opaque(rgb: (u8, u8, u8)) -> PixelSample {
        PixelSample::new(rgb, 1.0)
    }

    #[test]
    fn rejects_invalid_k() {
        let rng = &mut StdRng::seed_from_u64(0);
        let samples = [opaque((0, 0, 0)), opaque((1, 1, 1))];

        assert_eq!(seed_centroids(&[], 1, rng), Err(QuantizeError::EmptyInput));
        assert_eq!(
            seed_centroids(&samples, 0, rng),
            Err(QuantizeError::InvalidK { k: 0, len: 2 })
        );
        assert_eq!(
            seed_centroids(&samples, 3, rng),
            Err(QuantizeError::InvalidK { k: 3, len: 2 })
        );
    }

    #[test]
    fn picks_k_distinct_samples() {
        let samples = (0..50u8).map(|i| opaque((i * 5, 255 - i * 5, i))).collect::<Vec<_>>();

        for seed in 0..20 {
            let rng = &mut StdRng::seed_from_u64(seed);
            let centroids = seed_centroids(&samples, 8, rng).unwrap();

            assert_eq!(centroids.len(), 8);
            for (i, a) in centroids.iter().enumerate() {
                assert!(samples.iter().any(|s| Centroid::from(*s) == *a));
                assert!(centroids[i + 1..].iter().all(|b| a != b));
            }
        }
    }

    #[test]
    fn same_seed_gives_same_centroids() {
        let samples = (0..=255u8).map(|i| opaque((i, i / 2, 255 - i))).collect::<Vec<_>>();

        let a = seed_centroids(&samples, 5, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = seed_centroids(&samples, 5, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn separated_groups_each_get_a_centroid() {
        // two tight groups far apart; after the first pick the other group holds nearly all weight
        let mut samples = vec![opaque((0, 0, 0)); 10];
        samples.extend(vec![opaque((255, 255, 255)); 10]);

        for seed in 0..20 {
            let centroids = seed_centroids(&samples, 2, &mut StdRng::seed_from_u64(seed)).unwrap();
            assert_ne!(centroids[0], centroids[1]);
        }
    }

    #[test]
    fn identical_samples_fall_back_to_uniform() {
        let samples = vec![opaque((9, 9, 9)); 4];
        let centroids = seed_centroids(&samples, 4, &mut StdRng::seed_from_u64(3)).unwrap();

        assert_eq!(centroids, vec![Centroid::new((9, 9, 9), 1.0); 4]);
    }

    #[test]
    fn cumulative_inversion_maps_targets_to_weight_ranges() {
        let weights = || vec![(0, 2), (1, 0), (2, 3), (3, 1)];

        let picks = (0..6).map(|target| invert_cumulative(weights(), target)).collect::<Vec<_>>();
        assert_eq!(picks, vec![Some(0), Some(0), Some(2), Some(2), Some(2), Some(3)]);
        assert_eq!(invert_cumulative(weights(), 6), None);
    }

    #[test]
    fn weighted_pick_is_proportional_to_distance() {
        let rng = &mut StdRng::seed_from_u64(2024);
        let chosen = [false, false];
        let draws = 20_000;

        let heavy = (0..draws)
            .filter(|_| pick_weighted(&[1, 9], &chosen, rng) == Some(1))
            .count();
        let frequency = heavy as f64 / draws as f64;

        assert!((0.88..=0.92).contains(&frequency), "frequency {frequency}");
    }

    #[test]
    fn second_seed_follows_squared_distance() {
        // from the origin, the sample at distance 3 weighs 9 against 1 for the sample at distance 1
        let samples = [opaque((0, 0, 0)), opaque((1, 0, 0)), opaque((3, 0, 0))];
        let draws = 20_000;
        let mut far = 0;
        let mut starts = 0;

        for seed in 0..draws {
            let centroids = seed_centroids(&samples, 2, &mut StdRng::seed_from_u64(seed)).unwrap();
            if centroids[0].rgb() == (0, 0, 0) {
                starts += 1;
                if centroids[1].rgb() == (3, 0, 0) {
                    far += 1;
                }
            }
        }

        let frequency = far as f64 / starts as f64;
        assert!((0.87..=0.93).contains(&frequency), "frequency {frequency}");
    }

    #[test]
    fn weighted_pick_skips_zero_weights() {
        let rng = &mut StdRng::seed_from_u64(7);
        let chosen = [false, true, false, false];

        for _ in 0..100 {
            assert_eq!(pick_weighted(&[0, 10, 5, 0], &chosen, rng), Some(2));
        }
        assert_eq!(pick_weighted(&[0, 10, 0, 0], &chosen, rng), None);
    }
}
