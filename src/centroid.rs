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

use crate::{PixelSample, SampleSet};

/// The mean color of a group of samples.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "crate::sample::RawColor"))]
pub struct Centroid {
    red: u8,
    green: u8,
    blue: u8,
    alpha: f32,
}

impl Centroid {
    /// Fully opaque white, used as the background when there is nothing to average.
    pub const NEUTRAL: Centroid = Centroid {
        red: 255,
        green: 255,
        blue: 255,
        alpha: 1.0,
    };

    /// Create a new centroid. Alpha is clamped the same way as for [`PixelSample::new`].
    pub fn new(rgb: (u8, u8, u8), alpha: f32) -> Self {
        Self::from(PixelSample::new(rgb, alpha))
    }

    /// The per-channel mean of the given samples, with red, green and blue rounded to the nearest
    /// integer. Returns `None` when there are no samples.
    pub fn mean<'a, I>(samples: I) -> Option<Centroid>
    where
        I: IntoIterator<Item = &'a PixelSample>,
    {
        let (count, red_sum, green_sum, blue_sum, alpha_sum) = samples.into_iter().fold(
            (0u64, 0u64, 0u64, 0u64, 0f64),
            |(count, red_sum, green_sum, blue_sum, alpha_sum), sample| {
                let (r, g, b) = sample.rgb();

                (
                    count + 1,
                    red_sum + r as u64,
                    green_sum + g as u64,
                    blue_sum + b as u64,
                    alpha_sum + sample.alpha() as f64,
                )
            },
        );

        if count == 0 {
            return None;
        }

        let mean = |sum: u64| (sum as f64 / count as f64).round() as u8;
        let alpha = (alpha_sum / count as f64) as f32;

        Some(Centroid {
            red: mean(red_sum),
            green: mean(green_sum),
            blue: mean(blue_sum),
            alpha: alpha.clamp(0.0, 1.0),
        })
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        (self.red, self.green, self.blue)
    }

    pub fn alpha(self) -> f32 {
        self.alpha
    }

    /// Squared euclidean distance to a sample over red, green and blue. Alpha does not count.
    pub fn distance_squared(self, sample: &PixelSample) -> u32 {
        let (r, g, b) = sample.rgb();
        let dr = self.red as i32 - r as i32;
        let dg = self.green as i32 - g as i32;
        let db = self.blue as i32 - b as i32;

        (dr * dr + dg * dg + db * db) as u32
    }
}

impl From<PixelSample> for Centroid {
    fn from(sample: PixelSample) -> Self {
        let (red, green, blue) = sample.rgb();

        Self {
            red,
            green,
            blue,
            alpha: sample.alpha(),
        }
    }
}

/// Compute the mean color over every sample. An empty set gives [`Centroid::NEUTRAL`].
///
/// This is k-means with a single cluster, computed directly.
pub fn estimate_dominant_color(samples: &SampleSet) -> Centroid {
    Centroid::mean(samples).unwrap_or(Centroid::NEUTRAL)
}
