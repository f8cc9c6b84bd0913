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

//! A library to extract a background color and a color palette from an image.
//!
//! The background is the mean color over every pixel. The palette is computed with k-means
//! clustering over RGB, seeded with k-means++, on a downsampled copy of the image.
//!
//! ```
//! use huepick::{image::{Rgb, RgbImage}, Palette};
//!
//! let image = RgbImage::from_fn(64, 64, |x, _| {
//!     if x < 32 { Rgb([200, 30, 30]) } else { Rgb([30, 30, 200]) }
//! });
//! let palette = Palette::from_image(image).palette_size(2).seed(1).generate();
//!
//! assert_eq!(palette.entries().len(), 2);
//! assert_eq!(palette.background().rgb(), (115, 30, 115));
//! ```
//!
//! The individual stages are also available on their own: [`extract_samples`],
//! [`estimate_dominant_color`] and [`compute_palette`]. The computation is CPU bound and runs on
//! the calling thread; callers with a UI should run it on a worker thread.

mod centroid;
mod config;
mod entry;
mod error;
mod kmeans;
mod sample;
mod seed;

pub const DEFAULT_MAX_DIMENSION: u32 = 300;
pub const DEFAULT_PALETTE_SIZE: usize = 5;
pub const DEFAULT_ITERATION_CAP: usize = 100;

pub use crate::{
    centroid::{estimate_dominant_color, Centroid},
    config::{PaletteConfig, PaletteOrder},
    entry::{format_hex, format_rgba, parse_hex, PaletteEntry},
    error::{ParseHexError, QuantizeError},
    kmeans::{Clustering, Kmeans},
    sample::{downsample, extract_samples, PixelSample, SampleSet},
    seed::seed_centroids,
};
pub use image;
pub use palette;

use image::{imageops::FilterType, math::Rect, DynamicImage, ImageBuffer, Rgba};
use palette::IntoColor;
use rand::{rngs::StdRng, Rng, SeedableRng};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Palette {
    entries: Vec<PaletteEntry>,
    background: Centroid,
    sample_count: usize,
    iterations: usize,
    converged: bool,
}

pub struct PaletteBuilder<P>
where
    P: image::Pixel<Subpixel = u8> + 'static,
{
    image: ImageBuffer<P, Vec<u8>>,
    config: PaletteConfig,
    region: Option<Rect>,
    filter: FilterType,
    seed: Option<u64>,
}

impl Palette {
    pub fn from_image<P>(image: ImageBuffer<P, Vec<u8>>) -> PaletteBuilder<P>
    where
        P: image::Pixel<Subpixel = u8> + 'static,
    {
        PaletteBuilder::from_image(image)
    }

    pub fn from_dynamic_image(image: DynamicImage) -> PaletteBuilder<Rgba<u8>> {
        PaletteBuilder::from_image(image.into_rgba8())
    }

    /// Start from a raw, tightly packed RGBA8 buffer.
    pub fn from_rgba8(width: u32, height: u32, bytes: Vec<u8>) -> Result<PaletteBuilder<Rgba<u8>>, QuantizeError> {
        sample::rgba_image(width, height, bytes).map(PaletteBuilder::from_image)
    }

    /// A palette with no colors, used when there is nothing to cluster.
    pub fn empty(background: Centroid) -> Palette {
        Self {
            entries: Vec::new(),
            background,
            sample_count: 0,
            iterations: 0,
            converged: false,
        }
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<PaletteEntry> {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The mean color of the image.
    pub fn background(&self) -> Centroid {
        self.background
    }

    /// The background as a formatted entry, with every sampled pixel as its population.
    pub fn background_entry(&self) -> PaletteEntry {
        PaletteEntry::new(self.background, self.sample_count)
    }

    pub fn most_prominent(&self) -> Option<&PaletteEntry> {
        self.entries.iter().max_by_key(|entry| entry.population())
    }

    /// The number of k-means iterations that were run.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn converged(&self) -> bool {
        self.converged
    }
}

impl<P> PaletteBuilder<P>
where
    P: image::Pixel<Subpixel = u8> + 'static,
{
    pub fn from_image(image: ImageBuffer<P, Vec<u8>>) -> Self {
        Self {
            image,
            config: PaletteConfig::new(),
            region: None,
            filter: FilterType::Nearest,
            seed: None,
        }
    }

    pub fn config(self, config: PaletteConfig) -> Self {
        Self { config, ..self }
    }

    pub fn max_dimension(self, max_dimension: u32) -> Self {
        Self {
            config: self.config.max_dimension(max_dimension),
            ..self
        }
    }

    pub fn palette_size(self, palette_size: usize) -> Self {
        Self {
            config: self.config.palette_size(palette_size),
            ..self
        }
    }

    pub fn iteration_cap(self, iteration_cap: usize) -> Self {
        Self {
            config: self.config.iteration_cap(iteration_cap),
            ..self
        }
    }

    pub fn order(self, order: PaletteOrder) -> Self {
        Self {
            config: self.config.order(order),
            ..self
        }
    }

    /// The filter used when scaling the image down.
    pub fn resize_filter(self, filter: FilterType) -> Self {
        Self { filter, ..self }
    }

    /// Fix the random seed so the same image always gives the same palette.
    pub fn seed(self, seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..self
        }
    }

    pub fn region(self, x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            region: Some(Rect { x, y, width, height }),
            ..self
        }
    }

    pub fn clear_region(self) -> Self {
        Self { region: None, ..self }
    }

    pub fn generate(self) -> Palette {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        self.generate_with_rng(&mut rng)
    }

    /// Generate the palette using the given random number generator for seeding.
    ///
    /// This never fails. An image without pixels gives an empty palette over a white background,
    /// and an image with fewer pixels than requested colors gives one color per pixel at most.
    pub fn generate_with_rng<R>(self, rng: &mut R) -> Palette
    where
        R: Rng + ?Sized,
    {
        let image = match self.region {
            Some(Rect { x, y, width, height }) => image::imageops::crop_imm(&self.image, x, y, width, height).to_image(),
            None => self.image,
        };

        // the background uses every pixel, the palette only the downsampled ones
        let full_samples = extract_samples(&image);
        let background = estimate_dominant_color(&full_samples);
        let sample_count = full_samples.len();
        drop(full_samples);

        let image = downsample(image, self.config.get_max_dimension(), self.filter);
        let samples = extract_samples(&image);

        let k = self.config.get_palette_size().min(samples.len());
        if k == 0 {
            tracing::debug!(samples = samples.len(), "no samples to build a palette from");
            return Palette {
                sample_count,
                ..Palette::empty(background)
            };
        }

        match compute_palette_with(&samples, &self.config.palette_size(k), rng) {
            Ok(palette) => Palette {
                background,
                sample_count,
                ..palette
            },
            Err(err) => {
                tracing::warn!(%err, "palette computation failed");
                Palette {
                    sample_count,
                    ..Palette::empty(background)
                }
            }
        }
    }
}

/// Compute a palette of `k` colors with the default iteration cap. Entries are in seed order.
///
/// # Errors
///
/// Returns [`QuantizeError::EmptyInput`] if there are no samples and [`QuantizeError::InvalidK`] if
/// `k` is zero or larger than the number of samples.
pub fn compute_palette<R>(samples: &SampleSet, k: usize, rng: &mut R) -> Result<Vec<PaletteEntry>, QuantizeError>
where
    R: Rng + ?Sized,
{
    compute_palette_with(samples, &PaletteConfig::new().palette_size(k), rng).map(Palette::into_entries)
}

/// Compute a palette using the palette size, iteration cap and ordering from `config`.
///
/// The samples are used as they are; `config`'s maximum dimension only applies when starting from
/// an image through [`PaletteBuilder`]. The palette's background is the mean of `samples`.
///
/// # Errors
///
/// See [`compute_palette`].
pub fn compute_palette_with<R>(samples: &SampleSet, config: &PaletteConfig, rng: &mut R) -> Result<Palette, QuantizeError>
where
    R: Rng + ?Sized,
{
    let seeds = seed_centroids(samples.as_slice(), config.get_palette_size(), rng)?;
    let clustering = Kmeans::new(samples.as_slice())
        .iteration_cap(config.get_iteration_cap())
        .run(seeds, rng)?;

    tracing::debug!(
        samples = samples.len(),
        k = config.get_palette_size(),
        iterations = clustering.iterations(),
        converged = clustering.converged(),
        "computed palette"
    );

    let iterations = clustering.iterations();
    let converged = clustering.converged();
    let (centroids, populations) = clustering.into_parts();

    let mut entries = entry::format_palette(centroids, populations);
    config.get_order().sort(&mut entries);

    Ok(Palette {
        entries,
        background: estimate_dominant_color(samples),
        sample_count: samples.len(),
        iterations,
        converged,
    })
}

fn rgb_to_hsl((r, g, b): (u8, u8, u8)) -> (f32, f32, f32) {
    let raw = palette::Srgb::new(r, g, b);
    let raw_float: palette::Srgb<f32> = raw.into_format();
    let hsl: palette::Hsl = raw_float.into_color();
    let (h, s, l) = hsl.into_components();

    (h.into_positive_degrees(), s, l)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn opaque(rgb: (u8, u8, u8)) -> PixelSample {
        PixelSample::new(rgb, 1.0)
    }

    #[test]
    fn single_color_palette_is_dominant_color() {
        let samples = (0..200u32)
            .map(|i| opaque(((i * 7 % 256) as u8, (i * 13 % 256) as u8, (i % 256) as u8)))
            .collect::<SampleSet>();

        for seed in 0..5 {
            let entries = compute_palette(&samples, 1, &mut StdRng::seed_from_u64(seed)).unwrap();
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].centroid(), estimate_dominant_color(&samples));
            assert_eq!(entries[0].population(), samples.len());
        }
    }

    #[test]
    fn compute_palette_rejects_invalid_input() {
        let rng = &mut StdRng::seed_from_u64(0);
        assert_eq!(
            compute_palette(&SampleSet::default(), 5, rng),
            Err(QuantizeError::EmptyInput)
        );

        let samples = SampleSet::new(vec![opaque((1, 1, 1)); 3]);
        assert_eq!(
            compute_palette(&samples, 4, rng),
            Err(QuantizeError::InvalidK { k: 4, len: 3 })
        );
    }

    #[test]
    fn palette_entries_are_valid_after_degenerate_clusters() {
        let samples = SampleSet::new(vec![PixelSample::new((17, 34, 51), 0.4); 4]);
        let entries = compute_palette(&samples, 3, &mut StdRng::seed_from_u64(8)).unwrap();

        assert_eq!(entries.len(), 3);
        for entry in &entries {
            assert_eq!(entry.hex(), "#112233");
            assert_eq!(entry.rgba(), "rgba(17, 34, 51, 0.40)");
        }
    }

    #[test]
    fn hsl_of_primaries() {
        let close = |a: f32, b: f32| (a - b).abs() < 1e-3;

        let (h, s, l) = rgb_to_hsl((255, 0, 0));
        assert!(close(h % 360.0, 0.0) && close(s, 1.0) && close(l, 0.5));
        let (h, s, l) = rgb_to_hsl((0, 0, 255));
        assert!(close(h, 240.0) && close(s, 1.0) && close(l, 0.5));
        let (_, s, l) = rgb_to_hsl((255, 255, 255));
        assert!(close(s, 0.0) && close(l, 1.0));
    }

    #[test]
    fn background_uses_full_resolution() {
        // one odd pixel that nearest-neighbour downsampling drops
        let mut image = RgbImage::from_pixel(20, 10, Rgb([0, 0, 0]));
        image.put_pixel(1, 1, Rgb([200, 200, 200]));

        let palette = Palette::from_image(image)
            .max_dimension(2)
            .palette_size(1)
            .seed(0)
            .generate();

        assert_eq!(palette.background().rgb(), (1, 1, 1));
        assert_eq!(palette.background_entry().population(), 200);
        // 20x10 scaled to a longest edge of 2 leaves 2x1 samples
        assert_eq!(palette.entries()[0].population(), 2);
    }
}
