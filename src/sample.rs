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

use crate::QuantizeError;
use image::{imageops::FilterType, ImageBuffer, RgbaImage};

/// A single pixel color. Red, green and blue are in `0..=255`, alpha is normalized opacity in
/// `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "RawColor"))]
pub struct PixelSample {
    red: u8,
    green: u8,
    blue: u8,
    alpha: f32,
}

/// The pixels of an image, in row-major order.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SampleSet {
    samples: Vec<PixelSample>,
}

/// The serialized form of a color. Deserializing goes through the constructors so alpha is clamped.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
pub(crate) struct RawColor {
    red: u8,
    green: u8,
    blue: u8,
    alpha: f32,
}

#[cfg(feature = "serde")]
impl From<RawColor> for PixelSample {
    fn from(RawColor { red, green, blue, alpha }: RawColor) -> Self {
        PixelSample::new((red, green, blue), alpha)
    }
}

#[cfg(feature = "serde")]
impl From<RawColor> for crate::Centroid {
    fn from(RawColor { red, green, blue, alpha }: RawColor) -> Self {
        crate::Centroid::new((red, green, blue), alpha)
    }
}

impl PixelSample {
    /// Create a new sample. Alpha is clamped into `0.0..=1.0` and a NaN alpha becomes `0.0`.
    pub fn new((red, green, blue): (u8, u8, u8), alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha: clamp_alpha(alpha),
        }
    }

    /// Create a sample from 8-bit RGBA channels.
    pub fn from_rgba8([red, green, blue, alpha]: [u8; 4]) -> Self {
        Self {
            red,
            green,
            blue,
            alpha: alpha as f32 / 255.0,
        }
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        (self.red, self.green, self.blue)
    }

    pub fn alpha(self) -> f32 {
        self.alpha
    }
}

impl SampleSet {
    pub fn new(samples: Vec<PixelSample>) -> Self {
        Self { samples }
    }

    /// Build a sample set from a raw, tightly packed RGBA8 buffer.
    pub fn from_rgba8(width: u32, height: u32, bytes: &[u8]) -> Result<Self, QuantizeError> {
        rgba_image(width, height, bytes.to_vec()).map(|image| extract_samples(&image))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn as_slice(&self) -> &[PixelSample] {
        &self.samples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PixelSample> {
        self.samples.iter()
    }
}

impl FromIterator<PixelSample> for SampleSet {
    fn from_iter<I: IntoIterator<Item = PixelSample>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<PixelSample>> for SampleSet {
    fn from(samples: Vec<PixelSample>) -> Self {
        Self::new(samples)
    }
}

impl<'a> IntoIterator for &'a SampleSet {
    type Item = &'a PixelSample;
    type IntoIter = std::slice::Iter<'a, PixelSample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

/// Convert every pixel of an image into a sample, in row-major order.
pub fn extract_samples<P>(image: &ImageBuffer<P, Vec<u8>>) -> SampleSet
where
    P: image::Pixel<Subpixel = u8>,
{
    image
        .pixels()
        .map(|pixel| PixelSample::from_rgba8(pixel.to_rgba().0))
        .collect()
}

/// Scale an image down so its longest edge is at most `max_dimension`, keeping the aspect ratio.
/// Images already small enough, and a `max_dimension` of zero, leave the image untouched.
pub fn downsample<P>(
    image: ImageBuffer<P, Vec<u8>>,
    max_dimension: u32,
    filter: FilterType,
) -> ImageBuffer<P, Vec<u8>>
where
    P: image::Pixel<Subpixel = u8> + 'static,
{
    match scaled_dimensions(image.dimensions(), max_dimension) {
        Some((width, height)) => {
            tracing::debug!(
                from_width = image.width(),
                from_height = image.height(),
                width,
                height,
                "downsampling image"
            );
            image::imageops::resize(&image, width, height, filter)
        }
        None => image,
    }
}

/// Convenience for turning a raw RGBA buffer into an image the builder accepts.
pub fn rgba_image(width: u32, height: u32, bytes: Vec<u8>) -> Result<RgbaImage, QuantizeError> {
    let expected = width as usize * height as usize * 4;
    let actual = bytes.len();

    // from_raw also accepts buffers longer than needed
    if actual != expected {
        return Err(QuantizeError::BufferSize { expected, actual });
    }

    RgbaImage::from_raw(width, height, bytes).ok_or(QuantizeError::BufferSize { expected, actual })
}

fn scaled_dimensions((width, height): (u32, u32), max_dimension: u32) -> Option<(u32, u32)> {
    let longest = width.max(height);
    if max_dimension == 0 || longest <= max_dimension {
        return None;
    }

    // the longest edge lands exactly on the limit, the other edge is rounded to the nearest pixel
    let scale = |edge: u32| {
        let scaled = (edge as u64 * max_dimension as u64 + longest as u64 / 2) / longest as u64;
        (scaled as u32).max(1)
    };

    Some((scale(width), scale(height)))
}

fn clamp_alpha(alpha: f32) -> f32 {
    if alpha.is_nan() {
        0.0
    } else {
        alpha.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{LumaA, Rgb, RgbImage};

    #[test]
    fn alpha_is_clamped() {
        assert_eq!(PixelSample::new((1, 2, 3), 1.5).alpha(), 1.0);
        assert_eq!(PixelSample::new((1, 2, 3), -0.5).alpha(), 0.0);
        assert_eq!(PixelSample::new((1, 2, 3), f32::NAN).alpha(), 0.0);
    }

    #[test]
    fn extracts_one_sample_per_pixel_in_row_major_order() {
        let image = RgbImage::from_fn(3, 2, |x, y| Rgb([x as u8, y as u8, 7]));
        let samples = extract_samples(&image);

        assert_eq!(samples.len(), 6);
        let rgb = samples.iter().map(|s| s.rgb()).collect::<Vec<_>>();
        assert_eq!(
            rgb,
            vec![(0, 0, 7), (1, 0, 7), (2, 0, 7), (0, 1, 7), (1, 1, 7), (2, 1, 7)]
        );
        assert!(samples.iter().all(|s| s.alpha() == 1.0));
    }

    #[test]
    fn grayscale_alpha_is_normalized() {
        let image = ImageBuffer::from_pixel(1, 1, LumaA([200u8, 51]));
        let samples = extract_samples(&image);

        assert_eq!(samples.as_slice()[0].rgb(), (200, 200, 200));
        assert_eq!(samples.as_slice()[0].alpha(), 0.2);
    }

    #[test]
    fn empty_image_gives_empty_set() {
        let image = RgbImage::new(0, 0);
        assert!(extract_samples(&image).is_empty());
    }

    #[test]
    fn raw_buffer_must_match_dimensions() {
        let samples = SampleSet::from_rgba8(2, 1, &[255, 0, 0, 255, 0, 0, 255, 0]).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples.as_slice()[1].rgb(), (0, 0, 255));
        assert_eq!(samples.as_slice()[1].alpha(), 0.0);

        assert_eq!(
            SampleSet::from_rgba8(2, 2, &[0; 8]),
            Err(QuantizeError::BufferSize {
                expected: 16,
                actual: 8
            })
        );
    }

    #[test]
    fn raw_buffer_paths_agree_on_size() {
        let long = [0u8; 20];
        let error = QuantizeError::BufferSize {
            expected: 16,
            actual: 20,
        };

        assert_eq!(SampleSet::from_rgba8(2, 2, &long), Err(error));
        assert_eq!(rgba_image(2, 2, long.to_vec()).err(), Some(error));
        assert_eq!(SampleSet::from_rgba8(2, 2, &[7; 16]).map(|samples| samples.len()), Ok(4));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialized_alpha_is_clamped() {
        let sample: PixelSample = serde_json::from_str(r#"{"red":1,"green":2,"blue":3,"alpha":7.5}"#).unwrap();
        assert_eq!(sample, PixelSample::new((1, 2, 3), 1.0));

        let sample: PixelSample = serde_json::from_str(r#"{"red":1,"green":2,"blue":3,"alpha":-0.5}"#).unwrap();
        assert_eq!(sample.alpha(), 0.0);

        let json = serde_json::to_string(&PixelSample::new((9, 8, 7), 0.25)).unwrap();
        assert_eq!(serde_json::from_str::<PixelSample>(&json).unwrap(), PixelSample::new((9, 8, 7), 0.25));
    }

    #[test]
    fn downsample_limits_longest_edge() {
        assert_eq!(scaled_dimensions((600, 300), 300), Some((300, 150)));
        assert_eq!(scaled_dimensions((300, 900), 300), Some((100, 300)));
        assert_eq!(scaled_dimensions((1000, 1), 300), Some((300, 1)));
        assert_eq!(scaled_dimensions((300, 200), 300), None);
        assert_eq!(scaled_dimensions((3000, 2000), 0), None);

        let image = RgbImage::new(640, 480);
        let image = downsample(image, 300, FilterType::Nearest);
        assert_eq!(image.dimensions(), (300, 225));
    }
}
