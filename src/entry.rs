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

use crate::{Centroid, ParseHexError};

/// One color of a palette along with its text representations.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PaletteEntry {
    centroid: Centroid,
    population: usize,
    hex: String,
    rgba: String,
}

impl PaletteEntry {
    pub fn new(centroid: Centroid, population: usize) -> PaletteEntry {
        Self {
            centroid,
            population,
            hex: format_hex(centroid),
            rgba: format_rgba(centroid),
        }
    }

    pub fn centroid(&self) -> Centroid {
        self.centroid
    }

    pub fn rgb(&self) -> (u8, u8, u8) {
        self.centroid.rgb()
    }

    pub fn hsl(&self) -> (f32, f32, f32) {
        crate::rgb_to_hsl(self.rgb())
    }

    /// How many samples were assigned to this color.
    pub fn population(&self) -> usize {
        self.population
    }

    /// The color as `#RRGGBB`.
    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// The color as `rgba(R, G, B, A)`.
    pub fn rgba(&self) -> &str {
        &self.rgba
    }
}

/// Format the color as `#RRGGBB` with uppercase digits. Alpha is left out.
pub fn format_hex(centroid: Centroid) -> String {
    let (r, g, b) = centroid.rgb();
    format!("#{r:02X}{g:02X}{b:02X}")
}

/// Format the color as `rgba(R, G, B, A)` with alpha given to two decimals.
pub fn format_rgba(centroid: Centroid) -> String {
    let (r, g, b) = centroid.rgb();
    format!("rgba({r}, {g}, {b}, {:.2})", centroid.alpha())
}

/// Parse `#RRGGBB` (the `#` is optional) back into its channels.
pub fn parse_hex(hex: &str) -> Result<(u8, u8, u8), ParseHexError> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 {
        return Err(ParseHexError::Length(digits.len()));
    }

    // from_str_radix accepts a leading sign, so check the digits up front
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ParseHexError::Digits(hex.to_owned()));
    }

    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16).map_err(|_| ParseHexError::Digits(hex.to_owned()))
    };

    Ok((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Turn clustered centroids into palette entries, keeping their order.
pub(crate) fn format_palette(centroids: Vec<Centroid>, populations: Vec<usize>) -> Vec<PaletteEntry> {
    centroids
        .into_iter()
        .zip(populations)
        .map(|(centroid, population)| PaletteEntry::new(centroid, population))
        .collect()
}
