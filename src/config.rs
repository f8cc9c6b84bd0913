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

use crate::{PaletteEntry, DEFAULT_ITERATION_CAP, DEFAULT_MAX_DIMENSION, DEFAULT_PALETTE_SIZE};

/// The order palette entries are returned in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PaletteOrder {
    /// The order the centroids were seeded in. This carries no meaning beyond being stable for a
    /// given random seed.
    #[default]
    Seed,
    /// Most populous color first.
    Population,
    /// Lightest color first, by HSL lightness.
    Lightness,
}

/// Tunables for palette computation.
///
/// # Examples
///
/// ```
/// # use huepick::PaletteConfig;
/// let config = PaletteConfig::new().max_dimension(200).palette_size(8).iteration_cap(50);
/// assert_eq!(config.get_palette_size(), 8);
/// ```
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PaletteConfig {
    /// Images with a longer edge are scaled down to this before clustering. Zero disables scaling.
    max_dimension: u32,
    /// The number of palette colors, `k`.
    palette_size: usize,
    /// The maximum number of k-means iterations.
    iteration_cap: usize,
    order: PaletteOrder,
}

impl PaletteConfig {
    pub const fn new() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            palette_size: DEFAULT_PALETTE_SIZE,
            iteration_cap: DEFAULT_ITERATION_CAP,
            order: PaletteOrder::Seed,
        }
    }

    pub const fn max_dimension(self, max_dimension: u32) -> Self {
        Self { max_dimension, ..self }
    }

    pub const fn palette_size(self, palette_size: usize) -> Self {
        Self { palette_size, ..self }
    }

    pub const fn iteration_cap(self, iteration_cap: usize) -> Self {
        Self { iteration_cap, ..self }
    }

    pub const fn order(self, order: PaletteOrder) -> Self {
        Self { order, ..self }
    }

    pub const fn get_max_dimension(&self) -> u32 {
        self.max_dimension
    }

    pub const fn get_palette_size(&self) -> usize {
        self.palette_size
    }

    pub const fn get_iteration_cap(&self) -> usize {
        self.iteration_cap
    }

    pub const fn get_order(&self) -> PaletteOrder {
        self.order
    }
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PaletteOrder {
    /// Sort entries in place. Sorting is stable, so equal entries keep their seed order.
    pub fn sort(self, entries: &mut [PaletteEntry]) {
        match self {
            PaletteOrder::Seed => {}
            PaletteOrder::Population => entries.sort_by(|a, b| b.population().cmp(&a.population())),
            PaletteOrder::Lightness => entries.sort_by(|a, b| b.hsl().2.total_cmp(&a.hsl().2)),
        }
    }
}
