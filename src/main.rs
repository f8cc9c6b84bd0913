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

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use huepick::{Palette, PaletteConfig, PaletteEntry, PaletteOrder};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Palette entry ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
enum Order {
    /// Seeding order.
    #[default]
    Seed,
    /// Most populous color first.
    Population,
    /// Lightest color first.
    Lightness,
}

/// Print the background color and a k-means palette of each image.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// One or more input image paths
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Number of palette colors
    #[arg(short = 'k', long, default_value_t = huepick::DEFAULT_PALETTE_SIZE)]
    colors: usize,

    /// Longest edge the image is scaled down to before clustering, 0 to disable
    #[arg(long, default_value_t = huepick::DEFAULT_MAX_DIMENSION)]
    max_dimension: u32,

    /// Maximum number of k-means iterations
    #[arg(long, default_value_t = huepick::DEFAULT_ITERATION_CAP)]
    iteration_cap: usize,

    /// Random seed for reproducible palettes
    #[arg(short, long)]
    seed: Option<u64>,

    /// Palette entry order
    #[arg(short, long, value_enum, default_value_t = Order::Seed)]
    order: Order,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl From<Order> for PaletteOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::Seed => PaletteOrder::Seed,
            Order::Population => PaletteOrder::Population,
            Order::Lightness => PaletteOrder::Lightness,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let config = PaletteConfig::new()
        .palette_size(args.colors)
        .max_dimension(args.max_dimension)
        .iteration_cap(args.iteration_cap)
        .order(args.order.into());

    for input in &args.inputs {
        let image = image::open(input).with_context(|| format!("decoding {}", input.display()))?;

        let builder = Palette::from_dynamic_image(image).config(config);
        let palette = match args.seed {
            Some(seed) => builder.seed(seed).generate(),
            None => builder.generate(),
        };

        println!("{}", input.display());
        print_entry("background", &palette.background_entry());
        for (i, entry) in palette.entries().iter().enumerate() {
            print_entry(&format!("{}", i + 1), entry);
        }
    }

    Ok(())
}

fn print_entry(label: &str, entry: &PaletteEntry) {
    println!("  {label:>10}  {}  {:<24} {}", entry.hex(), entry.rgba(), entry.population());
}
