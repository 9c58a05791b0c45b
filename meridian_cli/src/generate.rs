use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};
use meridian_routing::{
    config::RoutingConfig,
    generation::GraphGeneration,
    geopoint::GeoPoint,
    properties::{property::TravelMode, property_map::EdgePropertyMap},
    synthetic,
    weighting::registry::WeightingRegistry,
};
use tracing::info;

#[derive(Clone, Copy, ValueEnum)]
pub enum Mode {
    Car,
    Bike,
    Foot,
}

impl From<Mode> for TravelMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Car => TravelMode::Car,
            Mode::Bike => TravelMode::Bike,
            Mode::Foot => TravelMode::Foot,
        }
    }
}

#[derive(Subcommand)]
pub enum GenerateSubcommands {
    /// Synthetic grid network, written as a graph directory
    Grid {
        #[arg(long, default_value_t = 50)]
        rows: usize,

        #[arg(long, default_value_t = 50)]
        cols: usize,

        /// Distance between neighbors, in degrees
        #[arg(long, default_value_t = 0.001)]
        spacing: f64,

        #[arg(long, default_value_t = 0.0)]
        lat: f64,

        #[arg(long, default_value_t = 0.0)]
        lon: f64,

        /// Travel modes allowed on every edge
        #[arg(long, value_enum, num_args = 1.., default_values_t = [Mode::Car, Mode::Bike, Mode::Foot])]
        modes: Vec<Mode>,

        /// Speed of every edge, in km/h
        #[arg(long, default_value_t = 50.0)]
        speed: f32,

        /// Prepare the hierarchies and landmarks of the configured profiles right away
        #[arg(long)]
        prepare: bool,

        #[arg(long, short = 'o')]
        out: PathBuf,
    },
}

pub fn run(subcommand: GenerateSubcommands, config: &RoutingConfig) -> Result<(), anyhow::Error> {
    match subcommand {
        GenerateSubcommands::Grid {
            rows,
            cols,
            spacing,
            lat,
            lon,
            modes,
            speed,
            prepare,
            out,
        } => {
            let properties = modes.into_iter().fold(EdgePropertyMap::new(), |properties, mode| {
                let mode = TravelMode::from(mode);
                properties.with_access(mode, speed.min(mode.max_speed()), false)
            });
            let graph = synthetic::grid_graph(rows, cols, spacing, GeoPoint::new(lat, lon), &properties);

            let generation = if prepare {
                GraphGeneration::prepare(0, graph, config, &WeightingRegistry::default())?
            } else {
                GraphGeneration::new(0, graph)
            };
            generation.save(&out)?;

            info!(
                rows,
                cols,
                hierarchies = ?generation.ch_profiles(),
                landmarks = ?generation.lm_profiles(),
                out = %out.display(),
                "grid generated"
            );
        }
    }

    Ok(())
}
