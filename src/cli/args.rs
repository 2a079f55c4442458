use clap::{Parser, Subcommand};
use std::path::PathBuf;

use radval::Sensor;

#[derive(Parser)]
#[command(name = "radval", version, about = "Radiometric validation of Landsat-8 / Sentinel-2 products")]
pub struct CliArgs {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(long, global = true, default_value_t = false)]
    pub log: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the scene pairs a validation would compare
    Pairs {
        /// Sensor of the ids in --scenes (inferred from the first id if omitted)
        #[arg(long, value_enum)]
        sensor: Option<Sensor>,

        /// Newline-delimited scene id list
        #[arg(long)]
        scenes: PathBuf,

        /// Sentinel-2 list to pair against Landsat-8 --scenes
        #[arg(long)]
        cross: Option<PathBuf>,

        /// Pairing threshold in days (default: 10 for L8, 5 otherwise)
        #[arg(long)]
        day_difference: Option<i64>,
    },

    /// Run a validation routine described by a JSON configuration
    Validate {
        /// JSON file with the routine parameters
        #[arg(short, long)]
        config: PathBuf,

        /// Newline-delimited scene id list (Landsat-8 for cross-sensor routines)
        #[arg(long)]
        scenes: PathBuf,

        /// Sentinel-2 scene id list for cross-sensor routines
        #[arg(long)]
        cross: Option<PathBuf>,
    },
}
