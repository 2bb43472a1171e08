//! CLI argument definitions.

use crate::cli::validators::{parse_latitude, parse_longitude};
use crate::constants::MAX_DIMENSION_LIMIT;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Plant leaf disease prediction from photos.
#[derive(Debug, Parser)]
#[command(name = "plantdoc")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Leaf photos to classify.
    pub images: Vec<PathBuf>,

    /// Options shared by all commands.
    #[command(flatten)]
    pub predict: PredictArgs,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inspect or clear the prediction history.
    History {
        /// History action to perform.
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Mark map locations with the displayed prediction.
    Locations {
        /// Locations action to perform.
        #[command(subcommand)]
        action: LocationsAction,
    },
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// History subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum HistoryAction {
    /// List predictions, newest first.
    List,
    /// Remove every prediction.
    Clear,
}

/// Locations subcommand actions.
#[derive(Debug, Subcommand)]
pub enum LocationsAction {
    /// List marked locations in the order they were marked.
    List,
    /// Reverse-geocode a map point and mark it.
    #[command(allow_negative_numbers = true)]
    Mark(MarkArgs),
}

/// Arguments for `locations mark`.
#[derive(Debug, Args)]
pub struct MarkArgs {
    /// Latitude of the tapped point.
    #[arg(value_parser = parse_latitude)]
    pub latitude: f64,

    /// Longitude of the tapped point.
    #[arg(value_parser = parse_longitude)]
    pub longitude: f64,

    /// Classify this photo first so its result labels the location.
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// City or town returned for the point.
    #[arg(long)]
    pub locality: Option<String>,

    /// State, province or region returned for the point.
    #[arg(long)]
    pub region: Option<String>,

    /// Country returned for the point.
    #[arg(long)]
    pub country: Option<String>,
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}

/// Options for classifying photos.
#[derive(Debug, Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct PredictArgs {
    /// Model name from configuration.
    #[arg(short, long, global = true, env = "PLANTDOC_MODEL")]
    pub model: Option<String>,

    /// Configuration file (default: platform config directory).
    #[arg(long, global = true, env = "PLANTDOC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory for history and marked locations (overrides config).
    #[arg(long, global = true, env = "PLANTDOC_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Largest image edge after normalization (overrides config).
    #[arg(long, global = true,
          value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_DIMENSION_LIMIT)))]
    pub max_dimension: Option<u32>,

    /// Current latitude recorded with predictions (-90.0 to 90.0).
    #[arg(long, global = true, value_parser = parse_latitude, requires = "lon",
          env = "PLANTDOC_LATITUDE")]
    pub lat: Option<f64>,

    /// Current longitude recorded with predictions (-180.0 to 180.0).
    #[arg(long, global = true, value_parser = parse_longitude, requires = "lat",
          env = "PLANTDOC_LONGITUDE")]
    pub lon: Option<f64>,

    /// Skip the model and report a fixed prediction.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Hide the progress bar.
    #[arg(long, global = true)]
    pub no_progress: bool,

    /// Suppress progress and informational output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase verbosity (-v: debug, -vv: trace+ORT info, -vvv: full trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
