//! plantdoc - Plant leaf disease prediction CLI tool.
//!
//! This crate classifies leaf photos with ONNX image models, keeps a
//! newest-first prediction history and marks map locations with the
//! displayed result.

#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod imaging;
pub mod inference;
pub mod location;
pub mod output;
pub mod pipeline;
pub mod record;
pub mod storage;
pub mod utils;

use clap::Parser;
use cli::{Cli, Command, ConfigAction, HistoryAction, LocationsAction, MarkArgs, PredictArgs};
use config::{
    Config, config_file_path, load_config_file, load_default_config, save_config,
    save_default_config,
};
use constants::DRY_RUN_LABEL;
use inference::{Classification, FixedClassifier, ImageClassifier, OnnxClassifier};
use location::StaticLocationProvider;
use pipeline::{Phase, PipelineHandle, PipelineOptions, Status};
use record::{Coordinate, Placemark};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use storage::{FileStore, HistoryStore, KeyValueStore, LocationStore};
use tracing::{debug, error, info, warn};

pub use error::{Error, Result};

/// Main entry point for plantdoc CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.predict.verbose, cli.predict.quiet);

    match cli.command {
        // Config commands must work even when the file does not validate
        Some(Command::Config { action }) => {
            handle_config_command(action, cli.predict.config.as_deref())
        }
        Some(command) => {
            let config = load_config(&cli.predict)?;
            handle_command(command, &cli.predict, &config)
        }
        None => {
            let config = load_config(&cli.predict)?;
            if cli.images.is_empty() {
                cli::help::print_smart_help(&config);
                return Ok(());
            }
            block_on(classify_images(&cli.images, &cli.predict, &config))
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    // ORT logging stays off unless explicitly asked for.
    let filter_str = if quiet {
        "warn,ort=off".to_string()
    } else {
        match verbose {
            0 => "info,ort=off".to_string(),
            1 => "debug,ort=warn".to_string(),
            2 => "trace,ort=info".to_string(),
            _ => "trace".to_string(),
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn load_config(args: &PredictArgs) -> Result<Config> {
    match &args.config {
        Some(path) => load_config_file(path),
        None => load_default_config(),
    }
}

fn block_on(future: impl Future<Output = Result<()>>) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().map_err(|e| Error::Internal {
        message: format!("Failed to create async runtime: {e}"),
    })?;
    runtime.block_on(future)
}

fn handle_command(command: Command, args: &PredictArgs, config: &Config) -> Result<()> {
    match command {
        Command::History { action } => handle_history_command(action, args, config),
        Command::Locations {
            action: LocationsAction::List,
        } => list_locations(args, config),
        Command::Locations {
            action: LocationsAction::Mark(mark),
        } => block_on(mark_location(mark, args, config)),
        Command::Config { action } => handle_config_command(action, args.config.as_deref()),
    }
}

/// Key-value store in the configured data directory.
fn open_storage(args: &PredictArgs, config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    let store = FileStore::new(match &args.data_dir {
        Some(dir) => dir.clone(),
        None => config::data_dir(config)?,
    });
    debug!("Data directory: {}", store.dir().display());
    Ok(Arc::new(store))
}

fn open_locations(kv: Arc<dyn KeyValueStore>, config: &Config) -> LocationStore {
    if config.locations.persist {
        LocationStore::persistent(kv)
    } else {
        LocationStore::in_memory()
    }
}

/// Location provider answering with the `--lat/--lon` coordinate.
fn location_provider(args: &PredictArgs) -> Result<StaticLocationProvider> {
    let provider = StaticLocationProvider::authorized();
    match (args.lat, args.lon) {
        (Some(lat), Some(lon)) => Ok(provider.with_coordinate(Coordinate::new(lat, lon)?)),
        _ => Ok(provider),
    }
}

fn build_classifier(args: &PredictArgs, config: &Config) -> Result<Arc<dyn ImageClassifier>> {
    if args.dry_run {
        info!("Dry run: reporting a fixed prediction");
        return Ok(Arc::new(FixedClassifier::new(vec![Classification::new(
            DRY_RUN_LABEL,
            1.0,
        )])));
    }

    let model_name = args
        .model
        .clone()
        .or_else(|| config.defaults.model.clone())
        .ok_or_else(|| Error::ConfigValidation {
            message: "no model specified (use -m, --dry-run or set defaults.model in config)"
                .to_string(),
        })?;

    let model_config = config::get_model(config, &model_name)?;
    info!("Using model: {model_name}");
    Ok(Arc::new(OnnxClassifier::from_config(
        model_config,
        config.defaults.top_k,
    )))
}

/// Start a pipeline over the persisted stores. Must run inside the runtime.
fn start_pipeline(
    args: &PredictArgs,
    config: &Config,
    classifier: Arc<dyn ImageClassifier>,
    provider: StaticLocationProvider,
) -> Result<PipelineHandle> {
    let kv = open_storage(args, config)?;
    let history = HistoryStore::load(Arc::clone(&kv));
    let locations = open_locations(kv, config);
    let options = PipelineOptions {
        max_dimension: args
            .max_dimension
            .unwrap_or(config.defaults.max_dimension),
        fallback_coordinate: Coordinate::new(config.defaults.latitude, config.defaults.longitude)?,
    };

    Ok(pipeline::spawn(
        classifier,
        Arc::new(provider),
        history,
        locations,
        options,
    ))
}

/// Read one photo, submit it and wait for its outcome.
async fn classify_file(pipeline: &PipelineHandle, path: &Path) -> Result<Status> {
    let bytes = tokio::fs::read(path).await?;
    pipeline.select_image(bytes).await?;
    pipeline.wait_idle().await
}

/// Classify photos one after another and record each prediction.
async fn classify_images(images: &[PathBuf], args: &PredictArgs, config: &Config) -> Result<()> {
    use crate::output::progress;
    use std::time::Instant;

    let total_start = Instant::now();

    let classifier = build_classifier(args, config)?;
    let pipeline = start_pipeline(args, config, classifier, location_provider(args)?)?;

    info!("Found {} image(s) to classify", images.len());

    let progress_enabled = !args.quiet && !args.no_progress;
    let image_progress = progress::create_image_progress(images.len(), progress_enabled);

    let mut recorded = 0;
    let mut failed = 0;

    for path in images {
        progress::set_current(image_progress.as_ref(), &path.display().to_string());

        match classify_file(&pipeline, path).await {
            Ok(status) => {
                if status.phase == Phase::Done {
                    recorded += 1;
                } else {
                    failed += 1;
                }
                progress::println(
                    image_progress.as_ref(),
                    &format!(
                        "{}: {}",
                        path.display(),
                        output::one_line(&status.display_text)
                    ),
                );
            }
            Err(e) => {
                error!("Failed to classify {}: {}", path.display(), e);
                failed += 1;
            }
        }
        progress::inc_progress(image_progress.as_ref());
    }

    progress::finish_progress(image_progress, "Complete");

    info!(
        "Complete: {} recorded, {} failed in {:.2}s",
        recorded,
        failed,
        total_start.elapsed().as_secs_f64()
    );

    if failed > 0 {
        warn!("{} image(s) produced no prediction", failed);
    }

    Ok(())
}

fn handle_history_command(action: HistoryAction, args: &PredictArgs, config: &Config) -> Result<()> {
    let mut history = HistoryStore::load(open_storage(args, config)?);

    match action {
        HistoryAction::List => {
            if history.is_empty() {
                println!("No predictions recorded.");
            }
            for prediction in history.all() {
                println!("{}", output::format_prediction(prediction));
            }
        }
        HistoryAction::Clear => {
            let removed = history.len();
            history.clear()?;
            println!("Removed {removed} prediction(s).");
        }
    }
    Ok(())
}

fn list_locations(args: &PredictArgs, config: &Config) -> Result<()> {
    if !config.locations.persist {
        println!("Marked locations are kept for a single run (set locations.persist = true to keep them).");
        return Ok(());
    }

    let locations = open_locations(open_storage(args, config)?, config);
    if locations.is_empty() {
        println!("No locations marked.");
    }
    for location in locations.all() {
        println!("{}", output::format_location(location));
    }
    Ok(())
}

/// Mark a map point, optionally classifying a photo first so its result
/// becomes the location's label.
async fn mark_location(mark: MarkArgs, args: &PredictArgs, config: &Config) -> Result<()> {
    let placemark = Placemark {
        locality: mark.locality,
        administrative_area: mark.region,
        country: mark.country,
    };
    let mut provider = location_provider(args)?;
    if placemark != Placemark::default() {
        provider = provider.with_placemark(placemark);
    }

    let classifier: Arc<dyn ImageClassifier> = if mark.image.is_some() {
        build_classifier(args, config)?
    } else {
        Arc::new(FixedClassifier::default())
    };
    let pipeline = start_pipeline(args, config, classifier, provider)?;

    if let Some(image) = &mark.image {
        let status = classify_file(&pipeline, image).await?;
        println!(
            "{}: {}",
            image.display(),
            output::one_line(&status.display_text)
        );
    }

    let coordinate = Coordinate::new(mark.latitude, mark.longitude)?;
    match pipeline.mark_location(coordinate).await? {
        Some(marked) => {
            println!("Marked {}", output::format_location(&marked));
            if !config.locations.persist {
                info!("Marked location kept for this run only");
            }
        }
        None => println!("No address found for {coordinate}."),
    }
    Ok(())
}

fn handle_config_command(action: ConfigAction, explicit: Option<&Path>) -> Result<()> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => config_file_path()?,
    };

    match action {
        ConfigAction::Init => {
            if path.exists() {
                println!("Configuration file already exists: {}", path.display());
            } else {
                let config = Config::default();
                let saved_path = if explicit.is_some() {
                    save_config(&config, &path)?;
                    path
                } else {
                    save_default_config(&config)?
                };
                println!("Created configuration file: {}", saved_path.display());
                println!("\nNext steps:");
                println!("  Add a [models.<name>] section with path and labels, then set defaults.model");
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_config_file(&path)?;
            let rendered =
                toml::to_string_pretty(&config).map_err(|e| Error::ConfigSerialize { source: e })?;
            print!("{rendered}");
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}
