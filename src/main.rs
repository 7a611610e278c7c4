use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ratingsvd::config::ObservationOrder;
use ratingsvd::services::persistence;
use ratingsvd::storage::loader::load_observations;
use ratingsvd::{
    init_tracing, Config, ItemIndexedRatings, ObservationLog, RatingPredictor, TrainingEngine,
};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train on the configured ratings and save the model artifact
    Train {
        /// Overrides the configured artifact path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Writes the training report as JSON
        #[arg(short, long)]
        report: Option<PathBuf>,
    },
    /// Predict one rating from a saved model
    Predict {
        #[arg(short, long)]
        model: Option<PathBuf>,

        #[arg(short, long)]
        user: u32,

        #[arg(short, long)]
        item: u32,
    },
    /// Compute the RMSE of a saved model over a ratings file
    Evaluate {
        #[arg(short, long)]
        model: Option<PathBuf>,

        #[arg(short, long)]
        ratings: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    std::env::set_var("RUST_LOG", &args.log_level);
    init_tracing();

    let config = if Path::new(&args.config).exists() {
        Config::from_file(&args.config)?
    } else {
        info!("Config file not found, using default configuration");
        Config::default()
    };

    match args.command {
        Command::Train { output, report } => train(&config, output, report),
        Command::Predict { model, user, item } => {
            let path = model.unwrap_or_else(|| config.model.artifact_path.clone());
            let predictor = RatingPredictor::from_file(&path, config.scale)?;
            println!("{:.4}", predictor.predict(user, item)?);
            Ok(())
        }
        Command::Evaluate { model, ratings } => {
            let path = model.unwrap_or_else(|| config.model.artifact_path.clone());
            let predictor = RatingPredictor::from_file(&path, config.scale)?;
            let universe = predictor.model()?.universe();
            let probe = load_observations(&ratings, &universe, &config.scale)?;
            let rmse = predictor.evaluate(&probe)?;
            info!("Probe RMSE over {} ratings: {:.6}", probe.len(), rmse);
            println!("{:.6}", rmse);
            Ok(())
        }
    }
}

fn train(config: &Config, output: Option<PathBuf>, report: Option<PathBuf>) -> Result<()> {
    info!("Training configuration loaded: {:?}", config.training);

    let universe = config.data.universe();
    let engine = TrainingEngine::new(config.training.clone(), universe, config.scale)?;
    let observations = load_observations(&config.data.ratings_path, &universe, &config.scale)?;

    let observations = match config.data.order {
        ObservationOrder::Insertion => observations,
        ObservationOrder::ItemMajor => {
            let mut index =
                ItemIndexedRatings::from_observations(observations.as_slice(), universe.num_items);
            drop(observations);
            let stats = index.sort();
            info!(
                "Indexed {} rated items out of {}",
                stats.lists_sorted,
                index.num_items()
            );
            ObservationLog::from_item_index(&index)
        }
        ObservationOrder::UserMajor => {
            let mut observations = observations;
            observations.sort_by_user();
            observations
        }
    };

    let trained = engine.train(observations)?;

    let artifact = output.unwrap_or_else(|| config.model.artifact_path.clone());
    if let Some(parent) = artifact.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    persistence::save_model(&trained.model, &artifact)?;

    if let Some(report_path) = report {
        let json = serde_json::to_string_pretty(&trained.report)?;
        std::fs::write(&report_path, json)
            .with_context(|| format!("writing report to {}", report_path.display()))?;
        info!("Training report written to {}", report_path.display());
    }

    info!(
        "Training finished: {:?} after {} epochs, rmse {:.6}",
        trained.report.stop_reason,
        trained.report.epochs.len(),
        trained.report.final_rmse
    );
    Ok(())
}
