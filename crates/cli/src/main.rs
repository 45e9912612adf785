use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use billcheck_analysis::{
    AnalysisError, BillAnalyzer, Gemini, GeolocationResolver, HsnLookup, InferenceClient,
    Operation,
};
use billcheck_core::{AnalysisSnapshot, Settings};
use billcheck_ocr::{default_backend, ImageEnhancer, RawImage};
use clap::{Parser, Subcommand};
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "billcheck")]
#[command(about = "Check Indian GST on bill photos")]
#[command(version)]
struct Cli {
    /// TOML settings file; environment still supplies the API key
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Analyze one bill from one or more photos
    Analyze {
        /// Photos of the bill, in page order
        #[arg(required = true)]
        images: Vec<PathBuf>,
        /// State or union territory of the buyer
        #[arg(short, long)]
        state: String,
    },
    /// Look up the HSN/SAC code and GST rates for an item
    Hsn {
        query: String,
    },
    /// Name the state or union territory containing a coordinate
    #[command(allow_negative_numbers = true)]
    Locate { latitude: f64, longitude: f64 },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;
    let gemini = Gemini::from_settings(&settings.inference).context("Failed to configure Gemini")?;
    info!(model = gemini.model(), "Using Gemini");
    let client: Arc<dyn InferenceClient> = Arc::new(gemini);

    match cli.command {
        Commands::Analyze { images, state } => {
            let raw = images
                .iter()
                .map(|path| {
                    RawImage::from_path(path)
                        .with_context(|| format!("Failed to read {}", path.display()))
                })
                .collect::<Result<Vec<_>>>()?;
            let analyzer = BillAnalyzer::new(
                ImageEnhancer::new(settings.enhance.jpeg_quality),
                default_backend(&settings.ocr),
                client,
            );
            let outcome = analyzer
                .analyze(&raw, &state, |stage| eprintln!("{stage}"))
                .await
                .map(AnalysisSnapshot::capture);
            emit(outcome, Operation::BillAnalysis)
        }
        Commands::Hsn { query } => {
            let outcome = HsnLookup::new(client).lookup(&query).await;
            emit(outcome, Operation::HsnLookup)
        }
        Commands::Locate { latitude, longitude } => {
            let outcome = GeolocationResolver::new(client)
                .resolve(latitude, longitude)
                .await;
            emit(outcome, Operation::Geolocation)
        }
    }
}

fn load_settings(path: Option<&std::path::Path>) -> Result<Settings> {
    let settings = match path {
        Some(path) => {
            info!("Loading settings from {}", path.display());
            Settings::load(path)?
        }
        None => Settings::default(),
    };
    Ok(settings.apply_env())
}

/// Writes the result as pretty JSON on stdout. Failures go to stderr as the
/// short user-facing message, with the diagnostic in the log.
fn emit<T: serde::Serialize>(
    outcome: Result<T, AnalysisError>,
    op: Operation,
) -> Result<ExitCode> {
    match outcome {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!("{e}");
            eprintln!("{}", e.user_message(op));
            Ok(ExitCode::FAILURE)
        }
    }
}
