//! certforge: generate, publish and deliver course completion certificates.
//!
//! Configuration comes from the environment (and `.env` outside production).

use anyhow::Context;
use certforge_cli::{
    init_tracing, load_request, log_pipeline_error, should_load_dotenv, FailureReport,
};
use certforge_core::Config;
use certforge_services::{build_generator, ArtifactPlanner, GenerationReport, PipelineError};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "certforge", about = "Course certificate generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render, publish and deliver a certificate from scratch
    Generate {
        /// JSON file with student, delivery and identifier
        #[arg(long)]
        request: PathBuf,
    },
    /// Continue the last run for a request from its first unfinished stage
    Resume {
        /// JSON file with student, delivery and identifier
        #[arg(long)]
        request: PathBuf,
    },
    /// Print the base filename and artifact keys without generating anything
    Filename {
        /// JSON file with student, delivery and identifier
        #[arg(long)]
        request: PathBuf,
    },
}

#[derive(Serialize)]
struct FilenamePlan {
    base: String,
    verify_url: String,
    certificate_key: String,
    image_key: String,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

/// Print the report of a finished run, or log and describe why it failed.
fn finish(outcome: Result<GenerationReport, PipelineError>) -> anyhow::Result<()> {
    match outcome {
        Ok(report) => print_json(&report),
        Err(err) => {
            log_pipeline_error(&err);
            print_json(&FailureReport::from_error(&err))?;
            Err(err.into())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if should_load_dotenv(std::env::var("ENVIRONMENT").ok().as_deref()) {
        dotenvy::dotenv().ok();
    }
    init_tracing(matches!(
        std::env::var("LOG_FORMAT").ok().as_deref(),
        Some("json")
    ));

    let cli = Cli::parse();
    let config = Config::from_env().context("Invalid configuration")?;
    tracing::debug!(environment = %config.environment(), "Configuration loaded");

    match cli.command {
        Commands::Generate { request } => {
            let request = load_request(&request)?;
            let generator = build_generator(&config).await?;
            finish(generator.generate_with_report(&request).await)?;
        }
        Commands::Resume { request } => {
            let request = load_request(&request)?;
            let generator = build_generator(&config).await?;
            finish(generator.resume(&request).await)?;
        }
        Commands::Filename { request } => {
            let request = load_request(&request)?;
            let (details, paths) = ArtifactPlanner::from_config(&config)
                .plan(&request)
                .context("Request is missing a required field")?;
            print_json(&FilenamePlan {
                base: paths.base.to_string(),
                verify_url: details.verify_url,
                certificate_key: paths.certificate_key,
                image_key: paths.image_key,
            })?;
        }
    }

    Ok(())
}
