pub mod api;
pub mod cli;
pub mod config;
pub mod database;
pub mod display;
pub mod errors;
pub mod features;
pub mod ingestion;
pub mod model;
pub mod predict;
pub mod rating;
pub mod services;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use std::path::Path;

use crate::cli::{Cli, Command};
use crate::config::AppConfig;
use crate::predict::validate_history;
use crate::services::context::load_or_train;
use crate::services::rating::RatingService;
use crate::services::server::ServerService;
use crate::services::training::TrainingService;

pub fn interpret() -> Command {
    let cli = Cli::parse();
    cli.command
}

pub fn handle_rate(export: Option<&Path>) -> Result<()> {
    let config = AppConfig::new();
    let run = RatingService::new(config).run(export)?;
    display::rating_summary(&run.summary, run.rejected);
    Ok(())
}

pub fn handle_train() -> Result<()> {
    let config = AppConfig::new();
    let artifact = TrainingService::new(config).run()?;
    display::training_report(artifact.report());
    Ok(())
}

pub fn handle_predict(player1: &str, player2: &str, surface: &str) -> Result<()> {
    let config = AppConfig::new();
    let context = load_or_train(&config)?;
    let prediction = context.predict(player1, player2, surface)?;
    display::prediction(&prediction, surface);
    Ok(())
}

pub fn handle_predict_file(input: &Path, output: &Path) -> Result<()> {
    let config = AppConfig::new();
    let context = load_or_train(&config)?;
    let batch = predict::load_batch(input)?;
    let outcome = context.predict_batch(&batch)?;
    predict::save_predictions(&outcome.rows, output)?;
    display::batch_predictions(&outcome, batch.rejected, output);
    Ok(())
}

pub fn handle_validate() -> Result<()> {
    let config = AppConfig::new();
    let context = load_or_train(&config)?;
    let log = ingestion::load_match_log(&config.paths.matches_dir, config.rating.fallback_surface)?;
    let metrics = validate_history(&context.predictor(), &log.events)?;
    display::metrics("Historical validation (both orientations)", &metrics);
    Ok(())
}

pub fn handle_serve(port: u16) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let config = AppConfig::new();
        let service = ServerService::new(port, config);
        service.run().await
    })
}

pub fn handle_completions(shell: Shell) -> Result<()> {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
    Ok(())
}
