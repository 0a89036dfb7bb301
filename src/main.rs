use anyhow::Result;

use tennis_prediction::cli::Command;
use tennis_prediction::{
    handle_completions, handle_predict, handle_predict_file, handle_rate, handle_serve,
    handle_train, handle_validate, interpret,
};

fn main() {
    setup_logging();
    parse_and_execute().unwrap_or_else(|e| {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    });
}

fn setup_logging() {
    sensible_env_logger::init!();
}

fn parse_and_execute() -> Result<()> {
    let command = interpret();
    execute_command(&command)
}

fn execute_command(command: &Command) -> Result<()> {
    match command {
        Command::Rate { export } => handle_rate(export.as_deref()),
        Command::Train => handle_train(),
        Command::Predict {
            player1,
            player2,
            surface,
        } => handle_predict(player1, player2, surface),
        Command::PredictFile { input, output } => handle_predict_file(input, output),
        Command::Validate => handle_validate(),
        Command::Serve { port } => handle_serve(*port),
        Command::Completions { shell } => handle_completions(*shell),
    }
}
