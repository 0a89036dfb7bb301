use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Per-surface Elo ratings and match outcome prediction for tennis")]
pub struct Cli {
    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "lower_case")]
pub enum Command {
    /// Replay the match log and publish ratings and rating history
    Rate {
        /// Also write final_ratings.csv and rating_history.csv to this directory
        #[arg(short, long)]
        export: Option<PathBuf>,
    },
    /// Train the outcome model on the published ratings and save the artifact
    Train,
    /// Predict the winner of a match between two player ids
    Predict {
        player1: String,
        player2: String,
        /// Carpet, Clay, Grass or Hard; anything else is encoded as unknown
        surface: String,
    },
    /// Predict every match in a CSV with winner_id, loser_id and surface columns
    #[command(name = "predict-file")]
    PredictFile {
        input: PathBuf,
        /// Where to write the predictions
        #[arg(short, long, default_value = "match_predictions.csv")]
        output: PathBuf,
    },
    /// Score the model against every historical match
    Validate,
    /// Start the prediction server
    Serve {
        /// Port number (optional, defaults to 3000)
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
    },
    /// Print shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_predict() {
        let cli = Cli::try_parse_from(["tennis_prediction", "predict", "A1", "B2", "Clay"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Predict {
                player1: "A1".to_string(),
                player2: "B2".to_string(),
                surface: "Clay".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_predict_file() {
        let cli = Cli::try_parse_from(["tennis_prediction", "predict-file", "upcoming.csv"]).unwrap();
        assert_eq!(
            cli.command,
            Command::PredictFile {
                input: PathBuf::from("upcoming.csv"),
                output: PathBuf::from("match_predictions.csv"),
            }
        );
    }

    #[test]
    fn test_serve_port_defaults() {
        let cli = Cli::try_parse_from(["tennis_prediction", "serve"]).unwrap();
        assert_eq!(cli.command, Command::Serve { port: 3000 });
    }

    #[test]
    fn test_rate_export() {
        let cli = Cli::try_parse_from(["tennis_prediction", "rate", "--export", "out"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Rate {
                export: Some(PathBuf::from("out"))
            }
        );
    }
}
