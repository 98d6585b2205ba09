use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::{Pacing, RunOptions};

#[derive(Parser, Debug)]
#[command(name = "mass-disposer")]
#[command(about = "Mark assets as disposed and post a comment to each asset's feed")]
pub struct Cli {
    /// CSV export with `ID`, `Serial Number` and `Asset Tag` columns
    #[arg(short, long, default_value = "test1.csv")]
    pub input: PathBuf,

    /// JSON object patched onto every asset
    #[arg(long, default_value = "DisposedStatus.json")]
    pub status_payload: PathBuf,

    /// JSON body posted to every asset's feed
    #[arg(long, default_value = "Comment.json")]
    pub comment_payload: PathBuf,

    /// Pause after each update and between assets, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub delay_ms: u64,

    /// Per-request timeout, in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Load variables from this file instead of the default `.env` lookup
    #[arg(long)]
    pub env_file: Option<PathBuf>,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Authenticate and load inputs, but change nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Print debug lines
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            input: self.input.clone(),
            status_payload: self.status_payload.clone(),
            comment_payload: self.comment_payload.clone(),
            pacing: Pacing::uniform(Duration::from_millis(self.delay_ms)),
            timeout: Duration::from_secs(self.timeout_secs),
            dry_run: self.dry_run,
            assume_yes: self.yes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_usual_file_names() {
        let cli = Cli::parse_from(["mass-disposer"]);
        let opts = cli.run_options();
        assert_eq!(opts.input, PathBuf::from("test1.csv"));
        assert_eq!(opts.status_payload, PathBuf::from("DisposedStatus.json"));
        assert_eq!(opts.comment_payload, PathBuf::from("Comment.json"));
        assert_eq!(opts.pacing, Pacing::default());
        assert!(!opts.dry_run);
    }

    #[test]
    fn delay_applies_to_both_pauses() {
        let cli = Cli::parse_from(["mass-disposer", "--delay-ms", "0", "-y", "-i", "batch.csv"]);
        let opts = cli.run_options();
        assert_eq!(opts.pacing, Pacing::uniform(Duration::ZERO));
        assert!(opts.assume_yes);
        assert_eq!(opts.input, PathBuf::from("batch.csv"));
    }
}
