// Terminal flow: wires configuration, the HTTP client and the disposal
// workflow together, asks for confirmation and shows a spinner while the
// workflow waits between calls.

use std::io::{self, IsTerminal};
use std::time::Duration;

use anyhow::Result;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

use crate::api::ApiClient;
use crate::cli::Cli;
use crate::config::{load_dotenv, Config};
use crate::disposer::{prepare, FatalError, Pacer, RunSummary, ThreadSleep};
use crate::logging::FATAL;

/// Sleeps like `ThreadSleep` while drawing a spinner on stderr.
pub struct SpinnerPacer {
    style: ProgressStyle,
}

impl SpinnerPacer {
    pub fn new() -> Result<Self> {
        let style = ProgressStyle::with_template("{spinner} {msg}")?;
        Ok(SpinnerPacer { style })
    }
}

impl Pacer for SpinnerPacer {
    fn pause(&self, delay: Duration) {
        if delay.is_zero() {
            return;
        }
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(self.style.clone());
        spinner.set_message(format!("Waiting {} ms...", delay.as_millis()));
        spinner.enable_steady_tick(Duration::from_millis(100));
        ThreadSleep.pause(delay);
        spinner.finish_and_clear();
    }
}

/// Outcome of the whole invocation as seen by `main`.
#[derive(Debug)]
pub enum Exit {
    Completed(Option<RunSummary>),
    Declined,
    Fatal,
}

/// Run one disposal batch end to end.
pub fn run(cli: &Cli) -> Result<Exit> {
    info!("--- Starting Asset Disposer ---");
    if let Err(e) = load_dotenv(cli.env_file.as_deref()) {
        error!(target: FATAL, "{e:#}");
        return Ok(Exit::Fatal);
    }

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!(target: FATAL, "{e}. Please check your .env file.");
            return Ok(Exit::Fatal);
        }
    };
    let options = cli.run_options();
    let mut client = ApiClient::new(&config, options.timeout)?;

    let job = match prepare(&mut client, &config, &options) {
        Ok(job) => job,
        Err(e @ FatalError::NoAssets(_)) => {
            warn!("{e}");
            return Ok(Exit::Fatal);
        }
        Err(e) => {
            error!(target: FATAL, "{e}");
            return Ok(Exit::Fatal);
        }
    };

    if options.dry_run {
        job.dry_run()?;
        return Ok(Exit::Completed(None));
    }

    if !options.assume_yes && io::stdin().is_terminal() {
        let go = Confirm::new()
            .with_prompt(format!("Dispose {} assets?", job.assets().len()))
            .default(false)
            .interact()?;
        if !go {
            info!("Aborted, no assets were changed.");
            return Ok(Exit::Declined);
        }
    }

    let summary = if io::stderr().is_terminal() {
        job.run(&client, &SpinnerPacer::new()?)
    } else {
        job.run(&client, &ThreadSleep)
    };

    info!("--- Processing Complete ---");
    info!("{summary}");
    Ok(Exit::Completed(Some(summary)))
}
