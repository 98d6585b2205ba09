// Disposal workflow: authenticate, load the inputs, then walk the asset
// list one asset at a time. Each asset gets its status patched and, only
// if that worked, a feed entry posted. Per-asset failures are logged and
// recorded; they never stop the run.

use std::fmt;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::api::{AssetService, RequestError};
use crate::config::{Config, Pacing, RunOptions};
use crate::input::{read_assets, AssetRecord};
use crate::payload::{load_comment_payload, load_status_payload, CommentPayload, StatusPayload};

/// Setup failures that abort a run before any asset is touched.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("Exiting due to authentication failure.")]
    Authentication(#[source] RequestError),
    #[error("No valid asset entries found in '{}'. Exiting.", .0.display())]
    NoAssets(PathBuf),
    #[error("Exiting due to missing or invalid JSON data.")]
    InvalidPayloads,
}

/// Waits between API calls.
pub trait Pacer {
    fn pause(&self, delay: Duration);
}

/// Blocks the current thread for the whole delay.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleep;

impl Pacer for ThreadSleep {
    fn pause(&self, delay: Duration) {
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
}

/// Where one asset ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetOutcome {
    /// Updated and commented.
    Commented,
    /// Updated, but the feed entry failed.
    CommentFailed,
    /// Update failed; the feed entry was skipped.
    UpdateFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReport {
    pub asset_id: String,
    pub outcome: AssetOutcome,
}

/// Per-asset outcomes of a run, in processing order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub reports: Vec<AssetReport>,
}

impl RunSummary {
    fn count(&self, outcome: AssetOutcome) -> usize {
        self.reports.iter().filter(|r| r.outcome == outcome).count()
    }

    pub fn total(&self) -> usize {
        self.reports.len()
    }

    pub fn commented(&self) -> usize {
        self.count(AssetOutcome::Commented)
    }

    pub fn comment_failures(&self) -> usize {
        self.count(AssetOutcome::CommentFailed)
    }

    pub fn update_failures(&self) -> usize {
        self.count(AssetOutcome::UpdateFailed)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Disposed {} of {} assets ({} feed entries failed, {} updates failed).",
            self.commented(),
            self.total(),
            self.comment_failures(),
            self.update_failures()
        )
    }
}

/// Validated inputs of a run, ready to be processed.
#[derive(Debug, Clone)]
pub struct Job {
    assets: Vec<AssetRecord>,
    status: StatusPayload,
    comment: CommentPayload,
    pacing: Pacing,
}

/// Authenticate and load every input, in that order. Any failure is fatal
/// and is returned before a single asset call is made.
pub fn prepare<S: AssetService>(
    service: &mut S,
    config: &Config,
    options: &RunOptions,
) -> Result<Job, FatalError> {
    match service.authenticate(&config.username, &config.password) {
        Ok(()) => info!("Authenticated successfully."),
        Err(e) => {
            error!("Authentication failed: {e}. Check credentials and API URLs.");
            return Err(FatalError::Authentication(e));
        }
    }

    let assets = read_assets(&options.input);
    if assets.is_empty() {
        return Err(FatalError::NoAssets(options.input.clone()));
    }
    info!("Found {} valid asset entries to process.", assets.len());

    let status = load_status_payload(&options.status_payload);
    let comment = load_comment_payload(&options.comment_payload);
    match (status, comment) {
        (Some(status), Some(comment)) => Ok(Job::new(assets, status, comment, options.pacing)),
        _ => Err(FatalError::InvalidPayloads),
    }
}

impl Job {
    pub fn new(
        assets: Vec<AssetRecord>,
        status: StatusPayload,
        comment: CommentPayload,
        pacing: Pacing,
    ) -> Self {
        Job {
            assets,
            status,
            comment,
            pacing,
        }
    }

    pub fn assets(&self) -> &[AssetRecord] {
        &self.assets
    }

    pub fn status_template(&self) -> &StatusPayload {
        &self.status
    }

    /// Process every asset in order.
    pub fn run<S: AssetService, P: Pacer>(&self, service: &S, pacer: &P) -> RunSummary {
        info!("Starting Mass Disposing...");
        let total = self.assets.len();
        let mut summary = RunSummary::default();

        for (i, asset) in self.assets.iter().enumerate() {
            info!("Processing asset ID {} ({}/{})...", asset.id, i + 1, total);
            let outcome = self.dispose(service, pacer, asset);
            summary.reports.push(AssetReport {
                asset_id: asset.id.clone(),
                outcome,
            });

            if i + 1 < total {
                pacer.pause(self.pacing.between_assets);
            }
        }
        summary
    }

    /// Log the patch document each asset would receive, without calling
    /// the API.
    pub fn dry_run(&self) -> anyhow::Result<()> {
        for asset in &self.assets {
            let patch = self.status.for_serial_number(&asset.serial_number).patch_document();
            info!(
                "[dry run] asset {}: {}",
                asset.id,
                serde_json::to_string(&patch)?
            );
        }
        info!("[dry run] {} assets, no changes made.", self.assets.len());
        Ok(())
    }

    fn dispose<S: AssetService, P: Pacer>(
        &self,
        service: &S,
        pacer: &P,
        asset: &AssetRecord,
    ) -> AssetOutcome {
        let payload = self.status.for_serial_number(&asset.serial_number);

        if let Err(e) = service.update_asset(&asset.id, &payload) {
            error!("{}", Step::Update.failure(&asset.id, &e));
            if let Some(content) = e.response_content() {
                error!("Response content: {content}");
            }
            warn!("Skipping feed entry for asset {}.", asset.id);
            return AssetOutcome::UpdateFailed;
        }
        info!("Successfully updated status for asset {}.", asset.id);

        pacer.pause(self.pacing.after_update);

        match service.post_feed_entry(&asset.id, &self.comment) {
            Ok(()) => {
                info!("Feed entry posted for asset {}.", asset.id);
                AssetOutcome::Commented
            }
            Err(e) => {
                error!("{}", Step::Feed.failure(&asset.id, &e));
                AssetOutcome::CommentFailed
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Update,
    Feed,
}

impl Step {
    fn failure(self, asset_id: &str, e: &RequestError) -> String {
        match (self, e) {
            (Step::Update, RequestError::Http { .. }) => {
                format!("Failed to update asset {asset_id}. HTTP error: {e}")
            }
            (Step::Update, RequestError::Network(_)) => {
                format!("Network error when updating asset {asset_id}: {e}")
            }
            (Step::Update, RequestError::NotAuthenticated | RequestError::InvalidToken) => {
                format!("Cannot update asset {asset_id}: {e}")
            }
            (Step::Feed, RequestError::Http { .. }) => {
                format!("Failed to post feed entry for asset {asset_id}. HTTP error: {e}")
            }
            (Step::Feed, RequestError::Network(_)) => {
                format!("Network error when posting feed entry for {asset_id}: {e}")
            }
            (Step::Feed, RequestError::NotAuthenticated | RequestError::InvalidToken) => {
                format!("Cannot post feed entry for asset {asset_id}: {e}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(id: &str, outcome: AssetOutcome) -> AssetReport {
        AssetReport {
            asset_id: id.into(),
            outcome,
        }
    }

    #[test]
    fn summary_counts_outcomes() {
        let summary = RunSummary {
            reports: vec![
                report("1", AssetOutcome::Commented),
                report("2", AssetOutcome::UpdateFailed),
                report("3", AssetOutcome::CommentFailed),
                report("4", AssetOutcome::Commented),
            ],
        };
        assert_eq!(summary.total(), 4);
        assert_eq!(summary.commented(), 2);
        assert_eq!(
            summary.to_string(),
            "Disposed 2 of 4 assets (1 feed entries failed, 1 updates failed)."
        );
    }

    #[test]
    fn token_errors_are_not_reported_as_network_errors() {
        let line = Step::Update.failure("7", &RequestError::NotAuthenticated);
        assert_eq!(line, "Cannot update asset 7: no bearer token, authenticate first");

        let line = Step::Feed.failure("7", &RequestError::InvalidToken);
        assert!(line.starts_with("Cannot post feed entry for asset 7: "));
        assert!(!line.contains("Network error"));
    }

    #[test]
    fn http_errors_name_the_step_and_status() {
        let e = RequestError::Http {
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            url: "http://itsm/api/5/assets/7".into(),
            body: String::new(),
        };
        assert_eq!(
            Step::Update.failure("7", &e),
            "Failed to update asset 7. HTTP error: \
             500 Internal Server Error for url: http://itsm/api/5/assets/7"
        );
        assert!(Step::Feed
            .failure("7", &e)
            .starts_with("Failed to post feed entry for asset 7. HTTP error: 500"));
    }

    #[test]
    fn zero_delay_does_not_sleep() {
        let start = std::time::Instant::now();
        ThreadSleep.pause(Duration::ZERO);
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
