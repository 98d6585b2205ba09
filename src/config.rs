// Configuration module: the five environment variables the tool needs
// are collected into one `Config` value at startup and handed to the
// components that need them. Nothing reads the environment afterwards.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

/// Names of the required variables.
pub const APP_ID: &str = "APP_ID";
pub const AUTH_URL: &str = "AUTH_URL";
pub const API_BASE_URL: &str = "API_BASE_URL";
pub const ACCOUNT: &str = "ACCOUNT";
pub const PASSWORD: &str = "PASSWORD";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required environment variables are not set: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
}

/// Connection settings for the asset-management API.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub app_id: String,
    pub auth_url: String,
    pub api_base_url: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("app_id", &self.app_id)
            .field("auth_url", &self.auth_url)
            .field("api_base_url", &self.api_base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Config {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup. Empty values
    /// count as missing; every missing key is reported at once.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut take = |key: &'static str| match lookup(key) {
            Some(v) if !v.trim().is_empty() => v,
            _ => {
                missing.push(key);
                String::new()
            }
        };

        let app_id = take(APP_ID);
        let auth_url = take(AUTH_URL);
        let api_base_url = take(API_BASE_URL);
        let username = take(ACCOUNT);
        let password = take(PASSWORD);

        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }
        Ok(Config {
            app_id,
            auth_url,
            api_base_url,
            username,
            password,
        })
    }
}

/// Delays inserted by the disposal loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Pause between a successful update and the feed post.
    pub after_update: Duration,
    /// Pause between two assets.
    pub between_assets: Duration,
}

impl Pacing {
    pub fn uniform(delay: Duration) -> Self {
        Pacing {
            after_update: delay,
            between_assets: delay,
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Pacing::uniform(Duration::from_secs(1))
    }
}

/// Everything a run needs besides the credentials.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input: PathBuf,
    pub status_payload: PathBuf,
    pub comment_payload: PathBuf,
    pub pacing: Pacing,
    pub timeout: Duration,
    pub dry_run: bool,
    pub assume_yes: bool,
}

/// Load a `.env` file into the process environment. An explicit path must
/// exist; otherwise `./.env` and then `<config dir>/mass-disposer/.env`
/// are tried. Variables that are already set are left alone.
pub fn load_dotenv(explicit: Option<&Path>) -> anyhow::Result<()> {
    use anyhow::Context;

    if let Some(path) = explicit {
        dotenvy::from_path(path)
            .with_context(|| format!("Failed to load env file {}", path.display()))?;
        debug!("loaded environment from {}", path.display());
        return Ok(());
    }

    for path in dotenv_candidates() {
        if path.is_file() {
            dotenvy::from_path(&path)
                .with_context(|| format!("Failed to load env file {}", path.display()))?;
            debug!("loaded environment from {}", path.display());
            break;
        }
    }
    Ok(())
}

/// Fallback `.env` locations, in lookup order.
fn dotenv_candidates() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(".env")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("mass-disposer").join(".env"));
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn builds_config_when_everything_is_set() {
        let cfg = Config::from_lookup(lookup(&[
            ("APP_ID", "42"),
            ("AUTH_URL", "https://itsm.local/auth"),
            ("API_BASE_URL", "https://itsm.local/api"),
            ("ACCOUNT", "svc"),
            ("PASSWORD", "hunter2"),
        ]))
        .unwrap();
        assert_eq!(cfg.app_id, "42");
        assert_eq!(cfg.username, "svc");
        assert!(!format!("{cfg:?}").contains("hunter2"));
    }

    #[test]
    fn reports_every_missing_or_empty_variable() {
        let err = Config::from_lookup(lookup(&[
            ("APP_ID", "42"),
            ("AUTH_URL", "  "),
            ("ACCOUNT", "svc"),
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Missing(vec!["AUTH_URL", "API_BASE_URL", "PASSWORD"])
        );
    }

    #[test]
    fn missing_explicit_env_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_dotenv(Some(&dir.path().join("absent.env"))).unwrap_err();
        assert!(err.to_string().contains("absent.env"));
    }

    #[test]
    fn env_file_fills_unset_variables_only() {
        let preset = "MASS_DISPOSER_CONFIG_TEST_PRESET";
        let unset = "MASS_DISPOSER_CONFIG_TEST_UNSET";
        std::env::set_var(preset, "from-process");
        std::env::remove_var(unset);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.env");
        std::fs::write(&path, format!("{preset}=from-file\n{unset}=filled\n")).unwrap();

        load_dotenv(Some(&path)).unwrap();

        assert_eq!(std::env::var(preset).unwrap(), "from-process");
        assert_eq!(std::env::var(unset).unwrap(), "filled");
    }

    #[test]
    fn fallback_lookup_starts_in_the_working_directory() {
        let paths = dotenv_candidates();
        assert_eq!(paths[0], PathBuf::from(".env"));
        if let Some(dir) = dirs::config_dir() {
            assert_eq!(paths[1], dir.join("mass-disposer").join(".env"));
        }
    }

    #[test]
    fn default_pacing_is_one_second() {
        let p = Pacing::default();
        assert_eq!(p.after_update, Duration::from_secs(1));
        assert_eq!(p.between_assets, Duration::from_secs(1));
    }
}
