// API client module: a small blocking HTTP client for the asset-management
// API. It authenticates once, keeps the bearer token and exposes the two
// per-asset calls the disposal loop needs.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::payload::{CommentPayload, StatusPayload};

/// Failure of a single API call.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The server answered with a non-success status.
    #[error("{status} for url: {url}")]
    Http {
        status: StatusCode,
        url: String,
        body: String,
    },
    /// The request never got a response.
    #[error(transparent)]
    Network(#[from] reqwest::Error),
    #[error("no bearer token, authenticate first")]
    NotAuthenticated,
    #[error("token cannot be used in an Authorization header")]
    InvalidToken,
}

impl RequestError {
    /// Response body of an HTTP error, compact JSON when it parses.
    pub fn response_content(&self) -> Option<String> {
        match self {
            RequestError::Http { body, .. } => Some(
                serde_json::from_str::<serde_json::Value>(body)
                    .map(|v| v.to_string())
                    .unwrap_or_else(|_| body.clone()),
            ),
            _ => None,
        }
    }
}

/// The calls a disposal run makes. `ApiClient` is the real implementation;
/// tests substitute a recording fake.
pub trait AssetService {
    /// Exchange credentials for a bearer token and keep it for later calls.
    fn authenticate(&mut self, username: &str, password: &str) -> Result<(), RequestError>;

    /// Apply the status payload to one asset.
    fn update_asset(&self, asset_id: &str, payload: &StatusPayload) -> Result<(), RequestError>;

    /// Post the comment to one asset's feed.
    fn post_feed_entry(
        &self,
        asset_id: &str,
        comment: &CommentPayload,
    ) -> Result<(), RequestError>;
}

/// Login request payload.
#[derive(Serialize, Debug)]
pub struct AuthRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Blocking client bound to one API base URL and application id.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    auth_url: String,
    assets_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Build a client from the validated configuration.
    pub fn new(config: &Config, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            auth_url: config.auth_url.clone(),
            assets_url: assets_url(&config.api_base_url, &config.app_id),
            token: None,
        })
    }

    /// Store a bearer token for subsequent calls.
    pub fn set_token(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }

    fn auth_headers(&self) -> Result<HeaderMap, RequestError> {
        let token = self.token.as_deref().ok_or(RequestError::NotAuthenticated)?;
        let val = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| RequestError::InvalidToken)?;
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, val);
        Ok(headers)
    }

    fn asset_url(&self, asset_id: &str) -> String {
        format!("{}/{}", self.assets_url, asset_id)
    }

    fn send(&self, req: RequestBuilder) -> Result<Response, RequestError> {
        let res = req.headers(self.auth_headers()?).send()?;
        check_status(res)
    }
}

impl AssetService for ApiClient {
    fn authenticate(&mut self, username: &str, password: &str) -> Result<(), RequestError> {
        let res = self
            .client
            .post(&self.auth_url)
            .json(&AuthRequest { username, password })
            .send()?;
        let body = check_status(res)?.text()?;
        let token = strip_token_quotes(&body);
        if token.is_empty() {
            return Err(RequestError::InvalidToken);
        }
        self.set_token(token);
        Ok(())
    }

    fn update_asset(&self, asset_id: &str, payload: &StatusPayload) -> Result<(), RequestError> {
        let url = self.asset_url(asset_id);
        let patch = payload.patch_document();
        debug!("PATCH {url} with {} operations", patch.len());
        self.send(self.client.patch(&url).json(&patch))?;
        Ok(())
    }

    fn post_feed_entry(
        &self,
        asset_id: &str,
        comment: &CommentPayload,
    ) -> Result<(), RequestError> {
        let url = format!("{}/feed", self.asset_url(asset_id));
        debug!("POST {url}");
        self.send(self.client.post(&url).json(comment))?;
        Ok(())
    }
}

/// `{base}/{app_id}/assets`, without doubling a trailing slash on `base`.
fn assets_url(api_base_url: &str, app_id: &str) -> String {
    format!("{}/{}/assets", api_base_url.trim_end_matches('/'), app_id)
}

/// Remove one pair of surrounding double quotes from the auth response.
pub fn strip_token_quotes(body: &str) -> &str {
    let body = body.trim();
    let body = body.strip_prefix('"').unwrap_or(body);
    body.strip_suffix('"').unwrap_or(body)
}

fn check_status(res: Response) -> Result<Response, RequestError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let url = res.url().to_string();
    let body = res.text().unwrap_or_default();
    Err(RequestError::Http { status, url, body })
}
