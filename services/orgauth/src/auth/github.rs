//! Minimal GitHub REST client.
//!
//! # Purpose
//! Performs the one lookup this service needs: fetch an organization by name
//! and return its numeric ID.
//!
//! # Security considerations
//! - The bearer token is attached per request and never logged.
//! - Base URLs are parsed strictly; only `http`/`https` are accepted.
use reqwest::Url;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.github.com/";
const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_USER_AGENT: &str = concat!("orgauth/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("invalid base url {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("GET {url}: {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Organization {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub login: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    default_base: Url,
}

impl GithubClient {
    pub fn new(timeout: Duration) -> Result<Self, GithubError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| GithubError::Transport {
                url: DEFAULT_BASE_URL.to_string(),
                source,
            })?;
        Ok(Self {
            http,
            default_base: parse_base_url(DEFAULT_BASE_URL)?,
        })
    }

    /// `GET {base}orgs/{name}`.
    pub async fn get_organization(
        &self,
        name: &str,
        base_url: Option<&Url>,
        token: Option<&str>,
    ) -> Result<Organization, GithubError> {
        let base = base_url.unwrap_or(&self.default_base);
        let url = organization_url(base, name)?;
        let mut request = self
            .http
            .get(url.clone())
            .header(ACCEPT, GITHUB_ACCEPT)
            .header(USER_AGENT, GITHUB_USER_AGENT);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let response = request.send().await.map_err(|source| GithubError::Transport {
            url: url.to_string(),
            source,
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(GithubError::Status {
                url: url.to_string(),
                status,
            });
        }
        response
            .json::<Organization>()
            .await
            .map_err(|source| GithubError::Decode {
                url: url.to_string(),
                source,
            })
    }
}

/// Parse an API base URL, requiring an http(s) scheme and a trailing `/`.
pub fn parse_base_url(raw: &str) -> Result<Url, GithubError> {
    let url = Url::parse(raw).map_err(|err| GithubError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: err.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(GithubError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme {:?}", url.scheme()),
        });
    }
    if !url.path().ends_with('/') {
        return Err(GithubError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: "base URL must have a trailing slash".to_string(),
        });
    }
    Ok(url)
}

fn organization_url(base: &Url, name: &str) -> Result<Url, GithubError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| GithubError::InvalidBaseUrl {
            url: base.to_string(),
            reason: "cannot be a base".to_string(),
        })?
        .pop_if_empty()
        .extend(["orgs", name]);
    Ok(url)
}
