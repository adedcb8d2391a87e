//! Config write/read orchestration.
//!
//! # Purpose
//! [`ConfigService`] owns the lifecycle of the single persisted config record:
//! merge a partial write into the stored record, validate it, resolve the
//! organization ID when unknown, reconcile legacy TTL fields, and persist.
//! Reads project the stored record with effective TTLs.
//!
//! # Key invariants
//! - A write either persists a fully merged record or leaves storage as it
//!   was. Every failure happens before the store call.
//! - A persisted record always has a non-empty organization and a non-zero
//!   organization ID.
//! - Writes are optimistic: the store only accepts the new record if the
//!   stored bytes still match what was loaded. A lost race reruns the whole
//!   load/merge/store sequence, up to [`MAX_WRITE_ATTEMPTS`] times.
//!
//! # Security considerations
//! - The lookup credential comes from the injected [`CredentialSource`] and is
//!   never persisted, logged, or taken from the request.
//! - An explicitly supplied organization ID is trusted without verification.
use crate::auth::credentials::CredentialSource;
use crate::auth::github::parse_base_url;
use crate::auth::resolver::{OrganizationResolver, ResolutionError};
use crate::model::{ConfigView, ConfigWriteRequest, OrgAuthConfig};
use crate::store::{ConfigStore, StoreError};
use anyhow::anyhow;
use orgauth_tokenutil::{TokenParamsError, UpgradedPair, check_ttl_bounds, upgrade_value};
use reqwest::Url;
use std::sync::Arc;
use thiserror::Error;

/// Storage key of the config record.
pub const CONFIG_KEY: &str = "config";
pub const MAX_WRITE_ATTEMPTS: usize = 3;

/// Client-caused write failures. Nothing is persisted.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("organization is a required parameter")]
    MissingOrganization,
    #[error("organization_id cannot be negative")]
    NegativeOrganizationId,
    #[error("error parsing given base_url: {0}")]
    InvalidBaseUrl(String),
    #[error(transparent)]
    TokenParams(#[from] TokenParamsError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("unable to fetch the organization_id, you must manually set it in the config: {0}")]
    Resolution(#[from] ResolutionError),
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl ConfigError {
    fn outcome(&self) -> &'static str {
        match self {
            ConfigError::Validation(_) => "validation_error",
            ConfigError::Resolution(_) => "resolution_error",
            ConfigError::Storage(StoreError::Conflict(_)) => "conflict",
            ConfigError::Storage(_) => "storage_error",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOutcome {
    pub warnings: Vec<String>,
}

pub struct ConfigService {
    store: Arc<dyn ConfigStore>,
    resolver: Arc<dyn OrganizationResolver>,
    credentials: Arc<dyn CredentialSource>,
}

impl ConfigService {
    pub fn new(
        store: Arc<dyn ConfigStore>,
        resolver: Arc<dyn OrganizationResolver>,
        credentials: Arc<dyn CredentialSource>,
    ) -> Self {
        Self {
            store,
            resolver,
            credentials,
        }
    }

    pub fn store(&self) -> &Arc<dyn ConfigStore> {
        &self.store
    }

    /// Merge `request` into the stored config and persist it.
    ///
    /// # Errors
    /// - [`ConfigError::Validation`] for bad input.
    /// - [`ConfigError::Resolution`] when the organization ID is unknown and
    ///   cannot be looked up.
    /// - [`ConfigError::Storage`] on store failures, including
    ///   [`StoreError::Conflict`] once every attempt lost a race.
    pub async fn write(&self, request: &ConfigWriteRequest) -> Result<WriteOutcome, ConfigError> {
        let result = self.write_with_retry(request).await;
        let outcome = match &result {
            Ok(_) => "ok",
            Err(err) => err.outcome(),
        };
        metrics::counter!("orgauth_config_writes_total", "outcome" => outcome).increment(1);
        result
    }

    async fn write_with_retry(
        &self,
        request: &ConfigWriteRequest,
    ) -> Result<WriteOutcome, ConfigError> {
        let mut attempt = 1;
        loop {
            let stored = self.store.get(CONFIG_KEY).await?;
            let existing = decode(stored.as_deref())?.unwrap_or_default();
            let (config, warnings) = self.merge(existing, request).await?;
            let bytes = serde_json::to_vec(&config)
                .map_err(|err| StoreError::Unexpected(anyhow!("encode config: {err}")))?;

            match self
                .store
                .compare_and_put(CONFIG_KEY, stored.as_deref(), bytes)
                .await
            {
                Ok(()) => {
                    tracing::info!(
                        organization = %config.organization,
                        organization_id = config.organization_id,
                        attempt,
                        "config written"
                    );
                    return Ok(WriteOutcome { warnings });
                }
                Err(StoreError::Conflict(reason)) if attempt < MAX_WRITE_ATTEMPTS => {
                    tracing::warn!(attempt, %reason, "config changed during write, retrying");
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    async fn merge(
        &self,
        mut config: OrgAuthConfig,
        request: &ConfigWriteRequest,
    ) -> Result<(OrgAuthConfig, Vec<String>), ConfigError> {
        let mut warnings = Vec::new();
        let previous_organization = config.organization.clone();

        if let Some(organization) = &request.organization {
            config.organization = organization.clone();
        }
        if config.organization.is_empty() {
            return Err(ValidationError::MissingOrganization.into());
        }

        if let Some(id) = request.organization_id {
            if id < 0 {
                return Err(ValidationError::NegativeOrganizationId.into());
            }
            config.organization_id = id;
        }

        if let Some(raw) = &request.base_url {
            config.base_url = normalize_base_url(raw);
        }
        let base_url = effective_base_url(&config.base_url)?;

        if config.organization_id == 0 {
            let token = self.credentials.github_token();
            let id = self
                .resolver
                .resolve(&config.organization, base_url.as_ref(), token.as_deref())
                .await
                .inspect_err(|err| {
                    tracing::error!(
                        organization = %config.organization,
                        error = %err,
                        "error looking up organization_id"
                    );
                })?;
            config.organization_id = id;
        } else if request.organization_id.is_none()
            && !previous_organization.is_empty()
            && previous_organization != config.organization
        {
            tracing::warn!(
                from = %previous_organization,
                to = %config.organization,
                organization_id = config.organization_id,
                "organization renamed, keeping stored organization_id"
            );
            warnings.push(format!(
                "organization changed from {previous_organization:?} to {:?} but organization_id {} was kept; set organization_id to 0 to look up the new organization",
                config.organization, config.organization_id
            ));
        }

        config
            .token
            .parse_token_fields(&request.token)
            .map_err(ValidationError::from)?;

        let ttl = upgrade_value(
            request.ttl,
            request.token.token_ttl,
            UpgradedPair {
                legacy: config.ttl,
                current: config.token.token_ttl,
            },
        );
        config.ttl = ttl.legacy;
        config.token.token_ttl = ttl.current;

        let max_ttl = upgrade_value(
            request.max_ttl,
            request.token.token_max_ttl,
            UpgradedPair {
                legacy: config.max_ttl,
                current: config.token.token_max_ttl,
            },
        );
        config.max_ttl = max_ttl.legacy;
        config.token.token_max_ttl = max_ttl.current;

        // Legacy slots stand in for zero token_* values, so bound the pair
        // readers will actually see.
        check_ttl_bounds(config.effective_ttl(), config.effective_max_ttl())
            .map_err(ValidationError::from)?;

        if request.ttl.is_some() {
            warnings.push(deprecated_warning("ttl", "token_ttl"));
        }
        if request.max_ttl.is_some() {
            warnings.push(deprecated_warning("max_ttl", "token_max_ttl"));
        }

        Ok((config, warnings))
    }

    /// Load the stored record, if any.
    pub async fn load(&self) -> Result<Option<OrgAuthConfig>, ConfigError> {
        let stored = self.store.get(CONFIG_KEY).await?;
        Ok(decode(stored.as_deref())?)
    }

    /// Read projection of the stored record; `None` when nothing is stored.
    pub async fn read(&self) -> Result<Option<ConfigView>, ConfigError> {
        let result = self.load().await;
        let outcome = match &result {
            Ok(Some(_)) => "ok",
            Ok(None) => "not_found",
            Err(_) => "error",
        };
        metrics::counter!("orgauth_config_reads_total", "outcome" => outcome).increment(1);
        Ok(result?.map(|config| config.to_view()))
    }
}

fn decode(bytes: Option<&[u8]>) -> Result<Option<OrgAuthConfig>, StoreError> {
    bytes
        .map(|raw| {
            serde_json::from_slice(raw)
                .map_err(|err| StoreError::Unexpected(anyhow!("decode stored config: {err}")))
        })
        .transpose()
}

/// Collapse trailing separators to exactly one. Empty input clears the
/// override.
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    format!("{}/", trimmed.trim_end_matches('/'))
}

fn effective_base_url(normalized: &str) -> Result<Option<Url>, ValidationError> {
    if normalized.is_empty() {
        return Ok(None);
    }
    parse_base_url(normalized)
        .map(Some)
        .map_err(|err| ValidationError::InvalidBaseUrl(err.to_string()))
}

fn deprecated_warning(field: &str, replacement: &str) -> String {
    format!("field {field:?} is deprecated, use {replacement:?} instead")
}
