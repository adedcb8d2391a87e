//! Organization name to numeric ID resolution.
use crate::auth::github::{GithubClient, GithubError};
use async_trait::async_trait;
use reqwest::Url;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error(transparent)]
    Lookup(#[from] GithubError),
    #[error("organization_id not found for {organization}")]
    NotFound { organization: String },
}

/// Looks up the immutable ID of an organization by its current name.
#[async_trait]
pub trait OrganizationResolver: Send + Sync {
    /// # Errors
    /// - [`ResolutionError::Lookup`] when the request fails or the provider
    ///   answers with a non-success status.
    /// - [`ResolutionError::NotFound`] when the answer carries no usable ID.
    async fn resolve(
        &self,
        organization: &str,
        base_url: Option<&Url>,
        token: Option<&str>,
    ) -> Result<i64, ResolutionError>;
}

pub struct GithubOrganizationResolver {
    client: GithubClient,
}

impl GithubOrganizationResolver {
    pub fn new(client: GithubClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OrganizationResolver for GithubOrganizationResolver {
    async fn resolve(
        &self,
        organization: &str,
        base_url: Option<&Url>,
        token: Option<&str>,
    ) -> Result<i64, ResolutionError> {
        let org = self
            .client
            .get_organization(organization, base_url, token)
            .await
            .inspect_err(|err| {
                metrics::counter!("orgauth_org_resolutions_total", "outcome" => "error")
                    .increment(1);
                tracing::warn!(organization, error = %err, "organization lookup failed");
            })?;
        match org.id {
            Some(id) if id > 0 => {
                metrics::counter!("orgauth_org_resolutions_total", "outcome" => "ok").increment(1);
                tracing::debug!(organization, organization_id = id, "organization resolved");
                Ok(id)
            }
            _ => {
                metrics::counter!("orgauth_org_resolutions_total", "outcome" => "not_found")
                    .increment(1);
                Err(ResolutionError::NotFound {
                    organization: organization.to_string(),
                })
            }
        }
    }
}
