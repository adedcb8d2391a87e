//! Persisted backend configuration and its read projection.
use orgauth_tokenutil::fields::duration_secs;
use orgauth_tokenutil::{TokenParams, TokenParamsView, effective_duration};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;

/// The single persisted configuration record.
///
/// `ttl`/`max_ttl` are the legacy names of `token_ttl`/`token_max_ttl`; both
/// pairs are kept as written and reconciled on read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgAuthConfig {
    #[serde(flatten)]
    pub token: TokenParams,
    #[serde(default)]
    pub organization_id: i64,
    #[serde(default)]
    pub organization: String,
    /// Normalized API base with a trailing `/`; empty means the public API.
    #[serde(default)]
    pub base_url: String,
    #[serde(default, with = "duration_secs")]
    pub ttl: Duration,
    #[serde(default, with = "duration_secs")]
    pub max_ttl: Duration,
}

impl OrgAuthConfig {
    pub fn effective_ttl(&self) -> Duration {
        effective_duration(self.ttl, self.token.token_ttl)
    }

    pub fn effective_max_ttl(&self) -> Duration {
        effective_duration(self.max_ttl, self.token.token_max_ttl)
    }

    /// Presentation form: effective TTLs, legacy names only when non-zero.
    pub fn to_view(&self) -> ConfigView {
        let ttl = self.effective_ttl();
        let max_ttl = self.effective_max_ttl();
        let mut token = self.token.to_view();
        token.token_ttl = ttl.as_secs();
        token.token_max_ttl = max_ttl.as_secs();
        ConfigView {
            organization: self.organization.clone(),
            organization_id: self.organization_id,
            base_url: self.base_url.clone(),
            token,
            ttl: non_zero_secs(ttl),
            max_ttl: non_zero_secs(max_ttl),
        }
    }
}

fn non_zero_secs(value: Duration) -> Option<u64> {
    (!value.is_zero()).then(|| value.as_secs())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConfigView {
    pub organization: String,
    pub organization_id: i64,
    pub base_url: String,
    #[serde(flatten)]
    pub token: TokenParamsView,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_ttl: Option<u64>,
}
