//! Source of the operator credential used for organization lookups.
//!
//! The credential comes from the service's own environment, never from a
//! request, so a caller cannot use their own token to read the ID of an
//! organization they are not configuring. It is read at call time and never
//! persisted or logged.

pub trait CredentialSource: Send + Sync {
    /// Current lookup token, `None` when unset or empty.
    fn github_token(&self) -> Option<String>;
}

/// Reads the token from a named environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvCredentialSource {
    var: String,
}

impl EnvCredentialSource {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialSource for EnvCredentialSource {
    fn github_token(&self) -> Option<String> {
        std::env::var(&self.var)
            .ok()
            .filter(|value| !value.trim().is_empty())
    }
}

/// Fixed credential, used by tests and embedders that manage secrets
/// themselves.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialSource {
    token: Option<String>,
}

impl StaticCredentialSource {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }
}

impl CredentialSource for StaticCredentialSource {
    fn github_token(&self) -> Option<String> {
        self.token.clone()
    }
}
