use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;

pub const DEFAULT_GITHUB_TOKEN_ENV: &str = "ORGAUTH_GITHUB_TOKEN";
pub const DEFAULT_GITHUB_TIMEOUT_MS: u64 = 10_000;

// Service configuration sourced from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub storage: StorageBackend,
    pub postgres: Option<PostgresConfig>,
    pub github: GithubConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl StorageBackend {
    fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "postgres" => Ok(StorageBackend::Postgres),
            other => bail!("unknown storage backend {other:?} (expected memory or postgres)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_ms: u64,
    pub acquire_timeout_ms: u64,
}

#[derive(Debug, Clone)]
pub struct GithubConfig {
    pub timeout_ms: u64,
    /// Name of the environment variable holding the lookup credential.
    pub token_env: String,
}

#[derive(Debug, Deserialize)]
struct ServiceConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    storage: Option<String>,
    postgres: Option<PostgresConfigOverride>,
    github: Option<GithubConfigOverride>,
}

#[derive(Debug, Deserialize)]
struct PostgresConfigOverride {
    url: Option<String>,
    max_connections: Option<u32>,
    connect_timeout_ms: Option<u64>,
    acquire_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct GithubConfigOverride {
    timeout_ms: Option<u64>,
    token_env: Option<String>,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        let metrics_bind = std::env::var("ORGAUTH_METRICS_BIND")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .with_context(|| "parse ORGAUTH_METRICS_BIND")?;
        let bind_addr = std::env::var("ORGAUTH_BIND")
            .unwrap_or_else(|_| "0.0.0.0:8200".to_string())
            .parse()
            .with_context(|| "parse ORGAUTH_BIND")?;
        let storage = StorageBackend::parse(
            &std::env::var("ORGAUTH_STORAGE").unwrap_or_else(|_| "memory".to_string()),
        )
        .with_context(|| "parse ORGAUTH_STORAGE")?;
        let postgres = match std::env::var("ORGAUTH_POSTGRES_URL") {
            Ok(url) => Some(PostgresConfig {
                url,
                max_connections: std::env::var("ORGAUTH_POSTGRES_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .with_context(|| "parse ORGAUTH_POSTGRES_MAX_CONNECTIONS")?,
                connect_timeout_ms: std::env::var("ORGAUTH_POSTGRES_CONNECT_TIMEOUT_MS")
                    .unwrap_or_else(|_| "5000".to_string())
                    .parse()
                    .with_context(|| "parse ORGAUTH_POSTGRES_CONNECT_TIMEOUT_MS")?,
                acquire_timeout_ms: std::env::var("ORGAUTH_POSTGRES_ACQUIRE_TIMEOUT_MS")
                    .unwrap_or_else(|_| "5000".to_string())
                    .parse()
                    .with_context(|| "parse ORGAUTH_POSTGRES_ACQUIRE_TIMEOUT_MS")?,
            }),
            Err(_) => None,
        };
        let github = GithubConfig {
            timeout_ms: std::env::var("ORGAUTH_GITHUB_TIMEOUT_MS")
                .unwrap_or_else(|_| DEFAULT_GITHUB_TIMEOUT_MS.to_string())
                .parse()
                .with_context(|| "parse ORGAUTH_GITHUB_TIMEOUT_MS")?,
            token_env: std::env::var("ORGAUTH_GITHUB_TOKEN_ENV")
                .unwrap_or_else(|_| DEFAULT_GITHUB_TOKEN_ENV.to_string()),
        };
        Ok(Self {
            bind_addr,
            metrics_bind,
            storage,
            postgres,
            github,
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("ORGAUTH_CONFIG") {
            let contents =
                fs::read_to_string(&path).with_context(|| format!("read ORGAUTH_CONFIG: {path}"))?;
            let override_cfg: ServiceConfigOverride =
                serde_yaml::from_str(&contents).with_context(|| "parse orgauth config yaml")?;
            config.apply_override(override_cfg)?;
        }
        Ok(config)
    }

    fn apply_override(&mut self, override_cfg: ServiceConfigOverride) -> Result<()> {
        if let Some(value) = override_cfg.bind_addr {
            self.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
        }
        if let Some(value) = override_cfg.metrics_bind {
            self.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
        }
        if let Some(value) = override_cfg.storage {
            self.storage = StorageBackend::parse(&value).with_context(|| "parse storage")?;
        }
        if let Some(pg) = override_cfg.postgres {
            let existing = self.postgres.take();
            let url = match (pg.url, existing.as_ref()) {
                (Some(url), _) => url,
                (None, Some(current)) => current.url.clone(),
                (None, None) => bail!("postgres.url is required when overriding postgres"),
            };
            self.postgres = Some(PostgresConfig {
                url,
                max_connections: pg
                    .max_connections
                    .or(existing.as_ref().map(|c| c.max_connections))
                    .unwrap_or(10),
                connect_timeout_ms: pg
                    .connect_timeout_ms
                    .or(existing.as_ref().map(|c| c.connect_timeout_ms))
                    .unwrap_or(5000),
                acquire_timeout_ms: pg
                    .acquire_timeout_ms
                    .or(existing.as_ref().map(|c| c.acquire_timeout_ms))
                    .unwrap_or(5000),
            });
        }
        if let Some(github) = override_cfg.github {
            if let Some(value) = github.timeout_ms {
                self.github.timeout_ms = value;
            }
            if let Some(value) = github.token_env {
                self.github.token_env = value;
            }
        }
        Ok(())
    }
}
