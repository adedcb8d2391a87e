//! Identity-provider access for the config service.
//!
//! # Purpose
//! Holds the GitHub REST client, the organization resolver built on it, and
//! the credential source that feeds the resolver.
pub mod credentials;
pub mod github;
pub mod resolver;
