//! Organization-scoped auth backend configuration service.
//!
//! # Purpose
//! Exposes the config service core, its storage backends, the GitHub
//! organization resolver, and the HTTP API for use by the binary and tests.
//!
//! # Notes
//! [`service::ConfigService`] holds all write/read semantics; the `api`
//! module is a thin transport over it.
pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod model;
pub mod observability;
pub mod schema;
pub mod service;
pub mod store;
