//! Config service HTTP API module.
//!
//! # Purpose
//! Exposes the route handler modules, error helpers, and OpenAPI aggregation.
pub mod config;
pub mod error;
pub mod openapi;
pub mod system;
pub mod types;
