//! Config data model.
//!
//! # Purpose
//! Re-exports the persisted config record, its read projection, and the typed
//! write request used by the service and HTTP layers.
mod config;
mod request;

pub use config::{ConfigView, OrgAuthConfig};
pub use request::ConfigWriteRequest;
