//! Token parameter mixin and field helpers shared by orgauth backends.
//!
//! # Purpose
//! Centralizes the access-token settings every auth backend exposes
//! (`token_ttl`, `token_max_ttl`, `token_policies`, bound CIDRs, ...) together
//! with the typed field declarations and lenient field parsers the backends
//! use to accept them.
//!
//! # How it fits
//! A backend embeds [`TokenParams`] in its persisted config, flattens
//! [`TokenFieldsInput`] into its write request, and registers the token field
//! declarations with [`add_token_fields`]. Legacy TTL fields are reconciled
//! with [`upgrade_value`] on write and [`effective_duration`] on read.
//!
//! # Key invariants
//! - Absent input fields never overwrite stored values.
//! - `token_ttl` never exceeds a non-zero `token_max_ttl`. Owners with legacy
//!   TTL fields apply [`check_ttl_bounds`] to the effective pair as well.
//! - Durations are persisted as whole seconds.
//!
//! # Examples
//! ```rust
//! use orgauth_tokenutil::{TokenFieldsInput, TokenParams};
//! use std::time::Duration;
//!
//! let mut params = TokenParams::default();
//! let input = TokenFieldsInput {
//!     token_ttl: Some(Duration::from_secs(60)),
//!     ..TokenFieldsInput::default()
//! };
//! params.parse_token_fields(&input).unwrap();
//! assert_eq!(params.token_ttl, Duration::from_secs(60));
//! ```
//!
//! # Common pitfalls
//! - Reading `token_ttl` straight off a stored config ignores a legacy `ttl`;
//!   go through [`effective_duration`].

mod errors;
pub mod fields;
mod params;
mod policy;
mod upgrade;

pub use errors::{TokenParamsError, TokenParamsResult};
pub use fields::{FieldSchema, FieldSet, FieldType, deprecation_text};
pub use params::{
    TokenFieldsInput, TokenParams, TokenParamsView, TokenType, add_token_fields,
    check_ttl_bounds,
};
pub use policy::sanitize_policies;
pub use upgrade::{UpgradedPair, effective_duration, upgrade_value};
