//! The shared token parameter set.
//!
//! # Purpose
//! [`TokenParams`] is the persisted form embedded in every backend config;
//! [`TokenFieldsInput`] is the request form with one `Option` per field so
//! presence can be told apart from a zero value.
//!
//! # Key invariants
//! - [`TokenParams::parse_token_fields`] only touches fields present in the
//!   input; validation runs against the merged result.
//! - Bound CIDRs are stored as networks; bare addresses become host networks.
//! - Policies are stored sanitized (see [`sanitize_policies`]).
use crate::errors::{TokenParamsError, TokenParamsResult};
use crate::fields::{FieldSchema, FieldSet, FieldType, de, duration_secs, insert};
use crate::policy::sanitize_policies;
use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;
use utoipa::ToSchema;

/// Kind of token a backend issues on login.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum TokenType {
    #[default]
    #[serde(rename = "default")]
    Default,
    #[serde(rename = "service")]
    Service,
    #[serde(rename = "batch")]
    Batch,
    #[serde(rename = "default-service")]
    DefaultService,
    #[serde(rename = "default-batch")]
    DefaultBatch,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Default => "default",
            TokenType::Service => "service",
            TokenType::Batch => "batch",
            TokenType::DefaultService => "default-service",
            TokenType::DefaultBatch => "default-batch",
        }
    }

    fn is_batch(&self) -> bool {
        matches!(self, TokenType::Batch | TokenType::DefaultBatch)
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenType {
    type Err = TokenParamsError;

    fn from_str(input: &str) -> TokenParamsResult<Self> {
        match input.trim() {
            "" | "default" => Ok(TokenType::Default),
            "service" => Ok(TokenType::Service),
            "batch" => Ok(TokenType::Batch),
            "default-service" => Ok(TokenType::DefaultService),
            "default-batch" => Ok(TokenType::DefaultBatch),
            other => Err(TokenParamsError::InvalidTokenType(other.to_string())),
        }
    }
}

/// Persisted token parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenParams {
    #[serde(default)]
    pub token_bound_cidrs: Vec<IpNet>,
    #[serde(default, with = "duration_secs")]
    pub token_explicit_max_ttl: Duration,
    #[serde(default, with = "duration_secs")]
    pub token_max_ttl: Duration,
    #[serde(default)]
    pub token_no_default_policy: bool,
    #[serde(default)]
    pub token_num_uses: i64,
    #[serde(default, with = "duration_secs")]
    pub token_period: Duration,
    #[serde(default)]
    pub token_policies: Vec<String>,
    #[serde(default)]
    pub token_type: TokenType,
    #[serde(default, with = "duration_secs")]
    pub token_ttl: Duration,
}

/// Token fields as received on a write request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct TokenFieldsInput {
    #[serde(default, deserialize_with = "de::opt_comma_strings")]
    pub token_bound_cidrs: Option<Vec<String>>,
    #[serde(default, deserialize_with = "de::opt_duration_secs")]
    #[schema(value_type = Option<u64>)]
    pub token_explicit_max_ttl: Option<Duration>,
    #[serde(default, deserialize_with = "de::opt_duration_secs")]
    #[schema(value_type = Option<u64>)]
    pub token_max_ttl: Option<Duration>,
    #[serde(default, deserialize_with = "de::opt_bool")]
    pub token_no_default_policy: Option<bool>,
    #[serde(default, deserialize_with = "de::opt_int64")]
    pub token_num_uses: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_duration_secs")]
    #[schema(value_type = Option<u64>)]
    pub token_period: Option<Duration>,
    #[serde(default, deserialize_with = "de::opt_comma_strings")]
    pub token_policies: Option<Vec<String>>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default, deserialize_with = "de::opt_duration_secs")]
    #[schema(value_type = Option<u64>)]
    pub token_ttl: Option<Duration>,
}

/// Token parameters as presented on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TokenParamsView {
    pub token_bound_cidrs: Vec<String>,
    pub token_explicit_max_ttl: u64,
    pub token_max_ttl: u64,
    pub token_no_default_policy: bool,
    pub token_num_uses: i64,
    pub token_period: u64,
    pub token_policies: Vec<String>,
    pub token_type: TokenType,
    pub token_ttl: u64,
}

impl TokenParams {
    /// Merge the fields present in `input` and validate the result.
    ///
    /// # Errors
    /// - Malformed CIDRs, a negative use count, or an unknown token type.
    /// - `token_ttl` greater than a non-zero `token_max_ttl`.
    /// - Batch token types combined with a period or a use limit.
    ///
    /// On error `self` may be partially updated; callers discard it.
    pub fn parse_token_fields(&mut self, input: &TokenFieldsInput) -> TokenParamsResult<()> {
        if let Some(raw) = &input.token_bound_cidrs {
            self.token_bound_cidrs = parse_bound_cidrs(raw)?;
        }
        if let Some(value) = input.token_explicit_max_ttl {
            self.token_explicit_max_ttl = value;
        }
        if let Some(value) = input.token_max_ttl {
            self.token_max_ttl = value;
        }
        if let Some(value) = input.token_no_default_policy {
            self.token_no_default_policy = value;
        }
        if let Some(value) = input.token_num_uses {
            if value < 0 {
                return Err(TokenParamsError::NegativeNumUses);
            }
            self.token_num_uses = value;
        }
        if let Some(value) = input.token_period {
            self.token_period = value;
        }
        if let Some(policies) = &input.token_policies {
            self.token_policies = sanitize_policies(policies);
        }
        if let Some(raw) = &input.token_type {
            self.token_type = raw.parse()?;
        }
        if let Some(value) = input.token_ttl {
            self.token_ttl = value;
        }

        check_ttl_bounds(self.token_ttl, self.token_max_ttl)?;
        if self.token_type.is_batch() {
            if !self.token_period.is_zero() {
                return Err(TokenParamsError::BatchWithPeriod);
            }
            if self.token_num_uses != 0 {
                return Err(TokenParamsError::BatchWithNumUses);
            }
        }
        Ok(())
    }

    pub fn to_view(&self) -> TokenParamsView {
        TokenParamsView {
            token_bound_cidrs: self
                .token_bound_cidrs
                .iter()
                .map(|net| net.to_string())
                .collect(),
            token_explicit_max_ttl: self.token_explicit_max_ttl.as_secs(),
            token_max_ttl: self.token_max_ttl.as_secs(),
            token_no_default_policy: self.token_no_default_policy,
            token_num_uses: self.token_num_uses,
            token_period: self.token_period.as_secs(),
            token_policies: self.token_policies.clone(),
            token_type: self.token_type,
            token_ttl: self.token_ttl.as_secs(),
        }
    }
}

/// Reject a TTL above a non-zero maximum.
///
/// Owners that keep legacy TTL fields alongside the token ones call this
/// again with the effective values once both pairs are reconciled.
pub fn check_ttl_bounds(ttl: Duration, max_ttl: Duration) -> TokenParamsResult<()> {
    if !max_ttl.is_zero() && ttl > max_ttl {
        return Err(TokenParamsError::TtlExceedsMaxTtl);
    }
    Ok(())
}

fn parse_bound_cidrs(raw: &[String]) -> TokenParamsResult<Vec<IpNet>> {
    raw.iter()
        .map(|value| {
            value
                .parse::<IpNet>()
                .or_else(|_| value.parse::<IpAddr>().map(IpNet::from))
                .map_err(|err| TokenParamsError::InvalidBoundCidr {
                    value: value.clone(),
                    reason: err.to_string(),
                })
        })
        .collect()
}

/// Register the token parameter declarations in a backend's field set.
pub fn add_token_fields(fields: &mut FieldSet) {
    let group = "Tokens";
    insert(
        fields,
        FieldSchema::new(
            "token_bound_cidrs",
            FieldType::CommaStringSlice,
            "Comma separated string or JSON list of CIDR blocks. If set, specifies the blocks of IP addresses which are allowed to use the generated token.",
        )
        .display("Generated Token's Bound CIDRs", group),
    );
    insert(
        fields,
        FieldSchema::new(
            "token_explicit_max_ttl",
            FieldType::DurationSecond,
            "If set, tokens created via this role carry an explicit maximum TTL. During renewal, the current maximum TTL values of the role and the mount are not checked for changes, and any updates to these values will have no effect on the token being renewed.",
        )
        .display("Generated Token's Explicit Maximum TTL", group),
    );
    insert(
        fields,
        FieldSchema::new(
            "token_max_ttl",
            FieldType::DurationSecond,
            "The maximum lifetime of the generated token",
        )
        .display("Generated Token's Maximum TTL", group),
    );
    insert(
        fields,
        FieldSchema::new(
            "token_no_default_policy",
            FieldType::Bool,
            "If true, the 'default' policy will not automatically be added to generated tokens",
        )
        .display("Do Not Attach 'default' Policy To Generated Tokens", group),
    );
    insert(
        fields,
        FieldSchema::new(
            "token_num_uses",
            FieldType::Int,
            "The maximum number of times a token may be used, a value of zero means unlimited",
        )
        .display("Maximum Uses of Generated Tokens", group),
    );
    insert(
        fields,
        FieldSchema::new(
            "token_period",
            FieldType::DurationSecond,
            "If set, tokens created via this role will have no max lifetime; instead, their renewal period will be fixed to this value.",
        )
        .display("Generated Token's Period", group),
    );
    insert(
        fields,
        FieldSchema::new(
            "token_policies",
            FieldType::CommaStringSlice,
            "Comma-separated list of policies",
        )
        .display("Generated Token's Policies", group),
    );
    insert(
        fields,
        FieldSchema::new(
            "token_type",
            FieldType::String,
            "The type of token to generate, service or batch",
        )
        .display("Generated Token's Type", group),
    );
    insert(
        fields,
        FieldSchema::new(
            "token_ttl",
            FieldType::DurationSecond,
            "The initial ttl of the token to generate",
        )
        .display("Generated Token's Initial TTL", group),
    );
}
