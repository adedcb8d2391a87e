//! Typed configuration write request.
use orgauth_tokenutil::TokenFieldsInput;
use orgauth_tokenutil::fields::de;
use serde::Deserialize;
use std::time::Duration;
use utoipa::ToSchema;

/// Fields accepted on a config write. `None` means "not supplied"; supplied
/// fields overwrite the stored value, absent fields leave it alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct ConfigWriteRequest {
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default, deserialize_with = "de::opt_int64")]
    pub organization_id: Option<i64>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default, deserialize_with = "de::opt_duration_secs")]
    #[schema(value_type = Option<u64>)]
    pub ttl: Option<Duration>,
    #[serde(default, deserialize_with = "de::opt_duration_secs")]
    #[schema(value_type = Option<u64>)]
    pub max_ttl: Option<Duration>,
    #[serde(flatten)]
    pub token: TokenFieldsInput,
}
