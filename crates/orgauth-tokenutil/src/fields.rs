//! Typed field declarations and lenient field parsers.
//!
//! # Purpose
//! Backends declare every input they recognize as a [`FieldSchema`] so the
//! set can be published for documentation and used to flag unrecognized
//! parameters. The [`de`] parsers accept the loose encodings operators send
//! from CLIs and scripts (numbers as strings, comma-separated lists, humantime
//! durations) while still deserializing into typed request structs.
//!
//! # Key invariants
//! - Field names are unique within a [`FieldSet`].
//! - A JSON `null` is treated the same as an absent field.
//! - Parsed durations are truncated to whole seconds.
use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Wire type of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Int,
    Int64,
    Bool,
    DurationSecond,
    CommaStringSlice,
}

/// Declaration of a single recognized input field.
///
/// # Invariants
/// - `required` fields must be non-empty once the owning entity exists; the
///   owning backend enforces this, the schema only documents it.
/// - `deprecated` fields are still accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub description: String,
    pub required: bool,
    pub deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_group: Option<String>,
}

impl FieldSchema {
    pub fn new(name: &str, field_type: FieldType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            description: description.to_string(),
            required: false,
            deprecated: false,
            display_name: None,
            display_group: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    pub fn display(mut self, name: &str, group: &str) -> Self {
        self.display_name = Some(name.to_string());
        self.display_group = Some(group.to_string());
        self
    }
}

/// Field declarations keyed by field name.
pub type FieldSet = BTreeMap<String, FieldSchema>;

/// Description used for a deprecated field superseded by `replacement`.
pub fn deprecation_text(replacement: &str) -> String {
    format!(
        "Use \"{replacement}\" instead. If this and \"{replacement}\" are both specified, only \"{replacement}\" will be used."
    )
}

pub(crate) fn insert(set: &mut FieldSet, field: FieldSchema) {
    set.insert(field.name.clone(), field);
}

/// Persist a [`std::time::Duration`] as whole seconds.
pub mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}

/// Lenient deserializers for optional request fields.
///
/// Each function is meant for `#[serde(default, deserialize_with = "...")]`
/// on an `Option<T>` field: absence and `null` both yield `None`.
pub mod de {
    use serde::de::{self, Deserializer, SeqAccess, Visitor};
    use std::fmt;
    use std::time::Duration;

    /// Parse a duration given as plain seconds (`"3600"`) or a humantime
    /// string (`"1h"`, `"90m"`). An empty string is zero.
    pub fn parse_duration(raw: &str) -> Result<Duration, String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Duration::ZERO);
        }
        if let Ok(secs) = trimmed.parse::<u64>() {
            return Ok(Duration::from_secs(secs));
        }
        humantime::parse_duration(trimmed)
            .map(|parsed| Duration::from_secs(parsed.as_secs()))
            .map_err(|err| format!("invalid duration {trimmed:?}: {err}"))
    }

    /// Parse a boolean the way operator tooling spells it.
    pub fn parse_bool(raw: &str) -> Result<bool, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "t" | "true" => Ok(true),
            "0" | "f" | "false" => Ok(false),
            other => Err(format!("invalid boolean {other:?}")),
        }
    }

    pub fn opt_duration_secs<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(DurationVisitor)
    }

    pub fn opt_int64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(Int64Visitor)
    }

    pub fn opt_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(BoolVisitor)
    }

    pub fn opt_comma_strings<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(CommaStringsVisitor)
    }

    struct DurationVisitor;

    impl<'de> Visitor<'de> for DurationVisitor {
        type Value = Option<Duration>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number of seconds or a duration string such as \"1h\"")
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_any(DurationVisitor)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(Duration::from_secs(v)))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            u64::try_from(v)
                .map(|secs| Some(Duration::from_secs(secs)))
                .map_err(|_| E::custom("duration cannot be negative"))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            if !v.is_finite() || v < 0.0 {
                return Err(E::custom("duration must be a non-negative number"));
            }
            Ok(Some(Duration::from_secs(v.trunc() as u64)))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            parse_duration(v).map(Some).map_err(E::custom)
        }
    }

    struct Int64Visitor;

    impl<'de> Visitor<'de> for Int64Visitor {
        type Value = Option<i64>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a 64-bit integer or a numeric string")
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_any(Int64Visitor)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            i64::try_from(v)
                .map(Some)
                .map_err(|_| E::custom("integer out of range"))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            if v.fract() != 0.0 || v < i64::MIN as f64 || v > i64::MAX as f64 {
                return Err(E::custom("expected an integer"));
            }
            Ok(Some(v as i64))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                return Ok(Some(0));
            }
            trimmed
                .parse::<i64>()
                .map(Some)
                .map_err(|err| E::custom(format!("invalid integer {trimmed:?}: {err}")))
        }
    }

    struct BoolVisitor;

    impl<'de> Visitor<'de> for BoolVisitor {
        type Value = Option<bool>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a boolean")
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_any(BoolVisitor)
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            match v {
                0 => Ok(Some(false)),
                1 => Ok(Some(true)),
                _ => Err(E::custom(format!("invalid boolean {v}"))),
            }
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            match v {
                0 => Ok(Some(false)),
                1 => Ok(Some(true)),
                _ => Err(E::custom(format!("invalid boolean {v}"))),
            }
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            parse_bool(v).map(Some).map_err(E::custom)
        }
    }

    struct CommaStringsVisitor;

    impl<'de> Visitor<'de> for CommaStringsVisitor {
        type Value = Option<Vec<String>>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a list of strings or a comma-separated string")
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_any(CommaStringsVisitor)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(Some(
                v.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect(),
            ))
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut items = Vec::new();
            while let Some(item) = seq.next_element::<String>()? {
                let trimmed = item.trim();
                if !trimmed.is_empty() {
                    items.push(trimmed.to_string());
                }
            }
            Ok(Some(items))
        }
    }
}
