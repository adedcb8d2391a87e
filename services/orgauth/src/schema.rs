//! Field declarations for the config endpoint.
use orgauth_tokenutil::{FieldSchema, FieldSet, FieldType, add_token_fields, deprecation_text};
use std::sync::OnceLock;

static CONFIG_FIELDS: OnceLock<FieldSet> = OnceLock::new();

const POLICIES_SUFFIX: &str = " This will apply to all tokens generated by this auth method, in addition to any policies configured for specific users/groups.";

/// Every field the config write endpoint recognizes.
pub fn config_fields() -> &'static FieldSet {
    CONFIG_FIELDS.get_or_init(build_config_fields)
}

fn build_config_fields() -> FieldSet {
    let mut fields = FieldSet::new();
    let mut add = |field: FieldSchema| {
        fields.insert(field.name.clone(), field);
    };
    add(FieldSchema::new(
        "organization",
        FieldType::String,
        "The organization users must be part of",
    )
    .required());
    add(FieldSchema::new(
        "organization_id",
        FieldType::Int64,
        "The ID of the organization users must be part of",
    ));
    add(FieldSchema::new(
        "base_url",
        FieldType::String,
        "The API endpoint to use. Useful if you are running GitHub Enterprise or an API-compatible authentication server.",
    )
    .display("Base URL", "GitHub Options"));
    add(FieldSchema::new("ttl", FieldType::DurationSecond, &deprecation_text("token_ttl")).deprecated());
    add(
        FieldSchema::new("max_ttl", FieldType::DurationSecond, &deprecation_text("token_max_ttl"))
            .deprecated(),
    );

    add_token_fields(&mut fields);
    if let Some(policies) = fields.get_mut("token_policies") {
        policies.description.push_str(POLICIES_SUFFIX);
    }
    fields
}

/// Names in `keys` that are not declared fields, sorted.
pub fn unknown_fields<'a>(keys: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    let fields = config_fields();
    let mut unknown: Vec<String> = keys
        .into_iter()
        .filter(|key| !fields.contains_key(key.as_str()))
        .cloned()
        .collect();
    unknown.sort();
    unknown
}
