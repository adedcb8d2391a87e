//! Reconciliation of legacy fields with their `token_*` replacements.
//!
//! Older configs carried `ttl` and `max_ttl`; the token mixin replaced them
//! with `token_ttl` and `token_max_ttl`. Both pairs are stored side by side so
//! a config written with the legacy name reads back the same way.
use std::time::Duration;

/// A legacy value and its replacement as persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpgradedPair<T> {
    pub legacy: T,
    pub current: T,
}

/// Apply one write to a legacy/current pair.
///
/// | legacy input | current input | result                                  |
/// |--------------|---------------|-----------------------------------------|
/// | set          | absent        | legacy updated, current untouched       |
/// | set          | set           | both updated                            |
/// | absent       | set           | current updated, legacy untouched       |
/// | absent       | absent        | stored pair unchanged                   |
///
/// When only the legacy name is supplied the current slot keeps its stored
/// value; readers go through [`effective_duration`], which falls back to the
/// legacy value only while the current one is zero.
pub fn upgrade_value<T>(
    legacy_input: Option<T>,
    current_input: Option<T>,
    stored: UpgradedPair<T>,
) -> UpgradedPair<T> {
    UpgradedPair {
        legacy: legacy_input.unwrap_or(stored.legacy),
        current: current_input.unwrap_or(stored.current),
    }
}

/// The value a reader should see: `current` unless it is zero.
pub fn effective_duration(legacy: Duration, current: Duration) -> Duration {
    if current.is_zero() { legacy } else { current }
}
