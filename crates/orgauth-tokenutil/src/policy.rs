use std::collections::BTreeSet;

/// Normalize a policy list: trim, lowercase, drop empties and duplicates.
///
/// A list naming `root` collapses to just `root`. Output is sorted.
pub fn sanitize_policies(policies: &[String]) -> Vec<String> {
    let set: BTreeSet<String> = policies
        .iter()
        .map(|policy| policy.trim().to_lowercase())
        .filter(|policy| !policy.is_empty())
        .collect();
    if set.contains("root") {
        return vec!["root".to_string()];
    }
    set.into_iter().collect()
}
