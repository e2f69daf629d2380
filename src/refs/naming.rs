//! # Dependent Naming
//!
//! Deterministic names for objects created while expanding references.

use crate::constants::{DEPENDENT_NAME_HASH_LEN, ENTRY_FIELD, MAX_OBJECT_NAME_LEN};
use crate::unstructured::{FieldPath, Segment};
use sha2::{Digest, Sha256};

/// Characters allowed in generated suffixes (no vowels, no confusable digits)
const SAFE_ALPHABET: &[u8] = b"bcdfghjklmnpqrstvwxz2456789";

/// Name of the dependent created for the reference at `path` of the object `prefix`
///
/// The name is `<prefix>-<hash>` where the hash only depends on the
/// reference path, so re-running an expansion always targets the same
/// object. A leading `entry` segment is ignored: the same reference found in
/// `spec.<version>` and `spec.<version>.entry` names the same dependent.
#[must_use]
pub fn dependent_name(prefix: &str, path: &FieldPath) -> String {
    let mut segments = path.segments();
    if segments.first().and_then(Segment::as_field) == Some(ENTRY_FIELD) {
        segments = &segments[1..];
    }
    let identity = segments
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".");

    let digest = Sha256::digest(identity.as_bytes());
    let hash: String = digest
        .iter()
        .take(DEPENDENT_NAME_HASH_LEN)
        .map(|byte| char::from(SAFE_ALPHABET[usize::from(*byte) % SAFE_ALPHABET.len()]))
        .collect();

    let max_prefix = MAX_OBJECT_NAME_LEN - DEPENDENT_NAME_HASH_LEN - 1;
    let prefix: String = prefix.chars().take(max_prefix).collect();
    let prefix = prefix.trim_end_matches(['-', '.']);
    if prefix.is_empty() {
        hash
    } else {
        format!("{prefix}-{hash}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_is_stable_and_prefixed() {
        let path = FieldPath::parse("notifications.apiKey");
        let first = dependent_name("alerts", &path);
        assert_eq!(first, dependent_name("alerts", &path));
        assert!(first.starts_with("alerts-"));
        assert_eq!(first.len(), "alerts-".len() + DEPENDENT_NAME_HASH_LEN);
        assert!(first["alerts-".len()..]
            .bytes()
            .all(|b| SAFE_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_entry_segment_is_ignored() {
        assert_eq!(
            dependent_name("alerts", &FieldPath::parse("entry.apiKey")),
            dependent_name("alerts", &FieldPath::parse("apiKey"))
        );
    }

    #[test]
    fn test_paths_get_distinct_names() {
        assert_ne!(
            dependent_name("alerts", &FieldPath::parse("apiKey")),
            dependent_name("alerts", &FieldPath::parse("serviceKey"))
        );
    }

    #[test]
    fn test_long_prefix_is_truncated() {
        let prefix = "a".repeat(400);
        let name = dependent_name(&prefix, &FieldPath::parse("apiKey"));
        assert_eq!(name.len(), MAX_OBJECT_NAME_LEN);
    }
}
