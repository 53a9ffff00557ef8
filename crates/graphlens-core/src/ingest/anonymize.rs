//! Identifier pseudonymization scoped to a single ingestion call.
//!
//! Every external identifier passes through SHA-256 (optionally salted) and
//! is recorded as a 64-character lowercase hex digest. The map is owned by
//! one ingestion and dropped when it returns, so the reverse direction never
//! leaves the normalizer.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

/// Length of the digest prefix used for default display labels.
pub const LABEL_PREFIX_LEN: usize = 8;

/// Digest an external identifier.
#[must_use]
pub fn anonymize_id(external: &str, salt: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    if let Some(salt) = salt {
        hasher.update(salt.as_bytes());
        hasher.update([0u8]);
    }
    hasher.update(external.as_bytes());
    hex::encode(hasher.finalize())
}

/// Display label for an anonymized node with no label of its own.
#[must_use]
pub fn default_anonymous_label(anon_id: &str) -> String {
    let prefix = anon_id.get(..LABEL_PREFIX_LEN).unwrap_or(anon_id);
    format!("User {prefix}")
}

/// Bidirectional external ↔ canonical id map.
///
/// With anonymization disabled the map is the identity, which lets the
/// parsers resolve ids the same way in both modes.
#[derive(Debug, Default)]
pub struct IdentifierMap {
    anonymize: bool,
    salt: Option<String>,
    forward: HashMap<String, String>,
    reverse: HashMap<String, String>,
}

impl IdentifierMap {
    #[must_use]
    pub fn anonymizing(salt: Option<String>) -> Self {
        Self {
            anonymize: true,
            salt,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn passthrough() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn is_anonymizing(&self) -> bool {
        self.anonymize
    }

    /// Canonical id for `external`, recording it on first sight.
    pub fn resolve(&mut self, external: &str) -> String {
        if let Some(id) = self.forward.get(external) {
            return id.clone();
        }
        let id = if self.anonymize {
            anonymize_id(external, self.salt.as_deref())
        } else {
            external.to_string()
        };
        self.forward.insert(external.to_string(), id.clone());
        self.reverse.insert(id.clone(), external.to_string());
        id
    }

    /// Canonical id for an external id that was already resolved.
    #[must_use]
    pub fn get(&self, external: &str) -> Option<&str> {
        self.forward.get(external).map(String::as_str)
    }

    /// External id behind a canonical id. Only meaningful during ingestion.
    #[must_use]
    pub fn original(&self, canonical: &str) -> Option<&str> {
        self.reverse.get(canonical).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_fixed_length_hex() {
        let id = anonymize_id("alice@example.com", None);
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn digest_matches_sha256() {
        assert_eq!(
            anonymize_id("abc", None),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn salt_changes_digest() {
        assert_ne!(anonymize_id("abc", None), anonymize_id("abc", Some("pepper")));
    }

    #[test]
    fn repeated_references_collapse() {
        let mut ids = IdentifierMap::anonymizing(None);
        let a1 = ids.resolve("alice");
        let b = ids.resolve("bob");
        let a2 = ids.resolve("alice");
        assert_eq!(a1, a2);
        assert_ne!(a1, b);
        assert_eq!(ids.len(), 2);
        assert_eq!(ids.original(&a1), Some("alice"));
    }

    #[test]
    fn passthrough_is_identity() {
        let mut ids = IdentifierMap::passthrough();
        assert_eq!(ids.resolve("alice"), "alice");
        assert_eq!(ids.get("alice"), Some("alice"));
        assert_eq!(ids.get("bob"), None);
    }

    #[test]
    fn default_label_uses_short_prefix() {
        let id = anonymize_id("abc", None);
        assert_eq!(default_anonymous_label(&id), "User ba7816bf");
    }
}
