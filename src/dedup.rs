//! Record identity and de-duplication.
//!
//! A record's identity is its `(subject, partner)` pair, compared
//! case-insensitively. Every other field is ignored: the first version of a
//! collaboration that reaches the history wins, later sightings are dropped
//! even when they carry a better description or date.

use crate::models::Record;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt;

/// 128-bit identity of a record, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the identity of a record from its subject and partner.
///
/// Both parts are trimmed and lowercased, then joined with a unit separator
/// so that `("ab", "c")` and `("a", "bc")` stay distinct. The digest is
/// truncated to its first 16 bytes.
pub fn fingerprint(record: &Record) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(record.subject.trim().to_lowercase().as_bytes());
    hasher.update(b"\x1f");
    hasher.update(record.partner.trim().to_lowercase().as_bytes());
    let digest = hasher.finalize();

    Fingerprint(digest[..16].iter().map(|b| format!("{:02x}", b)).collect())
}

pub fn is_new(key: &Fingerprint, known: &FingerprintSet) -> bool {
    !known.keys.contains(key)
}

/// The fingerprints of every record accepted so far.
///
/// Built once from the loaded history and grown as records are admitted, so
/// two candidates from the same run also de-duplicate against each other.
#[derive(Debug, Default)]
pub struct FingerprintSet {
    keys: HashSet<Fingerprint>,
}

impl FingerprintSet {
    pub fn from_records(records: &[Record]) -> Self {
        Self {
            keys: records.iter().map(fingerprint).collect(),
        }
    }

    /// Record the candidate's fingerprint; `true` if it was not known yet.
    pub fn admit(&mut self, record: &Record) -> bool {
        let key = fingerprint(record);
        if !is_new(&key, self) {
            return false;
        }
        self.keys.insert(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(subject: &str, partner: &str, description: &str, period: &str) -> Record {
        Record {
            subject: subject.to_string(),
            partner: partner.to_string(),
            category: "food".to_string(),
            description: description.to_string(),
            period: period.to_string(),
            source_url: "http://a".to_string(),
        }
    }

    #[test]
    fn test_fingerprint_ignores_case_and_other_fields() {
        let a = record("Foo", "Acme", "X collab", "2025-02");
        let b = record("FOO", "acme", "a different text", "2024-01");
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_fingerprint_differs_by_partner() {
        let a = record("Foo", "Acme", "", "");
        let b = record("Foo", "Globex", "", "");
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_fingerprint_keeps_field_boundary() {
        let a = record("ab", "c", "", "");
        let b = record("a", "bc", "", "");
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_fingerprint_format() {
        let key = fingerprint(&record("王者荣耀", "肯德基", "", ""));
        let hex = key.to_string();
        assert_eq!(hex.len(), 32);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_is_new_against_history() {
        let history = vec![record("Foo", "Acme", "", "")];
        let known = FingerprintSet::from_records(&history);

        assert!(!is_new(&fingerprint(&record("foo", "ACME", "", "")), &known));
        assert!(is_new(&fingerprint(&record("Foo", "Globex", "", "")), &known));
    }

    #[test]
    fn test_admit_dedupes_within_a_run() {
        let mut known = FingerprintSet::default();
        assert!(known.admit(&record("Foo", "Acme", "first", "2025-01")));
        assert!(!known.admit(&record("Foo", "acme", "second", "2025-03")));
        assert_eq!(known.len(), 1);
    }
}
