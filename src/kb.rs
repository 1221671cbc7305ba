//! Canonical KB update identifiers and supersedence/CVE normalization.
//!
//! Bulletin data carries update identifiers in inconsistent shapes: article
//! references may or may not be `KB`-prefixed, and supersedence information
//! arrives as free-form text with a numeric identifier buried in it (e.g.
//! `"4567890 (Security Update)"`). Everything is normalized here into one
//! fixed form, `KB` + digits, so aggregation output is directly comparable to
//! the identifiers an inventory collector reports for the local host.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static SUPERSEDED_KB_REGEX: Lazy<Result<Regex, regex_lite::Error>> =
    Lazy::new(|| Regex::new(r"(\d{4,7})"));

/// A canonical update identifier: the fixed `KB` prefix followed by digits.
///
/// `KbId` sorts by its numeric suffix ascending (so `KB99` comes before
/// `KB100`), with the full string as a tiebreaker for non-numeric residue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KbId(String);

impl KbId {
    /// Normalize a raw article identifier into canonical form.
    ///
    /// An existing `KB`/`kb` prefix is kept (uppercased) rather than doubled;
    /// anything else gets the prefix prepended. Returns `None` for inputs
    /// that are empty after trimming — an article reference with no
    /// identifier at all is dropped by the caller.
    pub fn normalize(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        let has_prefix = trimmed
            .get(..2)
            .map(|p| p.eq_ignore_ascii_case("kb"))
            .unwrap_or(false);
        let id = if has_prefix {
            format!("KB{}", &trimmed[2..])
        } else {
            format!("KB{trimmed}")
        };
        Some(Self(id))
    }

    /// The canonical string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The numeric suffix used for ordering.
    ///
    /// Parses the leading digit run after the prefix; identifiers without one
    /// sort before all numeric identifiers.
    fn numeric(&self) -> u64 {
        let digits: String = self
            .0
            .get(2..)
            .unwrap_or("")
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().unwrap_or(0)
    }
}

impl PartialOrd for KbId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KbId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.numeric()
            .cmp(&other.numeric())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl fmt::Display for KbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extract the superseded update identifier from a free-form fragment.
///
/// Scans for the first run of 4-7 consecutive digits and returns it in
/// canonical form; `None` when no such run exists.
pub fn extract_superseded_id(raw: &str) -> Option<KbId> {
    let regex = SUPERSEDED_KB_REGEX.as_ref().ok()?;
    let caps = regex.captures(raw)?;
    KbId::normalize(&caps[1])
}

/// A vulnerability-identifier field that may arrive as one value or many.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CveField {
    /// A single identifier.
    One(String),
    /// A list of identifiers, possibly with null holes.
    Many(Vec<Option<String>>),
}

/// Flatten a vulnerability-identifier field into a stable list.
///
/// A missing field is an empty list, a single value a one-element list, and a
/// multi-value field is itself with nulls dropped. Non-empty string entries
/// are never dropped.
pub fn flatten_cves(field: Option<&CveField>) -> Vec<String> {
    match field {
        None => Vec::new(),
        Some(CveField::One(cve)) => vec![cve.clone()],
        Some(CveField::Many(cves)) => cves.iter().flatten().cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_prepends_prefix() {
        assert_eq!(KbId::normalize("5048667").unwrap().as_str(), "KB5048667");
    }

    #[test]
    fn test_normalize_keeps_existing_prefix() {
        assert_eq!(KbId::normalize("KB5048667").unwrap().as_str(), "KB5048667");
        assert_eq!(KbId::normalize("kb5048667").unwrap().as_str(), "KB5048667");
    }

    #[test]
    fn test_normalize_rejects_blank_input() {
        assert_eq!(KbId::normalize("   "), None);
        assert_eq!(KbId::normalize(""), None);
    }

    #[test]
    fn test_numeric_ordering() {
        let kb99 = KbId::normalize("99").unwrap();
        let kb100 = KbId::normalize("100").unwrap();
        assert!(kb99 < kb100, "KB99 must sort before KB100");

        let mut ids = vec![kb100.clone(), kb99.clone()];
        ids.sort();
        assert_eq!(ids, vec![kb99, kb100]);
    }

    #[test]
    fn test_extract_superseded_id_from_fragment() {
        let kb = extract_superseded_id("4567890 (Security Update)").unwrap();
        assert_eq!(kb.as_str(), "KB4567890");
    }

    #[test]
    fn test_extract_superseded_id_first_run_wins() {
        let kb = extract_superseded_id("replaces 5046633, then 5044384").unwrap();
        assert_eq!(kb.as_str(), "KB5046633");
    }

    #[test]
    fn test_extract_superseded_id_none_without_digit_run() {
        assert_eq!(extract_superseded_id("no identifier here"), None);
        assert_eq!(extract_superseded_id("123"), None);
    }

    #[test]
    fn test_flatten_cves_shapes() {
        assert!(flatten_cves(None).is_empty());

        let one = CveField::One("CVE-2025-0001".to_string());
        assert_eq!(flatten_cves(Some(&one)), vec!["CVE-2025-0001"]);

        let many = CveField::Many(vec![
            Some("CVE-2025-0001".to_string()),
            None,
            Some("CVE-2025-0002".to_string()),
        ]);
        assert_eq!(
            flatten_cves(Some(&many)),
            vec!["CVE-2025-0001", "CVE-2025-0002"]
        );
    }

    #[test]
    fn test_cve_field_deserializes_one_or_many() {
        let one: CveField = serde_json::from_str("\"CVE-2025-0001\"").unwrap();
        assert_eq!(flatten_cves(Some(&one)), vec!["CVE-2025-0001"]);

        let many: CveField =
            serde_json::from_str("[\"CVE-2025-0001\", null, \"CVE-2025-0002\"]").unwrap();
        assert_eq!(flatten_cves(Some(&many)).len(), 2);
    }
}
