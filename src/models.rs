//! Core data models for bulletin aggregation.
//!
//! [`AffectedRow`] is the read-only input shape supplied by a bulletin source;
//! [`KbRecord`] and [`AggregationResult`] are the aggregation output consumed
//! by a downstream scanner. Output collections are always present — an empty
//! field serializes as `[]`, never as null or a missing key — so consumers can
//! rely on a fixed shape.

use crate::kb::{CveField, KbId};
use crate::period::PeriodId;
use serde::{Deserialize, Serialize};

/// One affected-software row: a (product, update) pair within a period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffectedRow {
    /// Full product name exactly as the bulletin corpus spells it.
    pub full_product_name: String,
    /// Vulnerability identifiers; the corpus emits either one value or a list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cves: Option<CveField>,
    /// Update-article references carried by the row.
    #[serde(default)]
    pub kb_articles: Vec<KbArticle>,
    /// Free-form supersedence fragments, each possibly embedding a KB number.
    #[serde(default)]
    pub supersedence: Vec<String>,
}

/// An update-article reference with a raw identifier that may or may not
/// already carry the `KB` prefix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbArticle {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl KbArticle {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            url: None,
        }
    }
}

/// Classification of an aggregated update, derived from its supersedes set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateKind {
    /// Replaces at least one earlier update.
    Superseding,
    /// Replaces nothing known.
    Standalone,
}

/// One aggregated per-update record, keyed by canonical KB identifier.
///
/// Created on first sighting of its identifier, union-merged on every later
/// sighting within the same run, and never deleted. Sub-collections are
/// emitted sorted and deduplicated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbRecord {
    pub kb: KbId,
    /// Periods the update was observed in, calendar-sorted.
    pub months: Vec<PeriodId>,
    /// Vulnerability identifiers across all periods, sorted.
    pub cves: Vec<String>,
    /// Updates this one supersedes, sorted.
    pub supersedes: Vec<KbId>,
    pub update_type: UpdateKind,
}

/// Final aggregation output for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationResult {
    /// The canonical product name rows were filtered against.
    pub product: String,
    /// Requested periods that actually contributed rows, deduplicated and
    /// calendar-sorted. Periods that failed retrieval or matched nothing are
    /// absent, without aborting the run.
    pub periods: Vec<PeriodId>,
    /// Per-update records, ascending by numeric KB suffix.
    pub records: Vec<KbRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result_serializes_with_fixed_shape() {
        let result = AggregationResult {
            product: "Windows 11 Version 24H2 for x64-based Systems".to_string(),
            periods: vec![],
            records: vec![],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json["periods"].as_array().unwrap().is_empty());
        assert!(json["records"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_affected_row_deserializes_sparse_input() {
        let row: AffectedRow = serde_json::from_str(
            r#"{"full_product_name": "Windows 11 Version 24H2 for x64-based Systems"}"#,
        )
        .unwrap();
        assert!(row.cves.is_none());
        assert!(row.kb_articles.is_empty());
        assert!(row.supersedence.is_empty());
    }
}
