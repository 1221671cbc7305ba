//! Bulletin aggregation across reporting periods.
//!
//! This module merges affected-software rows from one or more bulletin
//! periods into a deduplicated, per-update record set keyed by canonical KB
//! identifier. The merge is a pure set union, so it is idempotent: running
//! the aggregation twice over identical source responses yields byte-identical
//! serialized output. All intermediate state is owned by one invocation and
//! discarded with it; nothing is shared across runs.

use crate::error::{BulletinError, Result};
use crate::kb::{extract_superseded_id, flatten_cves, KbId};
use crate::models::{AggregationResult, KbRecord, UpdateKind};
use crate::period::PeriodId;
use crate::sources::BulletinSource;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// Accumulator for one KB across periods; finalized into a [`KbRecord`].
#[derive(Debug, Default)]
struct Draft {
    months: BTreeSet<PeriodId>,
    cves: BTreeSet<String>,
    supersedes: BTreeSet<KbId>,
}

/// Aggregator for merging per-period bulletin rows into per-update records.
pub struct BulletinAggregator;

impl BulletinAggregator {
    /// Aggregate the given periods for one canonical product name.
    ///
    /// The product name is matched by exact equality against each row's full
    /// product name. Periods are normalized (deduplicated, calendar-sorted)
    /// up front and then processed strictly one after another; a period whose
    /// retrieval fails is skipped with a warning and the rest still
    /// aggregate. Only an empty product name or an empty period list aborts,
    /// with [`BulletinError::Config`].
    pub async fn aggregate(
        source: &dyn BulletinSource,
        product: &str,
        periods: &[PeriodId],
    ) -> Result<AggregationResult> {
        let product = product.trim();
        if product.is_empty() {
            return Err(BulletinError::config("target product name is empty"));
        }
        if periods.is_empty() {
            return Err(BulletinError::config("no periods requested"));
        }

        let periods: BTreeSet<PeriodId> = periods.iter().cloned().collect();
        info!(
            "Aggregating {} period(s) for '{product}' from {}",
            periods.len(),
            source.name()
        );

        let mut drafts: BTreeMap<KbId, Draft> = BTreeMap::new();
        let mut periods_with_entries: BTreeSet<PeriodId> = BTreeSet::new();

        for period in &periods {
            let rows = match source.fetch_affected(period).await {
                Ok(rows) => rows,
                Err(e) => {
                    warn!("skipping period {period}: {e}");
                    continue;
                }
            };
            if rows.is_empty() {
                debug!("period {period}: no rows");
                continue;
            }

            let mut matched = 0usize;
            for row in rows {
                if row.full_product_name != product {
                    continue;
                }
                matched += 1;

                let cves = flatten_cves(row.cves.as_ref());
                let superseded: Vec<KbId> = row
                    .supersedence
                    .iter()
                    .filter_map(|fragment| extract_superseded_id(fragment))
                    .collect();

                for article in &row.kb_articles {
                    let Some(kb) = article.id.as_deref().and_then(KbId::normalize) else {
                        continue;
                    };

                    let draft = drafts.entry(kb).or_default();
                    draft.months.insert(period.clone());
                    draft
                        .cves
                        .extend(cves.iter().filter(|c| !c.is_empty()).cloned());
                    draft.supersedes.extend(superseded.iter().cloned());
                }
            }

            if matched > 0 {
                periods_with_entries.insert(period.clone());
                debug!("period {period}: {matched} matching row(s), {} KB(s) so far", drafts.len());
            }
        }

        let records: Vec<KbRecord> = drafts
            .into_iter()
            .map(|(kb, draft)| {
                let supersedes: Vec<KbId> = draft.supersedes.into_iter().collect();
                KbRecord {
                    kb,
                    months: draft.months.into_iter().collect(),
                    cves: draft.cves.into_iter().collect(),
                    update_type: if supersedes.is_empty() {
                        UpdateKind::Standalone
                    } else {
                        UpdateKind::Superseding
                    },
                    supersedes,
                }
            })
            .collect();

        info!("Aggregated {} KB record(s)", records.len());
        Ok(AggregationResult {
            product: product.to_string(),
            periods: periods_with_entries.into_iter().collect(),
            records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kb::CveField;
    use crate::models::{AffectedRow, KbArticle};
    use async_trait::async_trait;
    use std::collections::HashMap;

    const PRODUCT: &str = "Windows 11 Version 24H2 for x64-based Systems";

    /// Canned source: per-period rows, with named periods forced to fail.
    struct MockSource {
        rows: HashMap<String, Vec<AffectedRow>>,
        failing: Vec<String>,
    }

    impl MockSource {
        fn new(rows: Vec<(&str, Vec<AffectedRow>)>) -> Self {
            Self {
                rows: rows
                    .into_iter()
                    .map(|(p, r)| (p.to_string(), r))
                    .collect(),
                failing: vec![],
            }
        }

        fn failing_on(mut self, period: &str) -> Self {
            self.failing.push(period.to_string());
            self
        }
    }

    #[async_trait]
    impl BulletinSource for MockSource {
        async fn fetch_affected(&self, period: &PeriodId) -> Result<Vec<AffectedRow>> {
            if self.failing.iter().any(|p| p == period.as_str()) {
                return Err(BulletinError::source_fetch("mock", "period unavailable"));
            }
            Ok(self.rows.get(period.as_str()).cloned().unwrap_or_default())
        }

        async fn list_known_periods(&self) -> Result<Vec<String>> {
            Ok(self.rows.keys().cloned().collect())
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    fn row(product: &str, kb: &str, cves: &[&str], supersedence: &[&str]) -> AffectedRow {
        AffectedRow {
            full_product_name: product.to_string(),
            cves: Some(CveField::Many(
                cves.iter().map(|c| Some(c.to_string())).collect(),
            )),
            kb_articles: vec![KbArticle::new(kb)],
            supersedence: supersedence.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn periods(tokens: &[&str]) -> Vec<PeriodId> {
        tokens.iter().map(|t| PeriodId::parse(t).unwrap()).collect()
    }

    #[tokio::test]
    async fn test_merge_across_periods() {
        let source = MockSource::new(vec![
            (
                "2025-Dec",
                vec![row(PRODUCT, "5048667", &["CVE-2025-0001"], &[])],
            ),
            (
                "2026-Jan",
                vec![row(
                    PRODUCT,
                    "KB5048667",
                    &["CVE-2025-0002", "CVE-2025-0001"],
                    &["5046633 (Security Update)"],
                )],
            ),
        ]);

        let result =
            BulletinAggregator::aggregate(&source, PRODUCT, &periods(&["2025-Dec", "2026-Jan"]))
                .await
                .unwrap();

        assert_eq!(result.records.len(), 1);
        let record = &result.records[0];
        assert_eq!(record.kb.as_str(), "KB5048667");
        let months: Vec<_> = record.months.iter().map(|m| m.as_str()).collect();
        assert_eq!(months, vec!["2025-Dec", "2026-Jan"]);
        assert_eq!(record.cves, vec!["CVE-2025-0001", "CVE-2025-0002"]);
        assert_eq!(record.supersedes.len(), 1);
        assert_eq!(record.supersedes[0].as_str(), "KB5046633");
        assert_eq!(record.update_type, UpdateKind::Superseding);
    }

    #[tokio::test]
    async fn test_exact_product_equality_filter() {
        let source = MockSource::new(vec![(
            "2025-Dec",
            vec![
                row(PRODUCT, "5048667", &["CVE-2025-0001"], &[]),
                row(
                    "Windows 11 Version 24H2 for ARM64-based Systems",
                    "5048668",
                    &["CVE-2025-0001"],
                    &[],
                ),
            ],
        )]);

        let result = BulletinAggregator::aggregate(&source, PRODUCT, &periods(&["2025-Dec"]))
            .await
            .unwrap();

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].kb.as_str(), "KB5048667");
    }

    #[tokio::test]
    async fn test_failed_period_is_skipped_not_fatal() {
        let source = MockSource::new(vec![
            (
                "2025-Dec",
                vec![row(PRODUCT, "5048667", &["CVE-2025-0001"], &[])],
            ),
            ("2026-Jan", vec![]),
        ])
        .failing_on("2026-Jan");

        let result =
            BulletinAggregator::aggregate(&source, PRODUCT, &periods(&["2025-Dec", "2026-Jan"]))
                .await
                .unwrap();

        let listed: Vec<_> = result.periods.iter().map(|p| p.as_str()).collect();
        assert_eq!(listed, vec!["2025-Dec"]);
        assert_eq!(result.records.len(), 1);
    }

    #[tokio::test]
    async fn test_idempotent_byte_identical_output() {
        let source = MockSource::new(vec![
            (
                "2025-Dec",
                vec![
                    row(PRODUCT, "5048667", &["CVE-2025-0003", "CVE-2025-0001"], &[]),
                    row(PRODUCT, "5044384", &["CVE-2025-0002"], &["5039212"]),
                ],
            ),
            (
                "2026-Jan",
                vec![row(PRODUCT, "5048667", &["CVE-2025-0001"], &["5044384"])],
            ),
        ]);
        let requested = periods(&["2026-Jan", "2025-Dec", "2025-dec"]);

        let first = BulletinAggregator::aggregate(&source, PRODUCT, &requested)
            .await
            .unwrap();
        let second = BulletinAggregator::aggregate(&source, PRODUCT, &requested)
            .await
            .unwrap();

        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn test_numeric_sort_of_records() {
        let source = MockSource::new(vec![(
            "2025-Dec",
            vec![
                row(PRODUCT, "100", &[], &[]),
                row(PRODUCT, "99", &[], &[]),
            ],
        )]);

        let result = BulletinAggregator::aggregate(&source, PRODUCT, &periods(&["2025-Dec"]))
            .await
            .unwrap();

        let kbs: Vec<_> = result.records.iter().map(|r| r.kb.as_str()).collect();
        assert_eq!(kbs, vec!["KB99", "KB100"]);
    }

    #[tokio::test]
    async fn test_article_without_identifier_is_dropped() {
        let mut no_id = row(PRODUCT, "5048667", &[], &[]);
        no_id.kb_articles = vec![KbArticle { id: None, url: None }, KbArticle::new("  ")];
        let source = MockSource::new(vec![("2025-Dec", vec![no_id])]);

        let result = BulletinAggregator::aggregate(&source, PRODUCT, &periods(&["2025-Dec"]))
            .await
            .unwrap();

        assert!(result.records.is_empty());
        // The row matched the product, so the period still counts as usable.
        assert_eq!(result.periods.len(), 1);
    }

    #[tokio::test]
    async fn test_config_errors_abort() {
        let source = MockSource::new(vec![]);

        let empty_product =
            BulletinAggregator::aggregate(&source, "  ", &periods(&["2025-Dec"])).await;
        assert!(matches!(empty_product, Err(BulletinError::Config(_))));

        let empty_periods = BulletinAggregator::aggregate(&source, PRODUCT, &[]).await;
        assert!(matches!(empty_periods, Err(BulletinError::Config(_))));
    }

    #[tokio::test]
    async fn test_no_matching_rows_yields_empty_result_not_error() {
        let source = MockSource::new(vec![(
            "2025-Dec",
            vec![row("Windows 10 for x64-based Systems", "5048000", &[], &[])],
        )]);

        let result = BulletinAggregator::aggregate(&source, PRODUCT, &periods(&["2025-Dec"]))
            .await
            .unwrap();
        assert!(result.records.is_empty());
        assert!(result.periods.is_empty());
    }
}
