//! High-level orchestration over a bulletin source.
//!
//! [`BulletinManager`] ties the pieces together for a caller: resolving the
//! latest known period, resolving the local identity to a canonical product
//! name, and running an aggregation. Source failures degrade the resolver
//! paths to `None`; only the aggregator's configuration checks are fatal.

use crate::aggregator::BulletinAggregator;
use crate::identity::ResolvedIdentity;
use crate::models::AggregationResult;
use crate::period::{latest_period, PeriodId};
use crate::resolver::resolve_product_name;
use crate::sources::BulletinSource;
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

pub struct BulletinManager {
    source: Arc<dyn BulletinSource>,
}

impl BulletinManager {
    pub fn new(source: Arc<dyn BulletinSource>) -> Self {
        Self { source }
    }

    /// The chronologically newest period the source currently advertises.
    ///
    /// `None` means resolution is unavailable (empty enumeration, nothing
    /// parsable, or the source itself failed) — callers decide whether that
    /// is fatal for them.
    pub async fn latest_period(&self) -> Option<PeriodId> {
        match self.source.list_known_periods().await {
            Ok(tokens) => latest_period(&tokens),
            Err(e) => {
                warn!("period enumeration unavailable: {e}");
                None
            }
        }
    }

    /// Resolve the canonical product name for a local identity.
    ///
    /// Runs the match ladder against the latest known period's rows. `None`
    /// when no latest period can be determined, the period's data is
    /// unavailable, or no row of the identity's family exists.
    pub async fn resolve_product(&self, identity: &ResolvedIdentity) -> Option<String> {
        let period = self.latest_period().await?;
        info!("Resolving product name against period {period}");

        let rows = match self.source.fetch_affected(&period).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("rows for {period} unavailable: {e}");
                return None;
            }
        };

        resolve_product_name(identity, &rows)
    }

    /// Aggregate the given periods for a canonical product name.
    pub async fn aggregate(
        &self,
        product: &str,
        periods: &[PeriodId],
    ) -> Result<AggregationResult> {
        Ok(BulletinAggregator::aggregate(self.source.as_ref(), product, periods).await?)
    }

    /// Resolve the product from the identity, then aggregate.
    ///
    /// Convenience path for callers that do not already know their canonical
    /// product name. Fails when the product cannot be resolved, since the
    /// aggregation would be meaningless without it.
    pub async fn aggregate_for_identity(
        &self,
        identity: &ResolvedIdentity,
        periods: &[PeriodId],
    ) -> Result<AggregationResult> {
        let product = self
            .resolve_product(identity)
            .await
            .ok_or_else(|| anyhow::anyhow!("could not resolve a canonical product name"))?;
        self.aggregate(&product, periods).await
    }
}
