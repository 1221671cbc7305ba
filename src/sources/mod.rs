//! Bulletin data sources.
//!
//! A source supplies affected-software rows per bulletin period and advertises
//! the set of period tokens it currently recognizes. The aggregation core only
//! ever talks to the [`BulletinSource`] trait; [`msrc::MsrcSource`] is the
//! concrete implementation against the MSRC CVRF API.

pub mod msrc;

use crate::error::Result;
use crate::models::AffectedRow;
use crate::period::PeriodId;
use async_trait::async_trait;

/// Trait for bulletin data providers.
///
/// Implement this trait to aggregate from another corpus, or to supply canned
/// data in tests.
#[async_trait]
pub trait BulletinSource: Send + Sync {
    /// Fetch the affected-software rows for one bulletin period.
    ///
    /// A failure here is contained by callers: the aggregator skips the
    /// period, and resolvers degrade to `None`.
    async fn fetch_affected(&self, period: &PeriodId) -> Result<Vec<AffectedRow>>;

    /// The provider's currently advertised set of period tokens.
    ///
    /// The set is provider-controlled and changes monthly; entries are not
    /// guaranteed to parse and callers must tolerate malformed ones.
    async fn list_known_periods(&self) -> Result<Vec<String>>;

    /// Get the name of this source (used for logging and error reporting).
    fn name(&self) -> &str;
}
