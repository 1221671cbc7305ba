pub mod aggregator;
pub mod config;
pub mod error;
pub mod identity;
pub mod kb;
pub mod logging;
pub mod manager;
pub mod models;
pub mod period;
pub mod resolver;
pub mod sources;
pub mod supersedence;

pub use aggregator::BulletinAggregator;
pub use config::Config;
pub use error::{BulletinError, Result};
pub use identity::{Architecture, ProductFamily, ResolvedIdentity};
pub use kb::KbId;
pub use manager::BulletinManager;
pub use models::{AffectedRow, AggregationResult, KbRecord, UpdateKind};
pub use period::{latest_period, PeriodId};
