//! Product name resolution.
//!
//! Maps a local OS identity onto the exact canonical product name string the
//! bulletin corpus uses, via an ordered ladder of match rules evaluated with
//! early exit. The order is deliberate: more specific rules must never be
//! shadowed by looser ones. The final rung trades architecture precision for
//! determinism — whenever any row of the target family exists, resolution
//! yields a stable non-null answer.

use crate::identity::{ProductFamily, ResolvedIdentity};
use crate::models::AffectedRow;
use tracing::debug;

/// One rung of the resolution ladder.
///
/// Kept as an explicit tagged list (rather than an inlined if-chain) so each
/// rung is auditable and testable on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    /// `"{family} Version {version} for {suffix}"` — exact, version-specific.
    ExactVersioned,
    /// `"{family} for {suffix}"` — exact, no display version.
    FamilyArch,
    /// Starts with the family and contains the architecture suffix anywhere;
    /// absorbs provider naming drift between family and architecture.
    ArchPattern,
    /// First family-prefixed name in pre-sorted order, any architecture.
    FamilyPrefix,
}

/// The ladder, in evaluation order. First hit wins.
pub const LADDER: [MatchRule; 4] = [
    MatchRule::ExactVersioned,
    MatchRule::FamilyArch,
    MatchRule::ArchPattern,
    MatchRule::FamilyPrefix,
];

impl MatchRule {
    /// Apply this rule against pre-filtered, pre-sorted candidate names.
    pub fn apply(&self, identity: &ResolvedIdentity, names: &[String]) -> Option<String> {
        let family = identity.family.as_str();
        let suffix = identity.architecture.product_suffix();

        match self {
            Self::ExactVersioned => {
                let version = identity.display_version.as_deref()?;
                let wanted = format!("{family} Version {version} for {suffix}");
                names.iter().find(|n| **n == wanted).cloned()
            }
            Self::FamilyArch => {
                let wanted = format!("{family} for {suffix}");
                names.iter().find(|n| **n == wanted).cloned()
            }
            Self::ArchPattern => names
                .iter()
                .find(|n| n.starts_with(family) && n.contains(suffix))
                .cloned(),
            Self::FamilyPrefix => names.iter().find(|n| n.starts_with(family)).cloned(),
        }
    }
}

/// Restrict rows to family-shaped product names, deduplicated and sorted.
///
/// A name is family-shaped when it starts with any recognized family prefix
/// followed by whitespace. Sorting is lexicographic so later fallback
/// scanning is deterministic.
pub fn candidate_names(rows: &[AffectedRow]) -> Vec<String> {
    let mut names: Vec<String> = rows
        .iter()
        .map(|r| r.full_product_name.clone())
        .filter(|name| {
            ProductFamily::all().iter().any(|family| {
                name.strip_prefix(family.as_str())
                    .and_then(|rest| rest.chars().next())
                    .map(|c| c.is_whitespace())
                    .unwrap_or(false)
            })
        })
        .collect();
    names.sort();
    names.dedup();
    names
}

/// Resolve the canonical product name for an identity against one period's
/// affected-software rows.
///
/// Returns `None` when no family-prefixed entry exists at all.
pub fn resolve_product_name(identity: &ResolvedIdentity, rows: &[AffectedRow]) -> Option<String> {
    let names = candidate_names(rows);
    for rule in LADDER {
        if let Some(name) = rule.apply(identity, &names) {
            debug!("product name '{name}' resolved via {rule:?}");
            return Some(name);
        }
    }
    None
}
