//! Supersedence graph expansion.
//!
//! Installing update X makes an earlier update Y unnecessary when X supersedes
//! Y, directly or through a chain. Given the aggregated records and the set of
//! identifiers actually installed on a host, this module computes the
//! transitive closure of updates that are logically present, and records which
//! installed root covers each superseded update. Deciding what that means for
//! compliance is the downstream scanner's job.

use crate::kb::KbId;
use crate::models::KbRecord;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Result of expanding the supersedence graph from the installed set.
#[derive(Debug, Clone, Default)]
pub struct SupersedenceExpansion {
    /// Installed updates plus everything they transitively supersede.
    pub logically_present: BTreeSet<KbId>,
    /// Superseded update to the sorted installed roots that cover it.
    pub superseded_by: BTreeMap<KbId, Vec<KbId>>,
}

/// Expand supersedence from each installed update.
///
/// Traversal is depth-first with a per-root seen set, so supersedence cycles
/// in provider data terminate instead of looping.
pub fn expand(records: &[KbRecord], installed: &BTreeSet<KbId>) -> SupersedenceExpansion {
    let mut supersedes_map: HashMap<&KbId, Vec<&KbId>> = HashMap::new();
    for record in records {
        if !record.supersedes.is_empty() {
            supersedes_map
                .entry(&record.kb)
                .or_default()
                .extend(record.supersedes.iter());
        }
    }

    let mut logically_present: BTreeSet<KbId> = installed.clone();
    let mut superseded_by: BTreeMap<KbId, BTreeSet<KbId>> = BTreeMap::new();

    for root in installed {
        let mut stack = vec![root];
        let mut seen: HashSet<&KbId> = HashSet::from([root]);

        while let Some(current) = stack.pop() {
            let Some(older) = supersedes_map.get(current) else {
                continue;
            };
            for &old in older {
                logically_present.insert(old.clone());
                superseded_by
                    .entry(old.clone())
                    .or_default()
                    .insert(root.clone());

                if seen.insert(old) {
                    stack.push(old);
                }
            }
        }
    }

    SupersedenceExpansion {
        logically_present,
        superseded_by: superseded_by
            .into_iter()
            .map(|(kb, roots)| (kb, roots.into_iter().collect()))
            .collect(),
    }
}
