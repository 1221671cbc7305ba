//! Bulletin period identifiers.
//!
//! MSRC publishes one bulletin document per calendar month, identified by a
//! token like `2025-Dec`. [`PeriodId`] parses those tokens into comparable
//! calendar values: ordering is always by the month the token denotes, never
//! by the string itself (`2025-Dec` sorts before `2026-Jan`).

use crate::error::{BulletinError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use tracing::warn;

/// Safety cap on generated period ranges (four years of monthly bulletins).
pub const MAX_RANGE_MONTHS: usize = 48;

/// One calendar-month release of the bulletin corpus (e.g. `2025-Dec`).
///
/// Two `PeriodId`s are equal iff their canonical labels are equal, which by
/// construction means they denote the same month. Ordering is by the derived
/// calendar date.
#[derive(Debug, Clone)]
pub struct PeriodId {
    date: NaiveDate,
    label: String,
}

impl PeriodId {
    /// Parse a raw period token (`"2025-Dec"`, `" 2025-dec "`, ...).
    ///
    /// The token is trimmed and split on the first `-` into a year and a
    /// three-letter month abbreviation; the abbreviation is title-cased before
    /// date parsing so input casing does not matter. Fails with
    /// [`BulletinError::MalformedPeriodId`] when the split does not yield two
    /// components or the month cannot be resolved.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let (year, month) = trimmed
            .split_once('-')
            .ok_or_else(|| BulletinError::malformed_period(raw, "expected '<year>-<month>'"))?;

        let year = year.trim();
        let month = month.trim();
        if year.is_empty() || month.is_empty() {
            return Err(BulletinError::malformed_period(
                raw,
                "year and month components must be non-empty",
            ));
        }

        let month = title_case(month);
        let date = NaiveDate::parse_from_str(&format!("{year}-{month}-01"), "%Y-%b-%d")
            .map_err(|e| BulletinError::malformed_period(raw, e.to_string()))?;

        Ok(Self {
            label: date.format("%Y-%b").to_string(),
            date,
        })
    }

    /// The canonical token in MSRC format (`YYYY-Mon`).
    pub fn as_str(&self) -> &str {
        &self.label
    }

    /// First day of the month this period denotes.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// The calendar month immediately after this one.
    pub fn next(&self) -> Self {
        let (year, month) = if self.date.month() == 12 {
            (self.date.year() + 1, 1)
        } else {
            (self.date.year(), self.date.month() + 1)
        };
        // Day 1 of any month is always representable.
        let date = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(self.date);
        Self {
            label: date.format("%Y-%b").to_string(),
            date,
        }
    }

    /// Parse a list of raw tokens into a deduplicated, calendar-sorted set.
    ///
    /// Malformed entries are skipped with a warning; a token supplied twice in
    /// different casings counts once. This runs before any aggregation so a
    /// duplicated period is never double-counted.
    pub fn normalize<S: AsRef<str>>(raw: &[S]) -> Vec<Self> {
        let mut unique = BTreeSet::new();
        for token in raw {
            match Self::parse(token.as_ref()) {
                Ok(period) => {
                    unique.insert(period);
                }
                Err(e) => warn!("skipping period token: {e}"),
            }
        }
        unique.into_iter().collect()
    }

    /// Inclusive month-by-month range from `start` to `end`, capped at `cap`.
    ///
    /// A `start` after `end` is clamped to `end`, yielding a single month.
    pub fn range(start: &Self, end: &Self, cap: usize) -> Vec<Self> {
        let start = if start > end { end } else { start };
        let mut months = Vec::new();
        let mut current = start.clone();
        while current <= *end && months.len() < cap {
            months.push(current.clone());
            current = current.next();
        }
        months
    }
}

/// Pick the chronologically newest period from the provider's advertised set.
///
/// Unparseable entries are discarded silently — a single malformed enumeration
/// value must not block finding the latest valid one. Returns `None` when the
/// enumeration is empty or nothing parses; callers treat that as "resolution
/// unavailable", not as a failure.
pub fn latest_period<S: AsRef<str>>(tokens: &[S]) -> Option<PeriodId> {
    tokens
        .iter()
        .filter_map(|t| PeriodId::parse(t.as_ref()).ok())
        .max()
}

fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

impl PartialEq for PeriodId {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label
    }
}

impl Eq for PeriodId {}

impl std::hash::Hash for PeriodId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.label.hash(state);
    }
}

impl PartialOrd for PeriodId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PeriodId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.date.cmp(&other.date)
    }
}

impl fmt::Display for PeriodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl Serialize for PeriodId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label)
    }
}

impl<'de> Deserialize<'de> for PeriodId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
