//! Month and free-text filtering of the merged dataset.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

use crate::models::WallpaperRecord;
use crate::storage::{ArchiveIndex, PartitionCache};

/// Month selection: everything, or one `YYYYMM` month.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MonthFilter {
    #[default]
    All,
    Month(String),
}

impl MonthFilter {
    /// Parses a `date` query value; anything but six digits means all months.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.len() == 6 && value.bytes().all(|b| b.is_ascii_digit()) {
            MonthFilter::Month(value.to_string())
        } else {
            MonthFilter::All
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, MonthFilter::All)
    }

    /// Year of the selected month.
    pub fn year(&self) -> Option<i32> {
        match self {
            MonthFilter::All => None,
            MonthFilter::Month(m) => m[..4].parse().ok(),
        }
    }

    pub fn matches(&self, record: &WallpaperRecord) -> bool {
        match self {
            MonthFilter::All => true,
            MonthFilter::Month(m) => record.date.starts_with(m.as_str()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            MonthFilter::All => "all",
            MonthFilter::Month(m) => m,
        }
    }
}

impl fmt::Display for MonthFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns true if any searchable field contains `query_lower`.
pub fn matches_query(record: &WallpaperRecord, query_lower: &str) -> bool {
    let title = record
        .copyright_keyword
        .as_deref()
        .unwrap_or(&record.copyright)
        .to_lowercase();
    let description = record.description.as_deref().unwrap_or("").to_lowercase();
    let copyright = record.copyright.to_lowercase();

    title.contains(query_lower)
        || description.contains(query_lower)
        || copyright.contains(query_lower)
        || record.url_keyword().contains(query_lower)
}

/// Narrows `records` by month and by a case-insensitive search query.
pub fn filter(records: &[WallpaperRecord], month: &MonthFilter, query: &str) -> Vec<WallpaperRecord> {
    let query = query.trim().to_lowercase();
    records
        .iter()
        .filter(|r| month.matches(r))
        .filter(|r| query.is_empty() || matches_query(r, &query))
        .cloned()
        .collect()
}

/// An entry of the month selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthOption {
    pub value: String,
    pub label: String,
}

/// Months offered for `region`, newest first.
///
/// Loaded years contribute the months actually present; unloaded years with
/// data for the region contribute all twelve months.
pub fn month_options(
    records: &[WallpaperRecord],
    index: &ArchiveIndex,
    cache: &PartitionCache,
    region: &str,
) -> Vec<MonthOption> {
    let mut months: BTreeSet<String> = records
        .iter()
        .filter_map(|r| r.month_key())
        .filter(|m| m.len() == 6)
        .map(str::to_string)
        .collect();

    for &year in index.years_descending() {
        if cache.is_loaded(year, region) || index.effective_region(year, region).is_none() {
            continue;
        }
        for month in 1..=12 {
            months.insert(format!("{:04}{:02}", year, month));
        }
    }

    months
        .into_iter()
        .rev()
        .map(|m| MonthOption {
            label: format!("{} {}", &m[..4], &m[4..6]),
            value: m,
        })
        .collect()
}
