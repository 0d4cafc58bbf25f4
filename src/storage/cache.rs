//! Partition cache: memoized records per (year, region).

use chrono::NaiveDate;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::models::{dedup_by_date, WallpaperRecord};

use super::{ArchiveIndex, MirroredSource};

/// Records of one partition, shared between the cache and readers.
pub type Partition = Arc<Vec<WallpaperRecord>>;

/// Key of a cached partition: the year and the *requested* region code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionKey {
    pub year: i32,
    pub region: String,
}

impl PartitionKey {
    pub fn new(year: i32, region: impl Into<String>) -> Self {
        Self {
            year,
            region: region.into(),
        }
    }
}

/// Data-quality notes gathered while loading a partition.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionReport {
    pub year: i32,
    pub region: String,
    pub effective_region: String,
    pub records: usize,
    /// Dates that appeared more than once in the file.
    pub duplicate_dates: Vec<String>,
    /// Calendar days between the first and last record with no entry.
    pub missing_dates: Vec<String>,
    /// True when the partition could not be fetched and was cached empty.
    pub failed: bool,
}

struct CachedPartition {
    records: Partition,
    report: PartitionReport,
}

/// Session-lifetime cache of partition records.
///
/// Each key owns a `OnceCell`: the first caller loads it and concurrent
/// callers for the same key wait for that load instead of fetching again.
pub struct PartitionCache {
    config: Arc<Config>,
    index: Arc<ArchiveIndex>,
    source: MirroredSource,
    entries: DashMap<PartitionKey, Arc<OnceCell<CachedPartition>>>,
}

impl PartitionCache {
    pub fn new(config: Arc<Config>, index: Arc<ArchiveIndex>, source: MirroredSource) -> Self {
        Self {
            config,
            index,
            source,
            entries: DashMap::new(),
        }
    }

    /// Returns the records of `(year, region)`, fetching them on first use.
    ///
    /// Years with no data under any region yield an empty partition that is
    /// not cached. Fetch failures are logged and cached as empty.
    pub async fn fetch(&self, year: i32, region: &str) -> Partition {
        let Some(effective) = self.index.effective_region(year, region) else {
            return Arc::new(Vec::new());
        };

        let key = PartitionKey::new(year, region);
        let cell = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        if let Some(cached) = cell.get() {
            debug!("Partition {}/{} served from cache", year, region);
            return cached.records.clone();
        }

        let cached = cell
            .get_or_init(|| self.load(key, effective))
            .await;
        cached.records.clone()
    }

    async fn load(&self, key: PartitionKey, effective: String) -> CachedPartition {
        let path = self.config.partition_path(key.year, &effective);
        let mut report = PartitionReport {
            year: key.year,
            region: key.region.clone(),
            effective_region: effective,
            ..PartitionReport::default()
        };

        match self.source.get_json::<Vec<WallpaperRecord>>(&path).await {
            Ok(records) => {
                let (records, duplicates) = dedup_by_date(records);
                report.records = records.len();
                report.duplicate_dates = duplicates;
                report.missing_dates = missing_dates(&records);
                self.index.patch_count(key.year, &key.region, records.len());
                info!(
                    "Loaded partition {}/{} ({} records from {})",
                    key.year,
                    key.region,
                    records.len(),
                    path
                );
                CachedPartition {
                    records: Arc::new(records),
                    report,
                }
            }
            Err(e) => {
                error!("Failed to load {}: {}", path, e);
                report.failed = true;
                CachedPartition {
                    records: Arc::new(Vec::new()),
                    report,
                }
            }
        }
    }

    /// Returns the cached records of `(year, region)` without fetching.
    pub fn get(&self, year: i32, region: &str) -> Option<Partition> {
        let key = PartitionKey::new(year, region);
        let cell = self.entries.get(&key)?.clone();
        cell.get().map(|cached| cached.records.clone())
    }

    /// Returns true once `(year, region)` has finished loading.
    pub fn is_loaded(&self, year: i32, region: &str) -> bool {
        self.get(year, region).is_some()
    }

    /// Load reports of the finished partitions of `region`, newest year first.
    pub fn reports(&self, region: &str) -> Vec<PartitionReport> {
        let mut reports: Vec<PartitionReport> = self
            .entries
            .iter()
            .filter(|e| e.key().region == region)
            .filter_map(|e| e.value().get().map(|c| c.report.clone()))
            .collect();
        reports.sort_by(|a, b| b.year.cmp(&a.year));
        reports
    }

    /// Drops every cached partition.
    ///
    /// Loads already in flight finish into their detached cells and are lost.
    pub fn invalidate(&self) {
        debug!("Invalidating {} cached partitions", self.entries.len());
        self.entries.clear();
    }
}

/// Days between the oldest and newest record that have no record.
fn missing_dates(records: &[WallpaperRecord]) -> Vec<String> {
    let mut dates: Vec<NaiveDate> = records
        .iter()
        .filter_map(|r| NaiveDate::parse_from_str(&r.date, "%Y%m%d").ok())
        .collect();
    dates.sort_unstable();
    dates.dedup();

    let mut missing = Vec::new();
    for pair in dates.windows(2) {
        let mut day = pair[0].succ_opt();
        while let Some(d) = day {
            if d >= pair[1] {
                break;
            }
            missing.push(d.format("%Y%m%d").to_string());
            day = d.succ_opt();
        }
    }
    missing
}
