//! Virtual dataset: merged view of loaded partitions plus virtual offsets.

use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::models::WallpaperRecord;

use super::{ArchiveIndex, PartitionCache};

/// Position of one year in the fully-loaded dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearOffset {
    pub year: i32,
    pub start: usize,
    pub count: usize,
}

impl YearOffset {
    pub fn end(&self) -> usize {
        self.start + self.count
    }
}

/// Year offsets in descending year order, computed from index counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OffsetTable {
    pub years: Vec<YearOffset>,
    pub total_item_count: usize,
}

impl OffsetTable {
    /// Lays out `counts` (year, count) contiguously in the given order.
    pub fn from_counts(counts: impl IntoIterator<Item = (i32, usize)>) -> Self {
        let mut running = 0;
        let years = counts
            .into_iter()
            .map(|(year, count)| {
                let offset = YearOffset {
                    year,
                    start: running,
                    count,
                };
                running += count;
                offset
            })
            .collect();
        Self {
            years,
            total_item_count: running,
        }
    }

    /// Years whose interval overlaps the items of `page` (1-based).
    pub fn years_needed_for_page(&self, page: usize, items_per_page: usize) -> Vec<i32> {
        let start = page.saturating_sub(1).saturating_mul(items_per_page);
        let end = start.saturating_add(items_per_page);
        self.years
            .iter()
            .filter(|y| start < y.end() && end > y.start)
            .map(|y| y.year)
            .collect()
    }

    pub fn get(&self, year: i32) -> Option<&YearOffset> {
        self.years.iter().find(|y| y.year == year)
    }
}

/// Sorted merge of every loaded partition of a region.
///
/// Holds no view of its own: every merge and offset table is built for the
/// region the caller names, so requests for different regions never read
/// each other's results.
pub struct VirtualDataset {
    index: Arc<ArchiveIndex>,
    cache: Arc<PartitionCache>,
}

impl VirtualDataset {
    pub fn new(index: Arc<ArchiveIndex>, cache: Arc<PartitionCache>) -> Self {
        Self { index, cache }
    }

    /// Merges the cached partitions of `region`, newest date first.
    pub fn rebuild(&self, region: &str) -> Arc<Vec<WallpaperRecord>> {
        let mut records = Vec::new();
        for &year in self.index.years_descending() {
            if let Some(partition) = self.cache.get(year, region) {
                records.extend(partition.iter().cloned());
            }
        }
        // Fixed-width YYYYMMDD sorts chronologically as a string.
        records.sort_by(|a, b| b.date.cmp(&a.date));
        debug!("Rebuilt dataset for {}: {} records", region, records.len());
        Arc::new(records)
    }

    /// Year offsets for `region` from index counts.
    pub fn compute_offsets(&self, region: &str) -> Arc<OffsetTable> {
        Arc::new(OffsetTable::from_counts(
            self.index
                .years_descending()
                .iter()
                .map(|&year| (year, self.index.region_count(year, region))),
        ))
    }

    /// Loads every unloaded year from the newest down to `oldest_needed`.
    ///
    /// The merged view has no gaps only when all newer years are present, so
    /// years between the newest and the needed one are loaded too. Years with
    /// no data for `region` are skipped. Returns true if anything was fetched.
    pub async fn ensure_loaded_through(&self, oldest_needed: i32, region: &str) -> bool {
        let mut loaded_any = false;
        for &year in self.index.years_descending() {
            if year < oldest_needed {
                break;
            }
            if self.needs_fetch(year, region) {
                self.cache.fetch(year, region).await;
                loaded_any = true;
            }
        }
        loaded_any
    }

    /// Loads every unloaded year in descending order, rebuilding after each.
    ///
    /// `on_progress` sees the merged view after every newly loaded year.
    pub async fn load_all_years_progressively<F>(&self, region: &str, mut on_progress: F)
    where
        F: FnMut(&[WallpaperRecord]),
    {
        for &year in self.index.years_descending() {
            if self.needs_fetch(year, region) {
                self.cache.fetch(year, region).await;
                let merged = self.rebuild(region);
                on_progress(&merged);
            }
        }
    }

    fn needs_fetch(&self, year: i32, region: &str) -> bool {
        self.index.effective_region(year, region).is_some() && !self.cache.is_loaded(year, region)
    }

    /// Finds a record by date among the cached partitions of `region`.
    pub fn find(&self, region: &str, date: &str) -> Option<WallpaperRecord> {
        self.index
            .years_descending()
            .iter()
            .filter_map(|&year| self.cache.get(year, region))
            .find_map(|partition| partition.iter().find(|r| r.date == date).cloned())
    }

    /// Returns true once every year with data for `region` is loaded.
    pub fn is_fully_loaded(&self, region: &str) -> bool {
        self.index
            .years_descending()
            .iter()
            .all(|&year| !self.needs_fetch(year, region))
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::sample_record;
    use crate::storage::index::index_from;
    use crate::storage::{MemoryFetcher, MirroredSource};

    fn records_for(year: i32, count: usize) -> Vec<WallpaperRecord> {
        (0..count)
            .map(|i| {
                let day = chrono::NaiveDate::from_ymd_opt(year, 1, 1).unwrap()
                    + chrono::Duration::days(i as i64);
                sample_record(&day.format("%Y%m%d").to_string(), "x")
            })
            .collect()
    }

    fn dataset(
        fetcher: Arc<MemoryFetcher>,
        index: ArchiveIndex,
    ) -> (VirtualDataset, Arc<PartitionCache>) {
        let index = Arc::new(index);
        let cache = Arc::new(PartitionCache::new(
            Arc::new(Config::default()),
            index.clone(),
            MirroredSource::new(fetcher, None),
        ));
        (VirtualDataset::new(index, cache.clone()), cache)
    }

    #[test]
    fn test_offsets_are_contiguous() {
        let table = OffsetTable::from_counts(vec![(2024, 40), (2023, 31), (2022, 5)]);
        assert_eq!(table.total_item_count, 76);
        let mut expected_start = 0;
        for y in &table.years {
            assert_eq!(y.start, expected_start);
            expected_start = y.end();
        }
        assert_eq!(expected_start, table.total_item_count);
    }

    #[test]
    fn test_years_needed_for_page_spans_boundary() {
        let table = OffsetTable::from_counts(vec![(2024, 40), (2023, 31), (2022, 5)]);
        assert_eq!(table.years_needed_for_page(1, 31), vec![2024]);
        // Items 31..62 cover the end of 2024 and most of 2023.
        assert_eq!(table.years_needed_for_page(2, 31), vec![2024, 2023]);
        // Items 62..93 cover the rest of 2023 and all of 2022.
        assert_eq!(table.years_needed_for_page(3, 31), vec![2023, 2022]);
        assert!(table.years_needed_for_page(4, 31).is_empty());
        assert!(table.years_needed_for_page(usize::MAX, 31).is_empty());
    }

    #[test]
    fn test_zero_count_years_are_never_needed() {
        let table = OffsetTable::from_counts(vec![(2024, 10), (2023, 0), (2022, 10)]);
        assert_eq!(table.years_needed_for_page(1, 15), vec![2024, 2022]);
    }

    #[tokio::test]
    async fn test_rebuild_sorts_regardless_of_load_order() {
        let fetcher = Arc::new(MemoryFetcher::new());
        fetcher.insert_json("2023/bing_ROW.json", &records_for(2023, 3));
        fetcher.insert_json("2024/bing_ROW.json", &records_for(2024, 3));
        let (dataset, cache) = dataset(
            fetcher,
            index_from(2024, &[(2024, &[("bing_ROW", 3)]), (2023, &[("bing_ROW", 3)])]),
        );

        cache.fetch(2023, "bing_ROW").await;
        cache.fetch(2024, "bing_ROW").await;
        let merged = dataset.rebuild("bing_ROW");
        assert_eq!(merged.len(), 6);
        assert!(merged.windows(2).all(|w| w[0].date > w[1].date));
        assert_eq!(merged[0].date, "20240103");
        assert_eq!(merged[5].date, "20230101");
        assert_eq!(dataset.find("bing_ROW", "20230102").unwrap().date, "20230102");
        assert!(dataset.find("bing_ROW", "20220101").is_none());
        assert!(dataset.find("bing_de-DE", "20230102").is_none());
    }

    #[tokio::test]
    async fn test_page_two_loads_previous_year_without_gaps() {
        let fetcher = Arc::new(MemoryFetcher::new());
        fetcher.insert_json("2024/bing_ROW.json", &records_for(2024, 31));
        fetcher.insert_json("2023/bing_ROW.json", &records_for(2023, 28));
        let (dataset, cache) = dataset(
            fetcher.clone(),
            index_from(
                2024,
                &[(2024, &[("bing_ROW", 31)]), (2023, &[("bing_ROW", 28)])],
            ),
        );

        cache.fetch(2024, "bing_ROW").await;
        let offsets = dataset.compute_offsets("bing_ROW");

        let needed = offsets.years_needed_for_page(2, 31);
        assert_eq!(needed, vec![2023]);
        let oldest = *needed.iter().min().unwrap();
        assert!(dataset.ensure_loaded_through(oldest, "bing_ROW").await);
        let merged = dataset.rebuild("bing_ROW");

        assert_eq!(merged.len(), 59);
        assert_eq!(merged[30].date, "20240101");
        assert_eq!(merged[31].date, "20230128");
        assert_eq!(fetcher.request_count("2024/bing_ROW.json"), 1);
        assert_eq!(fetcher.request_count("2023/bing_ROW.json"), 1);
    }

    #[tokio::test]
    async fn test_ensure_loaded_through_fills_intermediate_years() {
        let fetcher = Arc::new(MemoryFetcher::new());
        for year in [2024, 2023, 2022, 2021] {
            fetcher.insert_json(format!("{}/bing_ROW.json", year), &records_for(year, 2));
        }
        let (dataset, cache) = dataset(
            fetcher.clone(),
            index_from(
                2024,
                &[
                    (2024, &[("bing_ROW", 2)]),
                    (2023, &[("bing_ROW", 2)]),
                    (2022, &[("bing_ROW", 2)]),
                    (2021, &[("bing_ROW", 2)]),
                ],
            ),
        );

        dataset.ensure_loaded_through(2022, "bing_ROW").await;
        assert!(cache.is_loaded(2023, "bing_ROW"));
        assert!(cache.is_loaded(2022, "bing_ROW"));
        assert!(!cache.is_loaded(2021, "bing_ROW"));
        assert!(!dataset.ensure_loaded_through(2022, "bing_ROW").await);
    }

    #[tokio::test]
    async fn test_load_all_years_reports_progress() {
        let fetcher = Arc::new(MemoryFetcher::new());
        fetcher.insert_json("2024/bing_ROW.json", &records_for(2024, 2));
        fetcher.insert_json("2023/bing_ROW.json", &records_for(2023, 3));
        let (dataset, _) = dataset(
            fetcher,
            index_from(2024, &[(2024, &[("bing_ROW", 2)]), (2023, &[("bing_ROW", 3)])]),
        );

        let mut sizes = Vec::new();
        dataset
            .load_all_years_progressively("bing_ROW", |merged| sizes.push(merged.len()))
            .await;
        assert_eq!(sizes, vec![2, 5]);
        assert!(dataset.is_fully_loaded("bing_ROW"));
    }

    #[tokio::test]
    async fn test_years_without_region_data_are_not_refetched() {
        let fetcher = Arc::new(MemoryFetcher::new());
        fetcher.insert_json("2024/bing_ROW.json", &records_for(2024, 2));
        fetcher.insert_json("2022/bing_ROW.json", &records_for(2022, 2));
        let (dataset, _) = dataset(
            fetcher.clone(),
            index_from(
                2024,
                &[
                    (2024, &[("bing_ROW", 2)]),
                    (2023, &[]),
                    (2022, &[("bing_ROW", 2)]),
                ],
            ),
        );

        assert!(dataset.ensure_loaded_through(2022, "bing_ROW").await);
        assert!(!dataset.ensure_loaded_through(2022, "bing_ROW").await);
        assert!(!dataset.ensure_loaded_through(2023, "bing_ROW").await);
        assert!(dataset.is_fully_loaded("bing_ROW"));

        let mut progress = 0;
        dataset
            .load_all_years_progressively("bing_ROW", |_| progress += 1)
            .await;
        assert_eq!(progress, 0);
        assert_eq!(fetcher.request_count("2022/bing_ROW.json"), 1);
    }
}
