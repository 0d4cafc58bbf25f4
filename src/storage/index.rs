//! Partition index: which (year, region) partitions exist and how large they are.

use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

use crate::config::{PartitionLayout, INDEX_FILE};
use crate::error::{ErrorCode, GalleryResult};
use crate::models::{PartitionIndex, YearInfo, REGIONS};

use super::MirroredSource;

/// Pseudo-year holding the single partition of a flat archive.
pub const FLAT_YEAR: i32 = 0;

/// Loaded partition index with effective-region resolution.
pub struct ArchiveIndex {
    /// Index contents; counts are patched in place after real fetches.
    index: RwLock<PartitionIndex>,
    /// Regions each year advertised when the index was loaded.
    advertised: BTreeMap<i32, BTreeSet<String>>,
    years_desc: Vec<i32>,
    fallback_region: String,
}

impl ArchiveIndex {
    /// Builds an index from already-parsed contents.
    pub fn new(index: PartitionIndex, fallback_region: impl Into<String>) -> Self {
        let mut advertised = BTreeMap::new();
        for (key, info) in &index.years {
            match key.parse::<i32>() {
                Ok(year) => {
                    advertised.insert(year, info.regions.keys().cloned().collect());
                }
                Err(_) => warn!("Ignoring non-numeric year '{}' in partition index", key),
            }
        }
        let years_desc = advertised.keys().rev().copied().collect();

        Self {
            index: RwLock::new(index),
            advertised,
            years_desc,
            fallback_region: fallback_region.into(),
        }
    }

    /// Loads the index for the given layout.
    ///
    /// A flat archive has no index file; it gets one pseudo-year advertising
    /// every catalogue region, with counts learned on first fetch.
    pub async fn load(
        source: &MirroredSource,
        layout: PartitionLayout,
        fallback_region: &str,
    ) -> GalleryResult<Self> {
        let index = match layout {
            PartitionLayout::Yearly => source
                .get_json::<PartitionIndex>(INDEX_FILE)
                .await
                .map_err(|e| e.recode(ErrorCode::IndexUnavailable))?,
            PartitionLayout::Flat => Self::flat_index(),
        };
        info!(
            "Loaded partition index: current year {}, {} years",
            index.current_year,
            index.years.len()
        );
        Ok(Self::new(index, fallback_region))
    }

    fn flat_index() -> PartitionIndex {
        let regions = REGIONS.iter().map(|r| (r.code.to_string(), 0)).collect();
        let mut years = BTreeMap::new();
        years.insert(FLAT_YEAR.to_string(), YearInfo { regions });
        PartitionIndex {
            current_year: FLAT_YEAR,
            years,
        }
    }

    pub fn current_year(&self) -> i32 {
        self.index.read().current_year
    }

    /// Years in numeric descending order.
    pub fn years_descending(&self) -> &[i32] {
        &self.years_desc
    }

    pub fn has_year(&self, year: i32) -> bool {
        self.advertised.contains_key(&year)
    }

    /// Resolves the region whose data satisfies `region` for `year`.
    pub fn effective_region(&self, year: i32, region: &str) -> Option<String> {
        let available = self.advertised.get(&year)?;
        if available.contains(region) {
            return Some(region.to_string());
        }
        if available.contains(&self.fallback_region) {
            return Some(self.fallback_region.clone());
        }
        available.iter().next().cloned()
    }

    /// Record count used for virtual pagination of `region` in `year`.
    pub fn region_count(&self, year: i32, region: &str) -> usize {
        let index = self.index.read();
        let Some(info) = index.years.get(&year.to_string()) else {
            return 0;
        };
        if let Some(count) = info.regions.get(region) {
            return *count as usize;
        }
        self.effective_region(year, region)
            .and_then(|effective| info.regions.get(&effective).copied())
            .unwrap_or(0) as usize
    }

    /// Records the real count observed for `region` in `year`.
    pub fn patch_count(&self, year: i32, region: &str, count: usize) {
        let mut index = self.index.write();
        index
            .years
            .entry(year.to_string())
            .or_default()
            .regions
            .insert(region.to_string(), count as u64);
    }
}

#[cfg(test)]
pub(crate) fn index_from(current_year: i32, years: &[(i32, &[(&str, u64)])]) -> ArchiveIndex {
    let years = years
        .iter()
        .map(|(year, regions)| {
            let regions = regions.iter().map(|(r, c)| (r.to_string(), *c)).collect();
            (year.to_string(), YearInfo { regions })
        })
        .collect();
    ArchiveIndex::new(
        PartitionIndex {
            current_year,
            years,
        },
        "bing_en-US",
    )
}
