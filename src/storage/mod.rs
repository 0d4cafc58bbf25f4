//! Archive storage: fetchers, partition index, partition cache and merged dataset.

mod cache;
mod dataset;
mod fetcher;
pub(crate) mod index;

pub use cache::*;
pub use dataset::*;
pub use fetcher::*;
pub use index::{ArchiveIndex, FLAT_YEAR};
