//! wallpaper-archive: a gallery service for a partitioned daily wallpaper archive.
//!
//! Records are stored as static JSON, one file per year and region, plus an
//! index of per-region counts. The gallery loads partitions lazily, merges them
//! into one date-sorted view, and paginates against index counts so a page can
//! be addressed before the years it spans are fetched.
//!
//! # Example
//!
//! ```no_run
//! use wallpaper_archive::{Config, GalleryServer};
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = GalleryServer::new(Config::default());
//!     server.run().await.unwrap();
//! }
//! ```

pub mod config;
pub mod context;
pub mod debounce;
pub mod detail;
pub mod error;
pub mod filter;
pub mod gallery;
pub mod handlers;
pub mod models;
pub mod navigation;
pub mod pager;
pub mod router;
pub mod server;
pub mod storage;

// Re-exports for convenience
pub use config::{Args, Config, PartitionLayout, DEFAULT_ITEMS_PER_PAGE, DEFAULT_PORT};
pub use error::{ErrorCode, GalleryError, GalleryResult};
pub use gallery::{Gallery, GallerySources};
pub use server::{GalleryServer, GalleryServerBuilder};
pub use storage::{FetchResponse, Fetcher, FsFetcher, HttpFetcher, MemoryFetcher, MirroredSource};
