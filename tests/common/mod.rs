//! Common test utilities.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use wallpaper_archive::models::{PartitionIndex, WallpaperRecord, YearInfo};
use wallpaper_archive::{Config, GalleryServerBuilder, GallerySources, MemoryFetcher, MirroredSource};

/// Test server wrapper.
pub struct TestServer {
    pub base_url: String,
    /// Serves `data_index.json` and the partition files.
    pub archive: Arc<MemoryFetcher>,
    /// Serves image bytes by absolute URL.
    pub images: Arc<MemoryFetcher>,
}

impl TestServer {
    /// Starts a server over [`seeded_archive`].
    pub async fn start() -> Self {
        Self::start_with(seeded_archive(), Config::default()).await
    }

    /// Starts a server whose archive has no index file.
    pub async fn start_without_index() -> Self {
        Self::start_with(Arc::new(MemoryFetcher::new()), Config::default()).await
    }

    /// Creates and starts a test server on a random port.
    pub async fn start_with(archive: Arc<MemoryFetcher>, config: Config) -> Self {
        // Find an available port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let images = Arc::new(MemoryFetcher::new());
        let sources = GallerySources {
            archive: MirroredSource::new(archive.clone(), None),
            images: images.clone(),
        };

        let server = GalleryServerBuilder::new()
            .config(config)
            .host("127.0.0.1")
            .port(port)
            .sources(sources)
            .build();
        let base_url = server.base_url();

        // Start server in background
        tokio::spawn(async move {
            server.run().await.unwrap();
        });

        // Wait for server to be ready
        tokio::time::sleep(Duration::from_millis(100)).await;

        Self {
            base_url,
            archive,
            images,
        }
    }

    /// Returns the URL for a path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GETs `path` and decodes the JSON body.
    pub async fn get_json(&self, path: &str) -> serde_json::Value {
        let response = reqwest::get(self.url(path)).await.unwrap();
        assert!(
            response.status().is_success(),
            "GET {} answered {}",
            path,
            response.status()
        );
        response.json().await.unwrap()
    }
}

/// Two years of `bing_ROW` (31 + 28 records) and five days of `bing_de-DE`.
pub fn seeded_archive() -> Arc<MemoryFetcher> {
    let archive = Arc::new(MemoryFetcher::new());
    let mut index = IndexBuilder::new(2024);
    index.add(&archive, 2024, "bing_ROW", 31);
    index.add(&archive, 2023, "bing_ROW", 28);
    index.add(&archive, 2024, "bing_de-DE", 5);
    index.write(&archive);
    archive
}

/// Collects per-year counts while partition files are written.
pub struct IndexBuilder {
    index: PartitionIndex,
}

impl IndexBuilder {
    pub fn new(current_year: i32) -> Self {
        Self {
            index: PartitionIndex {
                current_year,
                years: BTreeMap::new(),
            },
        }
    }

    /// Writes `count` consecutive days from January 1st of `year`.
    pub fn add(&mut self, archive: &MemoryFetcher, year: i32, region: &str, count: usize) {
        self.index
            .years
            .entry(year.to_string())
            .or_insert_with(YearInfo::default)
            .regions
            .insert(region.to_string(), count as u64);
        archive.insert_json(
            format!("{}/{}.json", year, region),
            &records_for(year, region, count),
        );
    }

    pub fn write(&self, archive: &MemoryFetcher) {
        archive.insert_json("data_index.json", &self.index);
    }
}

/// Builds `count` records starting at January 1st of `year`.
pub fn records_for(year: i32, region: &str, count: usize) -> Vec<WallpaperRecord> {
    let start = chrono::NaiveDate::from_ymd_opt(year, 1, 1).unwrap();
    (0..count)
        .map(|i| {
            let date = (start + chrono::Duration::days(i as i64))
                .format("%Y%m%d")
                .to_string();
            WallpaperRecord {
                urlbase: Some(format!("/th?id=OHR.Peak{}_EN-US{}", date, 1000 + i)),
                url: String::new(),
                copyright: format!("Peak {} in {} (© Photographer)", date, region),
                copyright_keyword: None,
                description: Some(format!("Mountain view number {}", i)),
                maplink: None,
                date,
            }
        })
        .collect()
}

/// Absolute URL the gallery requests for a record image.
pub fn image_url(date: &str, index: usize, suffix: &str) -> String {
    format!(
        "https://www.bing.com/th?id=OHR.Peak{}_EN-US{}{}",
        date,
        1000 + index,
        suffix
    )
}

/// Encodes a blank PNG of the given size.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let image = image::DynamicImage::new_rgb8(width, height);
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, image::ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}
