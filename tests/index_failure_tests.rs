//! Behavior when the archive index cannot be loaded.

mod common;

use common::{IndexBuilder, TestServer};
use std::sync::Arc;
use wallpaper_archive::{
    Config, GalleryServerBuilder, GallerySources, MemoryFetcher, MirroredSource,
};

#[tokio::test]
async fn test_gallery_page_shows_load_error() {
    let server = TestServer::start_without_index().await;

    let response = reqwest::get(server.url("/")).await.unwrap();
    assert_eq!(response.status(), 503);
    let html = response.text().await.unwrap();
    assert!(html.contains("Unable to load data"));
    assert!(!html.contains("class=\"card"));
}

#[tokio::test]
async fn test_api_answers_index_unavailable() {
    let server = TestServer::start_without_index().await;

    let response = reqwest::get(server.url("/api/gallery")).await.unwrap();
    assert_eq!(response.status(), 503);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], "IndexUnavailable");
    assert_eq!(body["message"], "Unable to load data");

    let health = server.get_json("/health").await;
    assert_eq!(health["status"], "degraded");
    assert_eq!(health["indexLoaded"], false);

    let regions = server.get_json("/api/regions").await;
    assert!(regions.get("activeRegion").is_none());
}

#[tokio::test]
async fn test_index_is_read_from_mirror() {
    let primary = Arc::new(MemoryFetcher::new());
    primary.fail_with("data_index.json", 503);
    let mirror = Arc::new(MemoryFetcher::new());
    let mut index = IndexBuilder::new(2024);
    index.add(&mirror, 2024, "bing_ROW", 10);
    index.write(&mirror);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let server = GalleryServerBuilder::new()
        .config(Config::default())
        .port(port)
        .sources(GallerySources {
            archive: MirroredSource::new(primary.clone(), Some(mirror.clone())),
            images: Arc::new(MemoryFetcher::new()),
        })
        .build();
    let base_url = server.base_url();
    tokio::spawn(async move {
        server.run().await.unwrap();
    });
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    let page: serde_json::Value = reqwest::get(format!("{}/api/gallery", base_url))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["cards"].as_array().unwrap().len(), 10);
    assert_eq!(primary.request_count("data_index.json"), 1);
    assert_eq!(mirror.request_count("2024/bing_ROW.json"), 1);
}
