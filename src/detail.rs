//! Detail view of one wallpaper and resolution downloads.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{ErrorCode, GalleryError, GalleryResult};
use crate::models::{Resolution, WallpaperRecord};
use crate::storage::Fetcher;

pub const NO_COPYRIGHT: &str = "No copyright information available";
pub const NO_DESCRIPTION: &str = "No description available";

/// Viewport orientation of the client opening the detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    #[default]
    Landscape,
}

impl Orientation {
    /// Lenient parse; anything but `portrait` is landscape.
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("portrait") {
            Orientation::Portrait
        } else {
            Orientation::Landscape
        }
    }

    /// Resolution shown as the preview image.
    pub fn preview_resolution(&self) -> Resolution {
        match self {
            Orientation::Portrait => Resolution::Mobile,
            Orientation::Landscape => Resolution::Full,
        }
    }
}

/// A download button.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadLink {
    pub resolution: Resolution,
    pub label: &'static str,
    pub url: String,
    pub filename: String,
}

/// Metadata shown for one wallpaper.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailView {
    pub date: String,
    pub title: String,
    pub display_date: String,
    pub copyright: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_url: Option<String>,
    pub image_url: String,
    pub downloads: Vec<DownloadLink>,
}

impl DetailView {
    pub fn open(record: &WallpaperRecord, orientation: Orientation, config: &Config) -> Self {
        let copyright = if record.copyright.is_empty() {
            NO_COPYRIGHT.to_string()
        } else {
            record.copyright.clone()
        };
        let description = record
            .description
            .clone()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| NO_DESCRIPTION.to_string());
        let map_url = record
            .maplink
            .as_deref()
            .filter(|m| !m.is_empty())
            .map(|m| format!("https://www.bing.com/maps/search?q={}&style=h", m));

        let downloads = Resolution::DOWNLOADS
            .iter()
            .map(|&resolution| DownloadLink {
                resolution,
                label: resolution.label(),
                url: config.absolute_image_url(&record.resolution_url(resolution)),
                filename: record.download_filename(resolution),
            })
            .collect();

        Self {
            date: record.date.clone(),
            title: record.title(),
            display_date: record.display_date(),
            copyright,
            description,
            map_url,
            image_url: config.absolute_image_url(
                &record.resolution_url(orientation.preview_resolution()),
            ),
            downloads,
        }
    }
}

/// A downloaded image ready to be saved.
#[derive(Debug, Clone)]
pub struct Download {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Fetches one resolution of `record`.
///
/// Anything but `200 OK` is reported as `DownloadFailed`, keeping the
/// upstream status.
pub async fn download(
    fetcher: &dyn Fetcher,
    config: &Config,
    record: &WallpaperRecord,
    resolution: Resolution,
) -> GalleryResult<Download> {
    let url = config.absolute_image_url(&record.resolution_url(resolution));
    let response = fetcher
        .get_response(&url)
        .await
        .and_then(|response| match response.status {
            200 => Ok(response),
            status => Err(GalleryError::upstream_status(&url, status)),
        })
        .map_err(|e| {
            warn!("Download of {} failed: {}", url, e);
            e.recode(ErrorCode::DownloadFailed)
        })?;
    let bytes = response.body;

    let filename = record.download_filename(resolution);
    info!("Downloaded {} ({} bytes) as {}", url, bytes.len(), filename);
    Ok(Download {
        filename,
        content_type: mime::IMAGE_JPEG.to_string(),
        bytes,
    })
}
