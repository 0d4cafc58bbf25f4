//! Page slicing, page-button layout, card construction and image probing.

use serde::Serialize;
use std::io::Cursor;

use crate::config::Config;
use crate::error::{ErrorCode, GalleryError, GalleryResult};
use crate::models::{Resolution, WallpaperRecord};

/// Largest side of a square image treated as the host's placeholder.
pub const PLACEHOLDER_MAX_SIDE: u32 = 600;

/// Returns the records of `page` (1-based), empty past the end.
pub fn paginate(filtered: &[WallpaperRecord], page: usize, items_per_page: usize) -> &[WallpaperRecord] {
    let start = page.saturating_sub(1).saturating_mul(items_per_page);
    if start >= filtered.len() {
        return &[];
    }
    let end = (start + items_per_page).min(filtered.len());
    &filtered[start..end]
}

/// Number of pages to offer.
///
/// Virtual mode counts every record the index advertises, loaded or not;
/// otherwise only the filtered records count.
pub fn total_pages(
    virtual_mode: bool,
    total_item_count: usize,
    filtered_len: usize,
    items_per_page: usize,
) -> usize {
    let items = if virtual_mode {
        total_item_count
    } else {
        filtered_len
    };
    items.div_ceil(items_per_page.max(1))
}

/// One entry of the pagination bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PageButton {
    Page { number: usize, active: bool },
    Ellipsis,
}

/// Lays out the pagination bar for `current` of `total` pages.
pub fn page_buttons(current: usize, total: usize) -> Vec<PageButton> {
    if total <= 1 {
        return Vec::new();
    }

    let mut start = current.saturating_sub(2).max(2);
    let mut end = current.saturating_add(2).min(total - 1);
    if current < 5 {
        end = (total - 1).min(5);
    }
    if current.saturating_add(4) > total {
        start = total.saturating_sub(4).max(2);
    }

    let mut pages = vec![1];
    pages.extend(start..=end);
    pages.push(total);

    let mut buttons = Vec::with_capacity(pages.len() + 2);
    let mut previous = 0;
    for number in pages {
        if previous != 0 && number > previous + 1 {
            buttons.push(PageButton::Ellipsis);
        }
        buttons.push(PageButton::Page {
            number,
            active: number == current,
        });
        previous = number;
    }
    buttons
}

/// Decides which cards are on screen when the page is first shown.
pub trait VisibilityWatcher: Send + Sync {
    fn is_visible(&self, index: usize) -> bool;
}

/// Treats the first `count` cards as visible.
#[derive(Debug, Clone, Copy)]
pub struct FirstRowsVisible {
    pub count: usize,
}

impl VisibilityWatcher for FirstRowsVisible {
    fn is_visible(&self, index: usize) -> bool {
        index < self.count
    }
}

/// A gallery card.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub date: String,
    pub display_date: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub year: String,
    pub image_url: String,
    pub featured: bool,
    /// The image loads only once scrolled into view.
    pub lazy: bool,
}

/// Builds the cards of one page.
pub fn build_cards(
    records: &[WallpaperRecord],
    page: usize,
    config: &Config,
    watcher: &dyn VisibilityWatcher,
) -> Vec<Card> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let featured = config.enable_featured && page == 1 && index == 0;
            let resolution = if featured {
                Resolution::Medium
            } else {
                Resolution::Thumb
            };
            Card {
                date: record.date.clone(),
                display_date: record.display_date(),
                title: record.title(),
                description: record.description.clone().filter(|d| !d.is_empty()),
                year: record.year().unwrap_or_default().to_string(),
                image_url: config.absolute_image_url(&record.resolution_url(resolution)),
                featured,
                lazy: !watcher.is_visible(index),
            }
        })
        .collect()
}

/// Everything needed to render one gallery page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    pub region: String,
    pub month: String,
    pub query: String,
    pub page: usize,
    pub total_pages: usize,
    /// Records matching the current filters among those loaded.
    pub matched: usize,
    pub search_mode: bool,
    pub fully_loaded: bool,
    pub cards: Vec<Card>,
    pub buttons: Vec<PageButton>,
}

/// Outcome of resolving a card image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageStatus {
    Loaded,
    Errored,
}

/// Classifies decoded image dimensions.
pub fn classify_dimensions(width: u32, height: u32) -> ImageStatus {
    if width == height && width <= PLACEHOLDER_MAX_SIDE {
        ImageStatus::Errored
    } else {
        ImageStatus::Loaded
    }
}

/// Reads the dimensions of an encoded image without decoding its pixels.
pub fn image_dimensions(bytes: &[u8]) -> GalleryResult<(u32, u32)> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| GalleryError::with_message(ErrorCode::InvalidImage, e.to_string()))?;
    reader
        .into_dimensions()
        .map_err(|e| GalleryError::with_message(ErrorCode::InvalidImage, e.to_string()))
}

/// Classifies fetched image bytes; undecodable data counts as errored.
///
/// Also returns the dimensions when the header could be read.
pub fn probe_image(bytes: &[u8]) -> (ImageStatus, Option<(u32, u32)>) {
    match image_dimensions(bytes) {
        Ok((width, height)) => (classify_dimensions(width, height), Some((width, height))),
        Err(_) => (ImageStatus::Errored, None),
    }
}
