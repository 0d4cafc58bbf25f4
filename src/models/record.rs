//! Wallpaper record model and resolution variants.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::{ErrorCode, GalleryError};

/// Title used when a record carries no copyright information.
pub const DEFAULT_TITLE: &str = "Bing Wallpaper";

/// Base name used for downloads when the URL has no `OHR.` keyword.
pub const DEFAULT_DOWNLOAD_NAME: &str = "BingWallpaper";

fn ohr_keyword_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"OHR\.([A-Za-z0-9]+)").expect("static regex"))
}

/// One daily wallpaper entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WallpaperRecord {
    /// `YYYYMMDD`, unique within a partition.
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urlbase: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub copyright: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright_keyword: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maplink: Option<String>,
}

impl WallpaperRecord {
    /// Returns the display title of the record.
    pub fn title(&self) -> String {
        if let Some(keyword) = self.copyright_keyword.as_deref().filter(|k| !k.is_empty()) {
            return keyword.to_string();
        }
        let head = self.copyright.split('(').next().unwrap_or("").trim();
        if head.is_empty() {
            DEFAULT_TITLE.to_string()
        } else {
            head.to_string()
        }
    }

    /// Returns the date formatted as `YYYY-MM-DD`.
    pub fn display_date(&self) -> String {
        match (self.date.get(0..4), self.date.get(4..6), self.date.get(6..8)) {
            (Some(y), Some(m), Some(d)) => format!("{}-{}-{}", y, m, d),
            _ => self.date.clone(),
        }
    }

    /// Returns the four-digit year of the record.
    pub fn year(&self) -> Option<&str> {
        self.date.get(0..4)
    }

    /// Returns the `YYYYMM` month key of the record.
    pub fn month_key(&self) -> Option<&str> {
        self.date.get(0..6)
    }

    /// Returns the lower-cased `OHR.<keyword>` of the image URL, or an empty string.
    pub fn url_keyword(&self) -> String {
        let source = self.urlbase.as_deref().unwrap_or(&self.url);
        ohr_keyword_pattern()
            .captures(source)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_lowercase())
            .unwrap_or_default()
    }

    /// Returns the URL of the given resolution variant.
    ///
    /// Records without `urlbase` only have a single resolution-agnostic `url`.
    pub fn resolution_url(&self, resolution: Resolution) -> String {
        match &self.urlbase {
            Some(base) => format!("{}{}", base, resolution.suffix()),
            None => self.url.clone(),
        }
    }

    /// Returns the file name offered when saving the given resolution.
    pub fn download_filename(&self, resolution: Resolution) -> String {
        let name = self
            .urlbase
            .as_deref()
            .and_then(|base| ohr_keyword_pattern().captures(base))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim_end_matches(|c: char| c.is_ascii_digit()))
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_DOWNLOAD_NAME);

        format!("{}_{}_{}.jpg", name, self.date, resolution.download_suffix())
    }
}

/// Removes records whose date was already seen, keeping the first occurrence.
///
/// Returns the surviving records in their original order and the dropped dates.
pub fn dedup_by_date(records: Vec<WallpaperRecord>) -> (Vec<WallpaperRecord>, Vec<String>) {
    let mut seen = HashSet::with_capacity(records.len());
    let mut duplicates = Vec::new();
    let kept = records
        .into_iter()
        .filter(|record| {
            if seen.insert(record.date.clone()) {
                true
            } else {
                duplicates.push(record.date.clone());
                false
            }
        })
        .collect();
    (kept, duplicates)
}

/// Image resolution variants derivable from `urlbase`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "thumb")]
    Thumb,
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "full")]
    Full,
    #[serde(rename = "uhd")]
    Uhd,
    #[serde(rename = "2k")]
    TwoK,
    #[serde(rename = "wallpaper")]
    Wallpaper,
    #[serde(rename = "mobile")]
    Mobile,
}

impl Resolution {
    /// Variants offered as download buttons, in display order.
    pub const DOWNLOADS: [Resolution; 5] = [
        Resolution::Uhd,
        Resolution::Full,
        Resolution::TwoK,
        Resolution::Wallpaper,
        Resolution::Mobile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Thumb => "thumb",
            Resolution::Medium => "medium",
            Resolution::Full => "full",
            Resolution::Uhd => "uhd",
            Resolution::TwoK => "2k",
            Resolution::Wallpaper => "wallpaper",
            Resolution::Mobile => "mobile",
        }
    }

    /// Suffix appended to `urlbase`.
    pub fn suffix(&self) -> &'static str {
        match self {
            Resolution::Thumb => "_1920x1080.jpg&w=557",
            Resolution::Medium => "_800x480.jpg",
            Resolution::Full => "_1920x1080.jpg",
            Resolution::Uhd => "_UHD.jpg",
            Resolution::TwoK => "_UHD.jpg&w=2560&qlt=90",
            Resolution::Wallpaper => "_1920x1200.jpg",
            Resolution::Mobile => "_1080x1920.jpg",
        }
    }

    /// Suffix used in download file names.
    pub fn download_suffix(&self) -> &'static str {
        match self {
            Resolution::Uhd => "UHD",
            Resolution::Full => "1080p",
            Resolution::TwoK => "2K",
            Resolution::Wallpaper => "wallpaper",
            Resolution::Mobile => "mobile",
            Resolution::Thumb | Resolution::Medium => "image",
        }
    }

    /// Button label in the detail view.
    pub fn label(&self) -> &'static str {
        match self {
            Resolution::Thumb => "Thumbnail",
            Resolution::Medium => "Medium",
            Resolution::Full => "HD",
            Resolution::Uhd => "UHD",
            Resolution::TwoK => "2K",
            Resolution::Wallpaper => "Wallpaper",
            Resolution::Mobile => "Mobile",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = GalleryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "thumb" => Ok(Resolution::Thumb),
            "medium" => Ok(Resolution::Medium),
            "full" | "hd" => Ok(Resolution::Full),
            "uhd" => Ok(Resolution::Uhd),
            "2k" => Ok(Resolution::TwoK),
            "wallpaper" => Ok(Resolution::Wallpaper),
            "mobile" => Ok(Resolution::Mobile),
            _ => Err(GalleryError::with_message(
                ErrorCode::InvalidResolution,
                format!("Unknown resolution '{}'", s),
            )),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_record(date: &str, copyright: &str) -> WallpaperRecord {
    WallpaperRecord {
        date: date.to_string(),
        urlbase: Some(format!("/th?id=OHR.Sample{}_EN-US123", date)),
        url: String::new(),
        copyright: copyright.to_string(),
        copyright_keyword: None,
        description: None,
        maplink: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_filename_strips_region_and_digits() {
        let mut rec = sample_record("20251218", "Everest");
        rec.urlbase = Some("https://www.bing.com/th?id=OHR.EverestGlow_EN-IN2485244668".into());
        assert_eq!(
            rec.download_filename(Resolution::Uhd),
            "EverestGlow_20251218_UHD.jpg"
        );
        assert_eq!(
            rec.download_filename(Resolution::Full),
            "EverestGlow_20251218_1080p.jpg"
        );
    }

    #[test]
    fn test_download_filename_defaults_without_keyword() {
        let mut rec = sample_record("20240101", "x");
        rec.urlbase = None;
        rec.url = "https://example.test/photo.jpg".into();
        assert_eq!(
            rec.download_filename(Resolution::Mobile),
            "BingWallpaper_20240101_mobile.jpg"
        );
    }

    #[test]
    fn test_resolution_url_falls_back_to_raw_url() {
        let mut rec = sample_record("20240101", "x");
        assert!(rec.resolution_url(Resolution::Uhd).ends_with("_UHD.jpg"));
        rec.urlbase = None;
        rec.url = "/az/hprichbg/rb/Old_1366x768.jpg".into();
        assert_eq!(rec.resolution_url(Resolution::Uhd), "/az/hprichbg/rb/Old_1366x768.jpg");
        assert_eq!(rec.resolution_url(Resolution::Mobile), "/az/hprichbg/rb/Old_1366x768.jpg");
    }

    #[test]
    fn test_title_prefers_keyword_then_copyright_head() {
        let mut rec = sample_record("20240101", "A View (Getty)");
        assert_eq!(rec.title(), "A View");
        rec.copyright_keyword = Some("Mountains".into());
        assert_eq!(rec.title(), "Mountains");
        rec.copyright_keyword = None;
        rec.copyright = String::new();
        assert_eq!(rec.title(), DEFAULT_TITLE);
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let (kept, dropped) = dedup_by_date(vec![
            sample_record("20240103", "first"),
            sample_record("20240102", "b"),
            sample_record("20240103", "second"),
        ]);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].copyright, "first");
        assert_eq!(kept[1].date, "20240102");
        assert_eq!(dropped, vec!["20240103".to_string()]);
    }

    #[test]
    fn test_record_parses_archive_json() {
        let json = r#"{"date":"20240101","urlbase":"/th?id=OHR.Foo_EN-US1","url":"/th?id=OHR.Foo_EN-US1_1920x1080.jpg",
            "copyright":"Foo (Bar)","copyrightKeyword":"Foo","hsh":"ignored"}"#;
        let rec: WallpaperRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.copyright_keyword.as_deref(), Some("Foo"));
        assert_eq!(rec.display_date(), "2024-01-01");
        assert_eq!(rec.url_keyword(), "foo");
    }

    #[test]
    fn test_resolution_parse() {
        assert_eq!("2k".parse::<Resolution>().unwrap(), Resolution::TwoK);
        assert_eq!("HD".parse::<Resolution>().unwrap(), Resolution::Full);
        assert_eq!(
            "8k".parse::<Resolution>().unwrap_err().code,
            ErrorCode::InvalidResolution
        );
    }
}
