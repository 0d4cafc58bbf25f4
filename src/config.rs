//! Server configuration.

use clap::{Parser, ValueEnum};
use std::time::Duration;

/// Default port for the gallery service.
pub const DEFAULT_PORT: u16 = 8031;

/// Default primary location of the archive data.
pub const DEFAULT_DATA_BASE: &str = "bing/";

/// Default mirror used when the primary location fails.
pub const DEFAULT_FALLBACK_BASE: &str =
    "https://testingcf.jsdelivr.net/gh/zigou23/Bing-Daily-Wallpaper@main/bing/";

/// Default number of cards per page.
pub const DEFAULT_ITEMS_PER_PAGE: usize = 31;

/// Region shown when nothing else applies.
pub const DEFAULT_REGION: &str = "bing_ROW";

/// Region used when a year has no data for the requested one.
pub const DEFAULT_FALLBACK_REGION: &str = "bing_en-US";

/// Host prepended to image URLs that start with `/`.
pub const DEFAULT_IMAGE_HOST: &str = "https://www.bing.com";

/// Quiet period after the last search keystroke.
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 1000;

/// Name of the index file in yearly layout.
pub const INDEX_FILE: &str = "data_index.json";

/// How partition files are laid out under the data base.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartitionLayout {
    /// `<base><year>/<region>.json` with a `data_index.json`.
    #[default]
    Yearly,
    /// `<base><region>.json`, no index file.
    Flat,
}

/// Command-line arguments for the server.
#[derive(Parser, Debug, Clone)]
#[command(name = "wallpaper-archive")]
#[command(about = "Daily wallpaper archive gallery")]
#[command(version)]
pub struct Args {
    /// Host address to bind to.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port for the gallery service.
    #[arg(long, short = 'p', default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Primary archive location (directory or http(s) base URL).
    #[arg(long, default_value = DEFAULT_DATA_BASE)]
    pub data_base: String,

    /// Mirror tried when the primary location fails.
    #[arg(long, default_value = DEFAULT_FALLBACK_BASE)]
    pub fallback_base: String,

    /// Disable the fallback mirror.
    #[arg(long)]
    pub no_fallback: bool,

    /// Partition layout of the archive.
    #[arg(long, value_enum, default_value_t = PartitionLayout::Yearly)]
    pub layout: PartitionLayout,

    /// Number of cards per page.
    #[arg(long, default_value_t = DEFAULT_ITEMS_PER_PAGE)]
    pub items_per_page: usize,

    /// Disable the large featured card on the first page.
    #[arg(long)]
    pub no_featured: bool,

    /// Region used when a request names none.
    #[arg(long, default_value = DEFAULT_REGION)]
    pub default_region: String,

    /// Region substituted for years lacking the requested one.
    #[arg(long, default_value = DEFAULT_FALLBACK_REGION)]
    pub fallback_region: String,

    /// Host used to absolutize relative image URLs.
    #[arg(long, default_value = DEFAULT_IMAGE_HOST)]
    pub image_host: String,

    /// Search debounce in milliseconds.
    #[arg(long, default_value_t = DEFAULT_SEARCH_DEBOUNCE_MS)]
    pub search_debounce_ms: u64,

    /// Number of cards whose images load eagerly.
    #[arg(long, default_value_t = 6)]
    pub eager_cards: usize,

    /// Enable debug logging.
    #[arg(long, short = 'd')]
    pub debug: bool,

    /// Enable silent mode (minimal logging).
    #[arg(long, short = 's')]
    pub silent: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            data_base: DEFAULT_DATA_BASE.to_string(),
            fallback_base: DEFAULT_FALLBACK_BASE.to_string(),
            no_fallback: false,
            layout: PartitionLayout::Yearly,
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            no_featured: false,
            default_region: DEFAULT_REGION.to_string(),
            fallback_region: DEFAULT_FALLBACK_REGION.to_string(),
            image_host: DEFAULT_IMAGE_HOST.to_string(),
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
            eager_cards: 6,
            debug: false,
            silent: false,
        }
    }
}

/// Gallery configuration derived from command-line arguments.
#[derive(Debug, Clone)]
pub struct Config {
    /// Host address to bind to.
    pub host: String,
    /// Port for the gallery service.
    pub port: u16,
    /// Primary archive location.
    pub data_base: String,
    /// Mirror location, if any.
    pub fallback_base: Option<String>,
    pub layout: PartitionLayout,
    pub items_per_page: usize,
    /// Show the first card of page 1 as a large featured card.
    pub enable_featured: bool,
    pub default_region: String,
    pub fallback_region: String,
    pub image_host: String,
    pub search_debounce: Duration,
    pub eager_cards: usize,
    /// Enable debug logging.
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            data_base: DEFAULT_DATA_BASE.to_string(),
            fallback_base: Some(DEFAULT_FALLBACK_BASE.to_string()),
            layout: PartitionLayout::Yearly,
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            enable_featured: true,
            default_region: DEFAULT_REGION.to_string(),
            fallback_region: DEFAULT_FALLBACK_REGION.to_string(),
            image_host: DEFAULT_IMAGE_HOST.to_string(),
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
            eager_cards: 6,
            debug: false,
        }
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        let fallback_base = if args.no_fallback || args.fallback_base.is_empty() {
            None
        } else {
            Some(args.fallback_base)
        };
        Self {
            host: args.host,
            port: args.port,
            data_base: args.data_base,
            fallback_base,
            layout: args.layout,
            items_per_page: args.items_per_page.max(1),
            enable_featured: !args.no_featured,
            default_region: args.default_region,
            fallback_region: args.fallback_region,
            image_host: args.image_host,
            search_debounce: Duration::from_millis(args.search_debounce_ms),
            eager_cards: args.eager_cards,
            debug: args.debug,
        }
    }
}

impl Config {
    /// Returns the bind address for the gallery service.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the relative path of a partition file.
    pub fn partition_path(&self, year: i32, region: &str) -> String {
        match self.layout {
            PartitionLayout::Yearly => format!("{}/{}.json", year, region),
            PartitionLayout::Flat => format!("{}.json", region),
        }
    }

    /// Makes an image URL absolute against the image host.
    pub fn absolute_image_url(&self, url: &str) -> String {
        if url.starts_with('/') {
            format!("{}{}", self.image_host.trim_end_matches('/'), url)
        } else {
            url.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_paths_follow_layout() {
        let mut config = Config::default();
        assert_eq!(config.partition_path(2024, "bing_ROW"), "2024/bing_ROW.json");
        config.layout = PartitionLayout::Flat;
        assert_eq!(config.partition_path(2024, "bing_ROW"), "bing_ROW.json");
    }

    #[test]
    fn test_no_fallback_flag_clears_mirror() {
        let args = Args {
            no_fallback: true,
            ..Args::default()
        };
        assert!(Config::from(args).fallback_base.is_none());
    }

    #[test]
    fn test_relative_image_urls_are_absolutized() {
        let config = Config::default();
        assert_eq!(
            config.absolute_image_url("/th?id=OHR.Foo_UHD.jpg"),
            "https://www.bing.com/th?id=OHR.Foo_UHD.jpg"
        );
        assert_eq!(config.absolute_image_url("https://x.test/a.jpg"), "https://x.test/a.jpg");
    }
}
