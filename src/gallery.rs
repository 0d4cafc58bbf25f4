//! Gallery controller: owns the archive store and the current view.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard};
use tracing::{debug, info};

use crate::config::Config;
use crate::debounce::Debouncer;
use crate::detail::{self, DetailView, Download, Orientation};
use crate::error::{ErrorCode, GalleryError, GalleryResult};
use crate::filter::{filter, month_options, MonthFilter, MonthOption};
use crate::models::{Resolution, WallpaperRecord};
use crate::navigation::NavigationState;
use crate::pager::{
    build_cards, page_buttons, paginate, total_pages, FirstRowsVisible, PageView,
    VisibilityWatcher,
};
use crate::storage::{
    fetcher_for_base, ArchiveIndex, Fetcher, HttpFetcher, MirroredSource, PartitionCache,
    PartitionReport, VirtualDataset,
};

/// Where archive files and images are read from.
#[derive(Clone)]
pub struct GallerySources {
    /// Index and partition files.
    pub archive: MirroredSource,
    /// Image bytes, addressed by absolute URL.
    pub images: Arc<dyn Fetcher>,
}

impl GallerySources {
    /// Builds HTTP or filesystem sources from configuration.
    pub fn from_config(config: &Config) -> GalleryResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("wallpaper-archive/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let primary = fetcher_for_base(&config.data_base, &client);
        let fallback = config
            .fallback_base
            .as_deref()
            .map(|base| fetcher_for_base(base, &client));
        Ok(Self {
            archive: MirroredSource::new(primary, fallback),
            images: Arc::new(HttpFetcher::absolute(client)),
        })
    }
}

/// Current view selection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub region: String,
    pub month: String,
    pub query: String,
    pub page: usize,
    /// Set while a non-empty search is active; all years get loaded.
    pub search_mode: bool,
}

/// A navigated page, with the detail view when a photo was requested.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryView {
    #[serde(skip)]
    pub state: NavigationState,
    #[serde(flatten)]
    pub page: PageView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<DetailView>,
}

pub struct Gallery {
    config: Arc<Config>,
    index: Arc<ArchiveIndex>,
    cache: Arc<PartitionCache>,
    dataset: VirtualDataset,
    images: Arc<dyn Fetcher>,
    watcher: Arc<dyn VisibilityWatcher>,
    view: Mutex<ViewState>,
    /// Held for the whole of a request that reads the active region.
    region_lock: AsyncMutex<()>,
    debouncer: Debouncer,
    preload_started: AtomicBool,
}

impl Gallery {
    /// Loads the index and the current year of `region`.
    ///
    /// Fails only when the index cannot be loaded.
    pub async fn open(
        config: Arc<Config>,
        sources: GallerySources,
        region: &str,
    ) -> GalleryResult<Self> {
        let index = Arc::new(
            ArchiveIndex::load(&sources.archive, config.layout, &config.fallback_region).await?,
        );
        let cache = Arc::new(PartitionCache::new(
            config.clone(),
            index.clone(),
            sources.archive,
        ));
        let dataset = VirtualDataset::new(index.clone(), cache.clone());

        let gallery = Self {
            watcher: Arc::new(FirstRowsVisible {
                count: config.eager_cards,
            }),
            debouncer: Debouncer::new(config.search_debounce),
            view: Mutex::new(ViewState {
                region: region.to_string(),
                month: MonthFilter::All.to_string(),
                query: String::new(),
                page: 1,
                search_mode: false,
            }),
            region_lock: AsyncMutex::new(()),
            preload_started: AtomicBool::new(false),
            images: sources.images,
            config,
            index,
            cache,
            dataset,
        };
        gallery.load_current_year(region).await;
        Ok(gallery)
    }

    /// Replaces the collaborator deciding which cards load eagerly.
    pub fn with_visibility(mut self, watcher: Arc<dyn VisibilityWatcher>) -> Self {
        self.watcher = watcher;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn index(&self) -> &ArchiveIndex {
        &self.index
    }

    pub fn view(&self) -> ViewState {
        self.view.lock().clone()
    }

    pub fn region(&self) -> String {
        self.view.lock().region.clone()
    }

    async fn load_current_year(&self, region: &str) {
        self.cache.fetch(self.index.current_year(), region).await;
    }

    /// Makes `region` active, dropping every cached partition.
    pub async fn switch_region(&self, region: &str) {
        let _guard = self.region_lock.lock().await;
        self.activate(region).await;
    }

    async fn activate(&self, region: &str) {
        info!("Switching region to {}", region);
        {
            let mut view = self.view.lock();
            view.region = region.to_string();
            view.page = 1;
        }
        self.cache.invalidate();
        self.load_current_year(region).await;
    }

    /// Takes the region lock, first switching to `country` when it differs
    /// from the active region. Returns the region the caller must use.
    async fn enter(&self, country: Option<&str>) -> (AsyncMutexGuard<'_, ()>, String) {
        let guard = self.region_lock.lock().await;
        let active = self.region();
        match country {
            Some(country) if country != active => {
                self.activate(country).await;
                (guard, country.to_string())
            }
            _ => (guard, active),
        }
    }

    /// Computes one page for the active region.
    ///
    /// Loads whatever the selection needs first: the years a virtual page
    /// spans, the year of a selected month, or every year in search mode.
    pub async fn show(&self, month: &MonthFilter, query: &str, page: usize) -> PageView {
        let (_guard, region) = self.enter(None).await;
        let search_mode = self.view.lock().search_mode;
        self.page_for(&region, month, query, page, search_mode).await
    }

    async fn page_for(
        &self,
        region: &str,
        month: &MonthFilter,
        query: &str,
        page: usize,
        search_mode: bool,
    ) -> PageView {
        let query = query.trim();
        let page = page.max(1);
        let per_page = self.config.items_per_page;

        let virtual_mode = !search_mode && month.is_all() && query.is_empty();
        if virtual_mode {
            let needed = self
                .dataset
                .compute_offsets(region)
                .years_needed_for_page(page, per_page);
            if let Some(&oldest) = needed.iter().min() {
                self.dataset.ensure_loaded_through(oldest, region).await;
            }
        } else if let Some(year) = month.year() {
            if self.index.has_year(year) && !self.cache.is_loaded(year, region) {
                self.cache.fetch(year, region).await;
            }
        }
        if search_mode && !self.dataset.is_fully_loaded(region) {
            self.load_all_years(region).await;
        }

        // Loading patches index counts, so offsets are taken afterwards.
        let records = self.dataset.rebuild(region);
        let offsets = self.dataset.compute_offsets(region);
        let filtered = filter(&records, month, query);
        let total = total_pages(virtual_mode, offsets.total_item_count, filtered.len(), per_page);
        let slice = paginate(&filtered, page, per_page);
        let cards = build_cards(slice, page, &self.config, self.watcher.as_ref());
        debug!(
            "Page {}/{} of {} ({} matched, {} cards)",
            page,
            total,
            region,
            filtered.len(),
            cards.len()
        );

        {
            let mut view = self.view.lock();
            view.month = month.to_string();
            view.query = query.to_string();
            view.page = page;
        }

        PageView {
            month: month.to_string(),
            query: query.to_string(),
            page,
            total_pages: total,
            matched: filtered.len(),
            search_mode,
            fully_loaded: self.dataset.is_fully_loaded(region),
            buttons: page_buttons(page, total),
            cards,
            region: region.to_string(),
        }
    }

    /// Applies a full navigation state and renders it.
    ///
    /// The region lock is held throughout, so the page and the detail view
    /// both belong to `state.country`. An unknown or unloadable `photo`
    /// leaves the detail view closed.
    pub async fn navigate(&self, state: NavigationState, orientation: Orientation) -> GalleryView {
        let (_guard, region) = self.enter(Some(state.country.as_str())).await;
        let search_mode = !state.search.is_empty();
        self.view.lock().search_mode = search_mode;

        let page = self
            .page_for(&region, &state.date, &state.search, state.page, search_mode)
            .await;
        let detail = match &state.photo {
            Some(date) => self
                .find_record_in(&region, date)
                .await
                .map(|record| DetailView::open(&record, orientation, &self.config)),
            None => None,
        };
        GalleryView {
            state,
            page,
            detail,
        }
    }

    /// Finds the record for `date` in `region`, loading its year if needed.
    async fn find_record_in(&self, region: &str, date: &str) -> Option<WallpaperRecord> {
        let year: i32 = date.get(0..4)?.parse().ok()?;
        if !self.index.has_year(year) {
            return None;
        }
        self.cache.fetch(year, region).await;
        self.dataset.find(region, date)
    }

    /// Looks up `date` under `country`, or the active region when absent.
    async fn record(&self, date: &str, country: Option<&str>) -> GalleryResult<WallpaperRecord> {
        let (_guard, region) = self.enter(country).await;
        self.find_record_in(&region, date)
            .await
            .ok_or_else(|| photo_not_found(date))
    }

    pub async fn detail(
        &self,
        date: &str,
        orientation: Orientation,
        country: Option<&str>,
    ) -> GalleryResult<DetailView> {
        let record = self.record(date, country).await?;
        Ok(DetailView::open(&record, orientation, &self.config))
    }

    pub async fn download(
        &self,
        date: &str,
        resolution: Resolution,
        country: Option<&str>,
    ) -> GalleryResult<Download> {
        let record = self.record(date, country).await?;
        detail::download(self.images.as_ref(), &self.config, &record, resolution).await
    }

    /// Thumbnail bytes of a card, for placeholder probing.
    pub async fn thumbnail(&self, date: &str, country: Option<&str>) -> GalleryResult<bytes::Bytes> {
        let record = self.record(date, country).await?;
        let url = self
            .config
            .absolute_image_url(&record.resolution_url(Resolution::Thumb));
        self.images.get(&url).await
    }

    /// Month selector entries for `country`, or the active region.
    pub async fn months(&self, country: Option<&str>) -> Vec<MonthOption> {
        let (_guard, region) = self.enter(country).await;
        month_options(&self.dataset.rebuild(&region), &self.index, &self.cache, &region)
    }

    /// Load reports of the partitions fetched for `country`, or the active region.
    pub async fn reports(&self, country: Option<&str>) -> Vec<PartitionReport> {
        let (_guard, region) = self.enter(country).await;
        self.cache.reports(&region)
    }

    /// Records a search keystroke; the query applies once input settles.
    pub fn search_input(self: &Arc<Self>, query: &str) {
        let gallery = Arc::clone(self);
        let query = query.trim().to_string();
        self.debouncer.schedule(async move {
            gallery.apply_search(&query).await;
        });
    }

    /// Makes `query` current, entering search mode when it is non-empty.
    pub async fn apply_search(&self, query: &str) {
        let query = query.trim();
        let region = {
            let mut view = self.view.lock();
            view.query = query.to_string();
            view.page = 1;
            view.search_mode = !query.is_empty();
            view.region.clone()
        };
        if !query.is_empty() {
            info!("Search for '{}' loads the whole archive of {}", query, region);
            self.load_all_years(&region).await;
        }
    }

    /// Starts loading every year in the background, once per gallery.
    ///
    /// Returns false if a preload was already started.
    pub fn preload_for_search(self: &Arc<Self>) -> bool {
        if self.preload_started.swap(true, Ordering::SeqCst) {
            return false;
        }
        let gallery = Arc::clone(self);
        tokio::spawn(async move {
            let region = gallery.region();
            info!("Preloading all years of {} for search", region);
            gallery.load_all_years(&region).await;
        });
        true
    }

    async fn load_all_years(&self, region: &str) {
        self.dataset
            .load_all_years_progressively(region, |merged| {
                debug!("Progressive load of {}: {} records", region, merged.len());
            })
            .await;
    }
}

fn photo_not_found(date: &str) -> GalleryError {
    GalleryError::with_message(
        ErrorCode::PhotoNotFound,
        format!("No photo exists for {}", date),
    )
}
