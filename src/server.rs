//! HTTP server for the wallpaper gallery.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::gallery::{Gallery, GallerySources};
use crate::router::{create_router, AppState};

/// Gallery server.
pub struct GalleryServer {
    config: Arc<Config>,
    sources: Option<GallerySources>,
}

impl GalleryServer {
    /// Creates a server reading the archive locations in `config`.
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            sources: None,
        }
    }

    /// Creates a server with custom archive and image sources.
    pub fn with_sources(config: Config, sources: GallerySources) -> Self {
        Self {
            config: Arc::new(config),
            sources: Some(sources),
        }
    }

    /// Opens the gallery; an unreachable index leaves it absent.
    async fn open_gallery(&self) -> Result<Option<Arc<Gallery>>, Box<dyn std::error::Error + Send + Sync>> {
        let sources = match &self.sources {
            Some(sources) => sources.clone(),
            None => GallerySources::from_config(&self.config)?,
        };

        let region = self.config.default_region.clone();
        match Gallery::open(self.config.clone(), sources, &region).await {
            Ok(gallery) => Ok(Some(Arc::new(gallery))),
            Err(e) => {
                error!("Gallery disabled: {}", e);
                Ok(None)
            }
        }
    }

    /// Runs the server.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr: SocketAddr = self.config.bind_address().parse()?;

        let state = AppState {
            config: self.config.clone(),
            gallery: self.open_gallery().await?,
        };

        // Create router with middleware
        let app = create_router(state).layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any)
                        .expose_headers(Any),
                ),
        );

        info!("Wallpaper gallery is starting at http://{}", addr);
        info!(
            "Archive: {} (fallback: {}), layout {:?}",
            self.config.data_base,
            self.config.fallback_base.as_deref().unwrap_or("none"),
            self.config.layout
        );

        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Returns the bind address.
    pub fn bind_address(&self) -> String {
        self.config.bind_address()
    }

    /// Returns the base URL of the gallery.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.bind_address())
    }
}

/// Builder for creating a gallery server.
pub struct GalleryServerBuilder {
    config: Config,
    sources: Option<GallerySources>,
}

impl GalleryServerBuilder {
    /// Creates a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            sources: None,
        }
    }

    /// Sets the configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Sets the host address.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Sets the port.
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets the number of cards per page.
    pub fn items_per_page(mut self, items_per_page: usize) -> Self {
        self.config.items_per_page = items_per_page.max(1);
        self
    }

    /// Sets the archive and image sources.
    pub fn sources(mut self, sources: GallerySources) -> Self {
        self.sources = Some(sources);
        self
    }

    /// Builds the server.
    pub fn build(self) -> GalleryServer {
        match self.sources {
            Some(sources) => GalleryServer::with_sources(self.config, sources),
            None => GalleryServer::new(self.config),
        }
    }
}

impl Default for GalleryServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
