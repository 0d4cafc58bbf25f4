//! Request routing for the gallery service.

use axum::{
    body::Body,
    extract::{Path, State},
    http::Response,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::config::Config;
use crate::context::RequestContext;
use crate::error::{ErrorCode, GalleryError, GalleryResult};
use crate::gallery::Gallery;
use crate::handlers;

/// Application state shared between handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Absent when the archive index could not be loaded.
    pub gallery: Option<Arc<Gallery>>,
}

impl AppState {
    /// Returns the gallery, or `IndexUnavailable` if it never opened.
    pub fn gallery(&self) -> GalleryResult<&Arc<Gallery>> {
        self.gallery
            .as_ref()
            .ok_or_else(|| GalleryError::new(ErrorCode::IndexUnavailable))
    }
}

/// Creates the main router for the gallery service.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(gallery_page_handler))
        .route("/health", get(health_handler))
        .route("/api/gallery", get(gallery_json_handler))
        .route("/api/regions", get(regions_handler))
        .route("/api/months", get(months_handler))
        .route("/api/partitions", get(partitions_handler))
        .route("/api/photos/:date", get(photo_handler))
        .route("/api/photos/:date/probe", get(probe_handler))
        .route(
            "/api/photos/:date/download/:resolution",
            get(download_handler),
        )
        .route("/api/search", post(search_handler))
        .route("/api/search/focus", post(search_focus_handler))
        .with_state(state)
}

/// Attaches the request ID to errors and converts the result.
fn finish(ctx: &RequestContext, result: GalleryResult<Response<Body>>) -> Response<Body> {
    match result {
        Ok(response) => response,
        Err(e) => e.with_request_id(&ctx.request_id).into_response(),
    }
}

async fn gallery_page_handler(State(state): State<AppState>, ctx: RequestContext) -> Response<Body> {
    let result = handlers::gallery_page(&ctx, &state).await;
    finish(&ctx, result)
}

async fn gallery_json_handler(State(state): State<AppState>, ctx: RequestContext) -> Response<Body> {
    let result = handlers::gallery_json(&ctx, &state).await;
    finish(&ctx, result)
}

async fn health_handler(State(state): State<AppState>, ctx: RequestContext) -> Response<Body> {
    let result = handlers::health(&ctx, &state).await;
    finish(&ctx, result)
}

async fn regions_handler(State(state): State<AppState>, ctx: RequestContext) -> Response<Body> {
    let result = handlers::list_regions(&ctx, &state).await;
    finish(&ctx, result)
}

async fn months_handler(State(state): State<AppState>, ctx: RequestContext) -> Response<Body> {
    let result = handlers::list_months(&ctx, &state).await;
    finish(&ctx, result)
}

async fn partitions_handler(State(state): State<AppState>, ctx: RequestContext) -> Response<Body> {
    let result = handlers::list_partitions(&ctx, &state).await;
    finish(&ctx, result)
}

async fn photo_handler(
    State(state): State<AppState>,
    Path(date): Path<String>,
    ctx: RequestContext,
) -> Response<Body> {
    let result = handlers::photo_detail(&ctx, &state, &date).await;
    finish(&ctx, result)
}

async fn probe_handler(
    State(state): State<AppState>,
    Path(date): Path<String>,
    ctx: RequestContext,
) -> Response<Body> {
    let result = handlers::probe_photo(&ctx, &state, &date).await;
    finish(&ctx, result)
}

async fn download_handler(
    State(state): State<AppState>,
    Path((date, resolution)): Path<(String, String)>,
    ctx: RequestContext,
) -> Response<Body> {
    let result = handlers::download_photo(&ctx, &state, &date, &resolution).await;
    finish(&ctx, result)
}

async fn search_handler(State(state): State<AppState>, ctx: RequestContext) -> Response<Body> {
    let result = handlers::search_input(&ctx, &state).await;
    finish(&ctx, result)
}

async fn search_focus_handler(State(state): State<AppState>, ctx: RequestContext) -> Response<Body> {
    let result = handlers::search_focus(&ctx, &state).await;
    finish(&ctx, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn unavailable() -> Router {
        create_router(AppState {
            config: Arc::new(Config::default()),
            gallery: None,
        })
    }

    #[tokio::test]
    async fn test_api_answers_503_without_index() {
        let response = unavailable()
            .oneshot(Request::get("/api/gallery").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_regions_available_without_index() {
        let response = unavailable()
            .oneshot(
                Request::get("/api/regions")
                    .header("accept-language", "fr-CA")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invalid_resolution_is_rejected_first() {
        let response = unavailable()
            .oneshot(
                Request::get("/api/photos/20240101/download/8k")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
