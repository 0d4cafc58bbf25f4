//! Search input and search focus handlers.

use axum::{
    body::Body,
    http::{Response, StatusCode},
};
use serde::Serialize;

use crate::context::RequestContext;
use crate::error::GalleryResult;
use crate::router::AppState;

use super::json_response;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchAccepted {
    query: String,
    debounce_ms: u64,
}

/// POST /api/search?q= - One search keystroke; applied once input settles.
pub async fn search_input(
    ctx: &RequestContext,
    state: &AppState,
) -> GalleryResult<Response<Body>> {
    let gallery = state.gallery()?;
    let query = ctx.query_param("q").unwrap_or("").trim().to_string();
    gallery.search_input(&query);

    let accepted = SearchAccepted {
        query,
        debounce_ms: state.config.search_debounce.as_millis() as u64,
    };
    json_response(ctx, StatusCode::ACCEPTED, &accepted)
}

#[derive(Serialize)]
struct PreloadStarted {
    started: bool,
}

/// POST /api/search/focus - Starts loading every year, once.
pub async fn search_focus(
    ctx: &RequestContext,
    state: &AppState,
) -> GalleryResult<Response<Body>> {
    let gallery = state.gallery()?;
    let started = gallery.preload_for_search();
    json_response(ctx, StatusCode::ACCEPTED, &PreloadStarted { started })
}
