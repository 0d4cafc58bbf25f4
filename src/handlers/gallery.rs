//! Gallery page, region, month and partition handlers.

use axum::{
    body::Body,
    http::{Response, StatusCode},
};
use serde::Serialize;

use crate::context::RequestContext;
use crate::error::GalleryResult;
use crate::models::{Region, REGIONS};
use crate::router::AppState;

use super::{html_response, json_response, render_gallery, render_unavailable};

/// GET / - HTML gallery for the navigation state in the query string.
pub async fn gallery_page(
    ctx: &RequestContext,
    state: &AppState,
) -> GalleryResult<Response<Body>> {
    let Some(gallery) = state.gallery.as_ref() else {
        return Ok(html_response(
            ctx,
            StatusCode::SERVICE_UNAVAILABLE,
            render_unavailable(),
        ));
    };

    let view = gallery
        .navigate(ctx.navigation(&state.config), ctx.orientation())
        .await;
    let months = gallery.months(Some(view.page.region.as_str())).await;
    Ok(html_response(ctx, StatusCode::OK, render_gallery(&view, &months)))
}

/// GET /api/gallery - Same page as JSON.
pub async fn gallery_json(
    ctx: &RequestContext,
    state: &AppState,
) -> GalleryResult<Response<Body>> {
    let gallery = state.gallery()?;
    let view = gallery
        .navigate(ctx.navigation(&state.config), ctx.orientation())
        .await;
    json_response(ctx, StatusCode::OK, &view)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegionList<'a> {
    regions: &'a [Region],
    default_region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    active_region: Option<String>,
}

/// GET /api/regions - Region catalogue with the client's default.
pub async fn list_regions(
    ctx: &RequestContext,
    state: &AppState,
) -> GalleryResult<Response<Body>> {
    let list = RegionList {
        regions: REGIONS,
        default_region: ctx.default_region(&state.config),
        active_region: state.gallery.as_ref().map(|g| g.region()),
    };
    json_response(ctx, StatusCode::OK, &list)
}

/// GET /api/months?country= - Month selector entries.
///
/// Without `country` the active region is used.
pub async fn list_months(
    ctx: &RequestContext,
    state: &AppState,
) -> GalleryResult<Response<Body>> {
    let months = state.gallery()?.months(ctx.country()).await;
    json_response(ctx, StatusCode::OK, &months)
}

/// GET /api/partitions?country= - Load reports of fetched partitions.
pub async fn list_partitions(
    ctx: &RequestContext,
    state: &AppState,
) -> GalleryResult<Response<Body>> {
    let reports = state.gallery()?.reports(ctx.country()).await;
    json_response(ctx, StatusCode::OK, &reports)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Health {
    status: &'static str,
    index_loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_year: Option<i32>,
}

/// GET /health
pub async fn health(ctx: &RequestContext, state: &AppState) -> GalleryResult<Response<Body>> {
    let health = match &state.gallery {
        Some(gallery) => Health {
            status: "ok",
            index_loaded: true,
            current_year: Some(gallery.index().current_year()),
        },
        None => Health {
            status: "degraded",
            index_loaded: false,
            current_year: None,
        },
    };
    json_response(ctx, StatusCode::OK, &health)
}
