//! Photo detail, download and image probe handlers.

use axum::{
    body::Body,
    http::{header, HeaderValue, Response, StatusCode},
};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Serialize;
use tracing::debug;

use crate::context::RequestContext;
use crate::error::{ErrorCode, GalleryResult};
use crate::models::Resolution;
use crate::pager::{probe_image, ImageStatus};
use crate::router::AppState;

use super::{build_response, common_headers, json_response};

/// GET /api/photos/:date - Detail view of one photo.
pub async fn photo_detail(
    ctx: &RequestContext,
    state: &AppState,
    date: &str,
) -> GalleryResult<Response<Body>> {
    let gallery = state.gallery()?;
    let detail = gallery.detail(date, ctx.orientation(), ctx.country()).await?;
    json_response(ctx, StatusCode::OK, &detail)
}

/// Builds a `Content-Disposition` value that survives non-ASCII names.
pub fn attachment_disposition(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' && c != '\\' { c } else { '_' })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        utf8_percent_encode(filename, NON_ALPHANUMERIC)
    )
}

/// GET /api/photos/:date/download/:resolution - Save one resolution.
pub async fn download_photo(
    ctx: &RequestContext,
    state: &AppState,
    date: &str,
    resolution: &str,
) -> GalleryResult<Response<Body>> {
    let resolution: Resolution = resolution.parse()?;
    let gallery = state.gallery()?;
    let file = gallery.download(date, resolution, ctx.country()).await?;

    let mut headers = common_headers(ctx);
    if let Ok(value) = HeaderValue::from_str(&file.content_type) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&attachment_disposition(&file.filename)) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(file.bytes.len()));

    Ok(build_response(StatusCode::OK, headers, Body::from(file.bytes)))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProbeResult {
    date: String,
    status: ImageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    height: Option<u32>,
}

/// GET /api/photos/:date/probe - Placeholder detection on the card image.
///
/// An image that fails to load or decode is reported as errored.
pub async fn probe_photo(
    ctx: &RequestContext,
    state: &AppState,
    date: &str,
) -> GalleryResult<Response<Body>> {
    let gallery = state.gallery()?;
    let (status, dimensions) = match gallery.thumbnail(date, ctx.country()).await {
        Ok(bytes) => probe_image(&bytes),
        Err(e) if e.code == ErrorCode::PhotoNotFound => return Err(e),
        Err(e) => {
            debug!("Thumbnail of {} unavailable: {}", date, e);
            (ImageStatus::Errored, None)
        }
    };

    let result = ProbeResult {
        date: date.to_string(),
        status,
        width: dimensions.map(|(w, _)| w),
        height: dimensions.map(|(_, h)| h),
    };
    json_response(ctx, StatusCode::OK, &result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_disposition() {
        assert_eq!(
            attachment_disposition("EverestGlow_20251218_UHD.jpg"),
            "attachment; filename=\"EverestGlow_20251218_UHD.jpg\"; \
             filename*=UTF-8''EverestGlow%5F20251218%5FUHD%2Ejpg"
        );
        assert!(attachment_disposition("Fjörd.jpg").starts_with("attachment; filename=\"Fj_rd.jpg\""));
    }
}
