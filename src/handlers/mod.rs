//! Request handlers for the gallery service.

mod gallery;
mod photo;
mod render;
mod search;

pub use gallery::*;
pub use photo::*;
pub use render::*;
pub use search::*;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Response, StatusCode};
use serde::Serialize;

use crate::context::RequestContext;
use crate::error::{ErrorCode, GalleryError, GalleryResult};

/// Server identification sent with every response.
pub const SERVER_NAME: &str = concat!("wallpaper-archive/", env!("CARGO_PKG_VERSION"));

/// Creates headers common to every gallery response.
pub fn common_headers(ctx: &RequestContext) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&ctx.request_id) {
        headers.insert("x-request-id", value);
    }
    headers.insert(header::SERVER, HeaderValue::from_static(SERVER_NAME));
    headers
}

/// Builds a response with the given status, headers, and body.
pub fn build_response(status: StatusCode, headers: HeaderMap, body: Body) -> Response<Body> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Serializes `value` as a JSON response.
pub fn json_response<T: Serialize>(
    ctx: &RequestContext,
    status: StatusCode,
    value: &T,
) -> GalleryResult<Response<Body>> {
    let body = serde_json::to_vec(value)
        .map_err(|e| GalleryError::with_message(ErrorCode::InternalError, e.to_string()))?;
    let mut headers = common_headers(ctx);
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    Ok(build_response(status, headers, Body::from(body)))
}

/// Wraps rendered markup in an HTML response.
pub fn html_response(ctx: &RequestContext, status: StatusCode, html: String) -> Response<Body> {
    let mut headers = common_headers(ctx);
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    build_response(status, headers, Body::from(html))
}
