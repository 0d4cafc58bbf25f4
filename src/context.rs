//! Request context extraction and handling.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::HeaderMap, request::Parts, Method, Uri},
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::convert::Infallible;
use uuid::Uuid;

use crate::config::Config;
use crate::detail::Orientation;
use crate::models::{is_known_region, region_for_language};
use crate::navigation::NavigationState;

/// Extracted request context containing all relevant information.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique request ID.
    pub request_id: String,
    /// HTTP method.
    pub method: Method,
    /// Request URI.
    pub uri: Uri,
    /// Query parameters; later duplicates win.
    pub query_params: HashMap<String, String>,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request timestamp.
    pub timestamp: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context from request parts.
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        let query_params = uri
            .query()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        Self {
            request_id: Uuid::new_v4().to_string(),
            method,
            uri,
            query_params,
            headers,
            timestamp: Utc::now(),
        }
    }

    /// Returns the value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(|s| s.as_str())
    }

    /// Returns the value of a header.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the client's preferred language tag from `Accept-Language`.
    pub fn language(&self) -> Option<&str> {
        self.header("accept-language")?
            .split(',')
            .next()
            .map(|tag| tag.split(';').next().unwrap_or("").trim())
            .filter(|tag| !tag.is_empty() && *tag != "*")
    }

    /// Region used when the request names none.
    pub fn default_region(&self, config: &Config) -> String {
        match self.language() {
            Some(lang) => region_for_language(lang, &config.default_region),
            None => config.default_region.clone(),
        }
    }

    /// The `country` parameter, if it names a known region.
    pub fn country(&self) -> Option<&str> {
        self.query_param("country").filter(|c| is_known_region(c))
    }

    /// Navigation state addressed by the query string.
    pub fn navigation(&self, config: &Config) -> NavigationState {
        NavigationState::from_query(&self.query_params, &self.default_region(config))
    }

    /// Viewport orientation reported by the client.
    pub fn orientation(&self) -> Orientation {
        self.query_param("orientation")
            .map(Orientation::parse)
            .unwrap_or_default()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::new(
            parts.method.clone(),
            parts.uri.clone(),
            parts.headers.clone(),
        ))
    }
}
