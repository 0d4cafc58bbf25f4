//! Navigation state carried in query parameters.

use std::collections::HashMap;
use url::form_urlencoded;

use crate::filter::MonthFilter;
use crate::models::is_known_region;

/// Gallery state addressed by a URL: `country`, `date`, `search`, `page`, `photo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    pub country: String,
    pub date: MonthFilter,
    pub search: String,
    pub page: usize,
    pub photo: Option<String>,
}

impl NavigationState {
    pub fn new(country: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            date: MonthFilter::All,
            search: String::new(),
            page: 1,
            photo: None,
        }
    }

    /// Reads state from query parameters.
    ///
    /// Invalid values fall back silently: an unknown country becomes
    /// `default_region`, a bad date means all months, a bad page means 1.
    pub fn from_query(params: &HashMap<String, String>, default_region: &str) -> Self {
        let country = params
            .get("country")
            .map(|c| c.trim())
            .filter(|c| is_known_region(c))
            .unwrap_or(default_region)
            .to_string();
        let date = params
            .get("date")
            .map(|d| MonthFilter::parse(d))
            .unwrap_or_default();
        let search = params
            .get("search")
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        let page = params
            .get("page")
            .and_then(|p| p.trim().parse::<usize>().ok())
            .filter(|&p| p >= 1)
            .unwrap_or(1);
        let photo = params
            .get("photo")
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        Self {
            country,
            date,
            search,
            page,
            photo,
        }
    }

    /// Serializes the state, omitting defaults.
    pub fn to_query_string(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("country", &self.country);
        if let MonthFilter::Month(month) = &self.date {
            query.append_pair("date", month);
        }
        if !self.search.is_empty() {
            query.append_pair("search", &self.search);
        }
        if self.page > 1 {
            query.append_pair("page", &self.page.to_string());
        }
        if let Some(photo) = &self.photo {
            query.append_pair("photo", photo);
        }
        query.finish()
    }

    /// Link to this state relative to the gallery root.
    pub fn href(&self) -> String {
        format!("/?{}", self.to_query_string())
    }

    pub fn with_page(&self, page: usize) -> Self {
        Self {
            page,
            photo: None,
            ..self.clone()
        }
    }

    pub fn with_photo(&self, date: impl Into<String>) -> Self {
        Self {
            photo: Some(date.into()),
            ..self.clone()
        }
    }

    pub fn without_photo(&self) -> Self {
        Self {
            photo: None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_query_reads_all_fields() {
        let state = NavigationState::from_query(
            &params(&[
                ("country", "bing_ja-JP"),
                ("date", "202401"),
                ("search", " view "),
                ("page", "3"),
                ("photo", "20240105"),
            ]),
            "bing_ROW",
        );
        assert_eq!(state.country, "bing_ja-JP");
        assert_eq!(state.date, MonthFilter::Month("202401".into()));
        assert_eq!(state.search, "view");
        assert_eq!(state.page, 3);
        assert_eq!(state.photo.as_deref(), Some("20240105"));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let state = NavigationState::from_query(
            &params(&[("country", "bing_xx-XX"), ("date", "jan"), ("page", "0")]),
            "bing_en-US",
        );
        assert_eq!(state, NavigationState::new("bing_en-US"));

        let state = NavigationState::from_query(&params(&[("page", "two")]), "bing_ROW");
        assert_eq!(state.page, 1);
    }

    #[test]
    fn test_query_string_omits_defaults() {
        let state = NavigationState::new("bing_ROW");
        assert_eq!(state.to_query_string(), "country=bing_ROW");

        let state = NavigationState {
            search: "a view".into(),
            page: 2,
            date: MonthFilter::Month("202312".into()),
            ..NavigationState::new("bing_ROW")
        };
        assert_eq!(
            state.to_query_string(),
            "country=bing_ROW&date=202312&search=a+view&page=2"
        );
        assert_eq!(state.with_page(1).href(), "/?country=bing_ROW&date=202312&search=a+view");
    }
}
