use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

use crate::{metric::DataPoint, window::Window};

pub mod http;

// Runs a query-language string over a time window.
pub trait QueryApi {
    fn query(
        &self,
        query: &str,
        window: Window,
        options: &QueryOptions,
    ) -> Result<QueryResponse, ApiError>;
}

impl<T: QueryApi + ?Sized> QueryApi for &T {
    fn query(
        &self,
        query: &str,
        window: Window,
        options: &QueryOptions,
    ) -> Result<QueryResponse, ApiError> {
        (**self).query(query, window, options)
    }
}

// Failed backend call. Transport failures carry status 0.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{status} {reason}")]
pub struct ApiError {
    pub status: u16,
    pub reason: String,
}

impl ApiError {
    pub fn new(status: u16, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
        }
    }
}

pub const HOURLY: &str = "h";

// Runs always use `QueryOptions::default()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    pub granularity: &'static str,
    // Return series whose only points lie outside the window.
    pub interpolate: bool,
    pub auto_events: bool,
    // Drop points outside [start, end).
    pub strict: bool,
    pub include_obsolete_metrics: bool,
    pub sorted: bool,
    pub cached: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            granularity: HOURLY,
            interpolate: false,
            auto_events: false,
            strict: true,
            include_obsolete_metrics: false,
            sorted: true,
            cached: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    #[serde(default)]
    pub timeseries: Option<Vec<Timeseries>>,
    #[serde(default)]
    pub warnings: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl QueryResponse {
    // Prefers the error message over warnings.
    pub fn detail(&self) -> &str {
        self.error_message
            .as_deref()
            .or(self.warnings.as_deref())
            .unwrap_or("no details from backend")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Timeseries {
    #[serde(default)]
    pub tags: Option<HashMap<String, String>>,
    #[serde(default)]
    pub data: Vec<DataPoint>,
}

impl Timeseries {
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.as_ref()?.get(name).map(String::as_str)
    }
}

#[cfg(test)]
pub mod tests {
    use std::fs;

    use crate::metric::DataPoint;

    use super::{QueryOptions, QueryResponse};

    #[test]
    fn test_default_options() {
        let options = QueryOptions::default();
        assert_eq!(options.granularity, "h");
        assert!(!options.interpolate);
        assert!(!options.auto_events);
        assert!(options.strict);
        assert!(!options.include_obsolete_metrics);
        assert!(options.sorted);
        assert!(options.cached);
    }

    #[test]
    fn test_decode_response() {
        let body = fs::read_to_string("tests/fixtures/query_response.json").unwrap();
        let response: QueryResponse = serde_json::from_str(&body).unwrap();
        let timeseries = response.timeseries.unwrap();
        assert_eq!(timeseries.len(), 2);
        assert_eq!(timeseries[0].tag("customer"), Some("acme"));
        assert_eq!(timeseries[0].tag("cluster"), Some("c1"));
        assert_eq!(
            timeseries[0].data,
            vec![
                DataPoint {
                    timestamp: 1704103200,
                    value: 42.5
                },
                DataPoint {
                    timestamp: 1704106800,
                    value: 40.0
                }
            ]
        );
        assert_eq!(timeseries[1].tag("cluster"), Some("c2"));
    }

    #[test]
    fn test_decode_response_without_timeseries() {
        let body = fs::read_to_string("tests/fixtures/no_timeseries.json").unwrap();
        let response: QueryResponse = serde_json::from_str(&body).unwrap();
        assert!(response.timeseries.is_none());
        assert_eq!(response.detail(), "No metrics matching - cpu.usage");
    }

    #[test]
    fn test_detail_prefers_error_message() {
        let response = QueryResponse {
            warnings: Some("slow query".to_string()),
            error_message: Some("bad query".to_string()),
            ..Default::default()
        };
        assert_eq!(response.detail(), "bad query");
        assert_eq!(
            QueryResponse::default().detail(),
            "no details from backend"
        );
    }
}
