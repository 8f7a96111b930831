// Blocking client for the Wavefront chart query endpoint.

use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;

use crate::{config::Config, window::Window};

use super::{ApiError, QueryApi, QueryOptions, QueryResponse};

pub const QUERY_PATH: &str = "/api/v2/chart/api";
pub const AUTH_HEADER: &str = "X-AUTH-TOKEN";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub struct HttpQueryApi {
    // A client that failed to build fails every query with status 0.
    client: Result<Client, String>,
    config: Config,
}

impl HttpQueryApi {
    pub fn new(config: Config) -> Self {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| e.to_string());
        Self { client, config }
    }

    pub fn url(&self) -> String {
        format!("{}{}", self.config.server, QUERY_PATH)
    }
}

pub fn query_params(
    query: &str,
    window: Window,
    options: &QueryOptions,
) -> Vec<(&'static str, String)> {
    vec![
        ("q", query.to_string()),
        ("s", window.start().to_string()),
        ("e", window.end().to_string()),
        ("g", options.granularity.to_string()),
        ("i", options.interpolate.to_string()),
        ("autoEvents", options.auto_events.to_string()),
        ("strict", options.strict.to_string()),
        (
            "includeObsoleteMetrics",
            options.include_obsolete_metrics.to_string(),
        ),
        ("sorted", options.sorted.to_string()),
        ("cached", options.cached.to_string()),
    ]
}

impl QueryApi for HttpQueryApi {
    fn query(
        &self,
        query: &str,
        window: Window,
        options: &QueryOptions,
    ) -> Result<QueryResponse, ApiError> {
        debug!(
            "querying {} over [{}, {})",
            query,
            window.start(),
            window.end()
        );
        let client = self
            .client
            .as_ref()
            .map_err(|e| ApiError::new(0, e.clone()))?;
        let response = client
            .get(self.url())
            .header(AUTH_HEADER, &self.config.token)
            .query(&query_params(query, window, options))
            .send()
            .map_err(|e| ApiError::new(0, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::new(
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown Status"),
            ));
        }

        let body = response
            .text()
            .map_err(|e| ApiError::new(0, e.to_string()))?;
        serde_json::from_str(&body)
            .map_err(|e| ApiError::new(0, format!("undecodable response body: {}", e)))
    }
}
