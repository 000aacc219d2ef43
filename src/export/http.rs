//! HTTP transport for the batching exporter.
//!
//! Serializes a batch of spans to a JSON array and POSTs it to the
//! collector endpoint in a single request.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderValue, CONTENT_TYPE};

use crate::error::TraceError;
use crate::trace::span::SpanRecord;

use super::batch::BatchSink;

/// Fixed per-request timeout for collector POSTs.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Header carrying the collector API key.
pub const API_KEY_HEADER: &str = "X-Aeonis-API-Key";

/// Sends span batches to an Aeonis collector endpoint.
pub struct HttpSink {
    endpoint_url: String,
    api_key: Option<HeaderValue>,
    client: Client,
}

impl HttpSink {
    /// Build a sink for `endpoint_url` (e.g. `https://host/v1/traces`).
    ///
    /// An API key that is not a valid header value, or a client that
    /// cannot be constructed, is a configuration error and fatal at
    /// startup.
    pub fn new(endpoint_url: &str, api_key: Option<&str>) -> Result<Self, TraceError> {
        let api_key = api_key
            .map(|key| {
                HeaderValue::from_str(key).map_err(|_| {
                    TraceError::Configuration("API key is not a valid header value".to_string())
                })
            })
            .transpose()?;

        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            endpoint_url: endpoint_url.to_string(),
            api_key,
            client,
        })
    }
}

impl BatchSink for HttpSink {
    fn send_batch(&mut self, batch: &[SpanRecord]) -> Result<(), TraceError> {
        let body = serde_json::to_vec(batch)?;

        let mut request = self
            .client
            .post(&self.endpoint_url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key.clone());
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(TraceError::Collector(status));
        }
        Ok(())
    }
}
