//! Transport boundary to the report backend.
//!
//! Every response is wrapped in an envelope `{code, msg, data}` where
//! `code == 0` is success. Anything else becomes an [`ApiError`].

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::future::Future;
use thiserror::Error;
use tracing::debug;

use crate::types::{
    ConfirmRequest, EditRequest, Envelope, GenerationRequest, Period, Report, ReportBody,
    ReportListBody,
};

/// Message used when the failure carries no usable envelope
pub const NETWORK_ERROR_MSG: &str = "network error, please try again later";

/// Message used when an error envelope has an empty `msg`
pub const REQUEST_FAILED_MSG: &str = "request failed";

/// Application error codes returned by the backend
pub mod codes {
    pub const SUCCESS: i64 = 0;
    pub const BAD_REQUEST: i64 = 400;
    pub const INTERNAL: i64 = 500;
    pub const INVALID_DATE: i64 = 2007;
    pub const REPORT_NOT_EXIST: i64 = 3001;
    pub const INVALID_REPORT_PERIOD: i64 = 3005;
    pub const INVALID_REPORT_TEMPLATE: i64 = 3006;
    pub const REPORT_NOT_READY: i64 = 3007;
}

/// A failed request: transport failure, HTTP error or non-zero envelope code
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("request failed ({code}): {msg}")]
pub struct ApiError {
    pub code: i64,
    pub msg: String,
}

impl ApiError {
    pub fn new(code: i64, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
        }
    }

    pub fn network() -> Self {
        Self::new(codes::INTERNAL, NETWORK_ERROR_MSG)
    }
}

/// Operations the polling controller needs from the backend
pub trait ReportApi: Send + Sync {
    /// Start a generation, returning the id of the (possibly reused) report
    fn create_report(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<String, ApiError>> + Send;

    fn get_report(&self, id: &str) -> impl Future<Output = Result<Report, ApiError>> + Send;

    fn edit_report(
        &self,
        id: &str,
        content: &str,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn confirm_report(&self, id: &str) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// Decode an envelope response body.
///
/// Non-success HTTP statuses take code and message from the envelope when
/// one is present, falling back to a generic network error otherwise.
pub fn decode_envelope<T: DeserializeOwned>(status: u16, body: &[u8]) -> Result<Option<T>, ApiError> {
    let envelope: Option<Envelope<T>> = serde_json::from_slice(body).ok();
    let success = (200..300).contains(&status);

    match envelope {
        Some(env) if success && env.code == codes::SUCCESS => Ok(env.data),
        Some(env) => {
            let code = if env.code == codes::SUCCESS {
                codes::INTERNAL
            } else {
                env.code
            };
            let msg = if !env.msg.is_empty() {
                env.msg
            } else if success {
                REQUEST_FAILED_MSG.to_string()
            } else {
                NETWORK_ERROR_MSG.to_string()
            };
            Err(ApiError::new(code, msg))
        }
        None => Err(ApiError::network()),
    }
}

fn require<T>(data: Option<T>, what: &str) -> Result<T, ApiError> {
    data.ok_or_else(|| ApiError::new(codes::INTERNAL, format!("response is missing {what}")))
}

/// reqwest-backed client for the report routes
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: Client,
    base_url: String,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Option<T>, ApiError> {
        let response = request.send().await.map_err(|e| {
            debug!(error = %e, "Request did not complete");
            ApiError::network()
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            debug!(error = %e, "Failed to read response body");
            ApiError::network()
        })?;

        decode_envelope(status.as_u16(), &body)
    }

    /// List reports of one period
    pub async fn list_reports(&self, period: Period) -> Result<Vec<Report>, ApiError> {
        debug!(period = %period, "Listing reports");
        let request = self
            .http
            .get(self.url("reports"))
            .query(&[("period_type", period.as_str())]);
        let body: Option<ReportListBody> = self.send(request).await?;
        Ok(body.map(|b| b.report_list).unwrap_or_default())
    }
}

impl ReportApi for HttpClient {
    async fn create_report(&self, request: &GenerationRequest) -> Result<String, ApiError> {
        debug!(key = %request.key(), "Requesting report generation");
        let builder = self.http.post(self.url("reports/generate")).json(request);
        let id: Option<String> = self.send(builder).await?;
        require(id, "report id")
    }

    async fn get_report(&self, id: &str) -> Result<Report, ApiError> {
        let builder = self.http.get(self.url(&format!("reports/{id}")));
        let body: Option<ReportBody> = self.send(builder).await?;
        require(body, "report").map(|b| b.report)
    }

    async fn edit_report(&self, id: &str, content: &str) -> Result<(), ApiError> {
        debug!(id = %id, bytes = content.len(), "Saving report content");
        let body = EditRequest {
            report_id: id.to_string(),
            content: content.to_string(),
        };
        let builder = self.http.post(self.url("reports/edit")).json(&body);
        self.send::<serde_json::Value>(builder).await.map(|_| ())
    }

    async fn confirm_report(&self, id: &str) -> Result<(), ApiError> {
        debug!(id = %id, "Confirming report");
        let body = ConfirmRequest {
            report_id: id.to_string(),
        };
        let builder = self.http.post(self.url("reports/confirm")).json(&body);
        self.send::<serde_json::Value>(builder).await.map(|_| ())
    }
}
