//! Stock-take capture and batch reference issuance

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{send_json, TransportError};
use crate::models::stock::CaptureRequest;

const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("network error: {0}")]
    Network(String),

    #[error("network response was not ok (HTTP {status})")]
    Server { status: u16 },

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl From<TransportError> for SubmitError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Network(msg) => SubmitError::Network(msg),
            TransportError::Server { status } => SubmitError::Server { status },
            TransportError::Decode(msg) => SubmitError::Decode(msg),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaptureSubmitter: Send + Sync {
    async fn submit(&self, request: &CaptureRequest) -> Result<(), SubmitError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReferenceIssuer: Send + Sync {
    /// Fetch a fresh stock-take reference, `None` when the API issued none
    async fn issue(&self) -> Result<Option<String>, TransportError>;
}

#[derive(Serialize)]
struct RefCheck {
    #[serde(rename = "RefCheck")]
    ref_check: &'static str,
}

#[derive(Deserialize)]
struct IssuedReference {
    #[serde(rename = "StockTakeRef")]
    stock_take_ref: String,
}

#[derive(Clone)]
pub struct HttpStockTakeClient {
    http: reqwest::Client,
    capture_url: String,
    reference_url: String,
    idempotency_keys: bool,
}

impl HttpStockTakeClient {
    pub fn new(
        http: reqwest::Client,
        capture_url: String,
        reference_url: String,
        idempotency_keys: bool,
    ) -> Self {
        Self {
            http,
            capture_url,
            reference_url,
            idempotency_keys,
        }
    }
}

#[async_trait]
impl CaptureSubmitter for HttpStockTakeClient {
    async fn submit(&self, request: &CaptureRequest) -> Result<(), SubmitError> {
        let mut builder = self.http.post(&self.capture_url).json(request);
        if self.idempotency_keys {
            builder = builder.header(IDEMPOTENCY_HEADER, request.idempotency_key.to_string());
        }

        let ack: serde_json::Value = send_json(builder).await?;
        tracing::debug!("Stock take acknowledged: {}", ack);
        Ok(())
    }
}

#[async_trait]
impl ReferenceIssuer for HttpStockTakeClient {
    async fn issue(&self) -> Result<Option<String>, TransportError> {
        let issued: Vec<IssuedReference> = send_json(
            self.http
                .post(&self.reference_url)
                .json(&RefCheck { ref_check: "refcheck" }),
        )
        .await?;

        Ok(issued.into_iter().next().map(|r| r.stock_take_ref))
    }
}
