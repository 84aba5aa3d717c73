//! Stock lookup by barcode

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use super::{send_json, TransportError};
use crate::models::stock::StockRecord;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("network error: {0}")]
    Network(String),

    #[error("no stock item found for {0}")]
    NotFound(String),

    #[error("network response was not ok (HTTP {status})")]
    Server { status: u16 },

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl From<TransportError> for LookupError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Network(msg) => LookupError::Network(msg),
            TransportError::Server { status } => LookupError::Server { status },
            TransportError::Decode(msg) => LookupError::Decode(msg),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StockLookup: Send + Sync {
    /// Resolve a decoded code to the stock item it labels
    async fn lookup(&self, code: &str) -> Result<StockRecord, LookupError>;
}

#[derive(Serialize)]
struct BarcodeQuery<'a> {
    #[serde(rename = "Barcode")]
    barcode: &'a str,
}

#[derive(Clone)]
pub struct HttpStockLookup {
    http: reqwest::Client,
    url: String,
}

impl HttpStockLookup {
    pub fn new(http: reqwest::Client, url: String) -> Self {
        Self { http, url }
    }
}

#[async_trait]
impl StockLookup for HttpStockLookup {
    async fn lookup(&self, code: &str) -> Result<StockRecord, LookupError> {
        tracing::debug!("Stock lookup for {}", code);

        let records: Vec<StockRecord> =
            send_json(self.http.post(&self.url).json(&BarcodeQuery { barcode: code })).await?;

        records
            .into_iter()
            .next()
            .ok_or_else(|| LookupError::NotFound(code.to_string()))
    }
}
