//! Clients for the remote stock / order REST API
//!
//! Every call sends exactly one request and never retries; failures are
//! classified into network, server (non-2xx) and decode (unexpected body
//! shape) errors so callers can turn them into operator-facing messages.

pub mod dispatch;
pub mod orders;
pub mod stock;
pub mod stocktake;

use std::time::Duration;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::{
    config::{ApiConfig, StockTakeConfig},
    error::{AppError, AppResult},
};

pub use dispatch::{DispatchApi, HttpDispatchClient};
pub use orders::{HttpOrdersClient, OrderEndpoints, OrdersApi};
pub use stock::{HttpStockLookup, LookupError, StockLookup};
pub use stocktake::{CaptureSubmitter, HttpStockTakeClient, ReferenceIssuer, SubmitError};

/// Failure of a single request to the remote API
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("network response was not ok (HTTP {status})")]
    Server { status: u16 },

    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Send a prepared request and decode its JSON body
pub(crate) async fn send_json<R: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<R, TransportError> {
    let response = request
        .send()
        .await
        .map_err(|e| TransportError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(TransportError::Server {
            status: status.as_u16(),
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| TransportError::Network(e.to_string()))?;

    serde_json::from_slice(&body).map_err(|e| TransportError::Decode(e.to_string()))
}

/// All remote API clients, sharing one connection pool
#[derive(Clone)]
pub struct ApiClients {
    pub stock: HttpStockLookup,
    pub stocktake: HttpStockTakeClient,
    pub orders: HttpOrdersClient,
    pub dispatch: HttpDispatchClient,
}

impl ApiClients {
    pub fn new(api: &ApiConfig, stocktake: StockTakeConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(api.timeout_seconds))
            .user_agent(concat!("stockscan-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            stock: HttpStockLookup::new(http.clone(), api.url(&api.stock_check_path)),
            stocktake: HttpStockTakeClient::new(
                http.clone(),
                api.url(&api.stocktake_path),
                api.url(&api.reference_path),
                stocktake.idempotency_keys,
            ),
            orders: HttpOrdersClient::new(
                http.clone(),
                OrderEndpoints {
                    captured: api.url(&api.orders_captured_path),
                    uncaptured: api.url(&api.orders_uncaptured_path),
                    capture: api.url(&api.orders_capture_path),
                    status: api.url(&api.orders_status_path),
                },
            ),
            dispatch: HttpDispatchClient::new(
                http,
                api.url(&api.trip_sheet_path),
                api.url(&api.delivery_note_path),
            ),
        })
    }
}
