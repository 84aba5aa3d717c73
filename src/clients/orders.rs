//! Sales orders: capture desk listings, order capture and status changes

use async_trait::async_trait;
use serde::Serialize;

use super::{send_json, TransportError};
use crate::models::order::{
    OrderListing, RemoteOrder, RemoteOrderCapture, RemoteStatusChange, RemoteUncapturedOrder,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrdersApi: Send + Sync {
    async fn fetch_captured(&self) -> Result<Vec<RemoteOrder>, TransportError>;

    async fn fetch_uncaptured(&self) -> Result<Vec<RemoteUncapturedOrder>, TransportError>;

    async fn capture_orders(
        &self,
        captures: &[RemoteOrderCapture],
    ) -> Result<serde_json::Value, TransportError>;

    async fn change_status(
        &self,
        changes: &[RemoteStatusChange],
    ) -> Result<serde_json::Value, TransportError>;
}

#[derive(Serialize)]
struct ListingQuery {
    #[serde(rename = "requestOrders")]
    request_orders: &'static str,
}

/// Endpoint URLs used by [`HttpOrdersClient`]
#[derive(Debug, Clone)]
pub struct OrderEndpoints {
    pub captured: String,
    pub uncaptured: String,
    pub capture: String,
    pub status: String,
}

#[derive(Clone)]
pub struct HttpOrdersClient {
    http: reqwest::Client,
    endpoints: OrderEndpoints,
}

impl HttpOrdersClient {
    pub fn new(http: reqwest::Client, endpoints: OrderEndpoints) -> Self {
        Self { http, endpoints }
    }
}

#[async_trait]
impl OrdersApi for HttpOrdersClient {
    async fn fetch_captured(&self) -> Result<Vec<RemoteOrder>, TransportError> {
        let captured: OrderListing<RemoteOrder> = send_json(
            self.http.post(&self.endpoints.captured).json(&ListingQuery {
                request_orders: "fetchcaptured",
            }),
        )
        .await?;
        Ok(captured.unmatched_orders)
    }

    async fn fetch_uncaptured(&self) -> Result<Vec<RemoteUncapturedOrder>, TransportError> {
        let listing: OrderListing<RemoteUncapturedOrder> = send_json(
            self.http.post(&self.endpoints.uncaptured).json(&ListingQuery {
                request_orders: "GetUnprocessed",
            }),
        )
        .await?;
        Ok(listing.unmatched_orders)
    }

    async fn capture_orders(
        &self,
        captures: &[RemoteOrderCapture],
    ) -> Result<serde_json::Value, TransportError> {
        send_json(self.http.post(&self.endpoints.capture).json(captures)).await
    }

    async fn change_status(
        &self,
        changes: &[RemoteStatusChange],
    ) -> Result<serde_json::Value, TransportError> {
        send_json(self.http.post(&self.endpoints.status).json(changes)).await
    }
}
