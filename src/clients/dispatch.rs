//! Trip sheets and delivery notes

use async_trait::async_trait;
use serde::Serialize;

use super::{send_json, TransportError};
use crate::models::dispatch::{RemoteDeliveryNoteDetail, TripSheetEntry};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DispatchApi: Send + Sync {
    async fn fetch_trip_sheet(&self, id: &str) -> Result<Vec<TripSheetEntry>, TransportError>;

    async fn fetch_delivery_note(&self, dnn: &str)
        -> Result<RemoteDeliveryNoteDetail, TransportError>;
}

#[derive(Serialize)]
struct TripSheetQuery<'a> {
    id: &'a str,
}

#[derive(Serialize)]
struct DeliveryNoteQuery<'a> {
    #[serde(rename = "DNN")]
    dnn: &'a str,
}

#[derive(Clone)]
pub struct HttpDispatchClient {
    http: reqwest::Client,
    trip_sheet_url: String,
    delivery_note_url: String,
}

impl HttpDispatchClient {
    pub fn new(http: reqwest::Client, trip_sheet_url: String, delivery_note_url: String) -> Self {
        Self {
            http,
            trip_sheet_url,
            delivery_note_url,
        }
    }
}

#[async_trait]
impl DispatchApi for HttpDispatchClient {
    async fn fetch_trip_sheet(&self, id: &str) -> Result<Vec<TripSheetEntry>, TransportError> {
        send_json(self.http.post(&self.trip_sheet_url).json(&TripSheetQuery { id })).await
    }

    async fn fetch_delivery_note(
        &self,
        dnn: &str,
    ) -> Result<RemoteDeliveryNoteDetail, TransportError> {
        send_json(self.http.post(&self.delivery_note_url).json(&DeliveryNoteQuery { dnn })).await
    }
}
