//! Trip sheet and delivery note service

use std::sync::Arc;

use crate::{
    clients::DispatchApi,
    error::{AppError, AppResult},
    models::dispatch::{DeliveryNote, TripSheetEntry},
};

#[derive(Clone)]
pub struct DispatchService {
    api: Arc<dyn DispatchApi>,
}

impl DispatchService {
    pub fn new(api: Arc<dyn DispatchApi>) -> Self {
        Self { api }
    }

    /// Orders loaded on trip sheet `id`
    pub async fn trip_sheet(&self, id: &str) -> AppResult<Vec<TripSheetEntry>> {
        let id = id.trim();
        if id.is_empty() {
            return Err(AppError::Validation("Trip sheet id is required".to_string()));
        }

        let entries = self.api.fetch_trip_sheet(id).await?;
        tracing::debug!("Trip sheet {} lists {} orders", id, entries.len());
        Ok(entries)
    }

    /// Delivery note `dnn` with priced lines
    pub async fn delivery_note(&self, dnn: &str) -> AppResult<DeliveryNote> {
        let dnn = dnn.trim();
        if dnn.is_empty() {
            return Err(AppError::Validation("Delivery note number is required".to_string()));
        }

        let detail = self.api.fetch_delivery_note(dnn).await?;
        Ok(DeliveryNote::from(detail))
    }
}
