//! Order status workflow service

use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use crate::{
    clients::OrdersApi,
    error::{AppError, AppResult},
    models::order::{
        CaptureOrdersRequest, ChangeStatusRequest, Order, RemoteOrderCapture, RemoteStatusChange,
        UncapturedOrder,
    },
};

#[derive(Clone)]
pub struct OrdersService {
    api: Arc<dyn OrdersApi>,
}

impl OrdersService {
    pub fn new(api: Arc<dyn OrdersApi>) -> Self {
        Self { api }
    }

    /// Orders still waiting at the capture stage
    pub async fn list_captured(&self) -> AppResult<Vec<Order>> {
        let orders = self.api.fetch_captured().await?;
        tracing::debug!("Fetched {} captured orders", orders.len());
        Ok(orders.into_iter().map(Order::from).collect())
    }

    /// Orders the sales desk has not captured yet
    pub async fn list_uncaptured(&self) -> AppResult<Vec<UncapturedOrder>> {
        let orders = self.api.fetch_uncaptured().await?;
        tracing::debug!("Fetched {} uncaptured orders", orders.len());
        Ok(orders.into_iter().map(UncapturedOrder::from).collect())
    }

    /// Capture orders on behalf of `user`, dated now unless the desk picked a date
    pub async fn capture_orders(
        &self,
        request: CaptureOrdersRequest,
        user: &str,
    ) -> AppResult<serde_json::Value> {
        request.validate()?;

        let date_captured = request.date_captured.unwrap_or_else(Utc::now);
        let captures: Vec<RemoteOrderCapture> = request
            .orders
            .into_iter()
            .map(|order| RemoteOrderCapture {
                auto_index: order.auto_index,
                order_num: order.order_num,
                user: user.to_string(),
                date_captured,
                priority: order.priority.into(),
                del_method_id: order.del_method_id,
            })
            .collect();

        let ack = self.api.capture_orders(&captures).await?;
        tracing::info!("{} captured {} orders", user, captures.len());
        Ok(ack)
    }

    /// Move orders to new statuses on behalf of `user`
    pub async fn change_status(
        &self,
        request: ChangeStatusRequest,
        user: &str,
    ) -> AppResult<serde_json::Value> {
        request.validate()?;

        let changes = request
            .orders
            .iter()
            .map(|change| {
                let status = request.stage.status(change.status).ok_or_else(|| {
                    AppError::Validation(format!(
                        "Status {} is not available for {:?} orders",
                        change.status, request.stage
                    ))
                })?;
                Ok(RemoteStatusChange {
                    auto_index: change.auto_index,
                    order_num: change.order_num.clone(),
                    priority: change.priority.into(),
                    user: user.to_string(),
                    status: status.code(),
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        let ack = self.api.change_status(&changes).await?;
        tracing::info!("{} updated {} order statuses", user, changes.len());
        Ok(ack)
    }
}
