//! Trip sheets and delivery notes

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::order::{OrderStatus, Priority};

/// One invoiced order on a trip sheet, as returned by the trip sheet endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TripSheetEntry {
    #[serde(rename = "AutoIndex", default)]
    pub auto_index: Option<i64>,
    #[serde(rename = "Customer_Account", default)]
    pub customer_account: String,
    #[serde(rename = "Customer_Name", default)]
    pub customer_name: String,
    #[serde(rename = "OrderNum", default)]
    pub order_num: String,
    #[serde(rename = "ExtOrderNum")]
    pub ext_order_num: Option<String>,
    #[serde(rename = "SoqNo")]
    pub soq_no: Option<String>,
    #[serde(rename = "OrderDate")]
    pub order_date: Option<String>,
    #[serde(rename = "OrderReceivedDate")]
    pub order_received_date: Option<String>,
    #[serde(rename = "InvNumber")]
    pub inv_number: Option<String>,
    #[serde(rename = "InvDate")]
    pub inv_date: Option<String>,
    /// Invoice total excluding VAT
    #[serde(rename = "InvTotExcl", default)]
    pub inv_tot_excl: Decimal,
    #[serde(rename = "DelNoteNum")]
    pub del_note_num: Option<String>,
    #[serde(rename = "Delivery_Method")]
    pub delivery_method: Option<String>,
    #[serde(rename = "Dispatch_Date")]
    pub dispatch_date: Option<String>,
    #[serde(rename = "Picker")]
    pub picker: Option<String>,
    #[serde(rename = "Reg_Number")]
    pub reg_number: Option<String>,
    /// Proof-of-delivery date
    #[serde(rename = "PodDate")]
    pub pod_date: Option<String>,
}

/// Delivery note header as returned by the order API
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteDeliveryNote {
    #[serde(rename = "DNN")]
    pub dnn: String,
    #[serde(rename = "Chrono", default)]
    pub chrono: Option<String>,
    #[serde(rename = "CustomerName", default)]
    pub customer_name: Option<String>,
    #[serde(rename = "AccCode", default)]
    pub acc_code: Option<String>,
    #[serde(rename = "DelMethod", default)]
    pub del_method: i32,
    #[serde(rename = "CreatedBy", default)]
    pub created_by: Option<String>,
    #[serde(rename = "Priority", default)]
    pub priority: i32,
    #[serde(rename = "CurrentStatus", default)]
    pub current_status: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteStockDetail {
    #[serde(rename = "StockCode")]
    pub stock_code: String,
    #[serde(rename = "Item", default)]
    pub item: String,
    #[serde(rename = "Price", default)]
    pub price: Decimal,
    #[serde(rename = "Qty", default)]
    pub qty: Decimal,
}

/// Delivery note endpoint envelope
#[derive(Debug, Deserialize)]
pub struct RemoteDeliveryNoteDetail {
    #[serde(rename = "deliveryNote")]
    pub delivery_note: RemoteDeliveryNote,
    #[serde(rename = "stockDetails", default)]
    pub stock_details: Vec<RemoteStockDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DeliveryNoteLine {
    pub stock_code: String,
    pub item: String,
    pub qty: Decimal,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// Printable delivery note
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DeliveryNote {
    pub dnn: String,
    pub chrono: Option<String>,
    pub customer_name: String,
    pub account_code: String,
    pub del_method: i32,
    pub created_by: String,
    pub priority: Priority,
    pub current_status: i32,
    /// Label of `current_status` when the code is a known status
    pub status_label: Option<String>,
    pub lines: Vec<DeliveryNoteLine>,
    pub total: Decimal,
}

impl From<RemoteDeliveryNoteDetail> for DeliveryNote {
    fn from(detail: RemoteDeliveryNoteDetail) -> Self {
        let note = detail.delivery_note;
        let lines: Vec<DeliveryNoteLine> = detail
            .stock_details
            .into_iter()
            .map(|line| DeliveryNoteLine {
                line_total: line.qty * line.price,
                stock_code: line.stock_code,
                item: line.item,
                qty: line.qty,
                unit_price: line.price,
            })
            .collect();
        let total = lines.iter().map(|line| line.line_total).sum();

        Self {
            dnn: note.dnn,
            chrono: note.chrono,
            customer_name: note.customer_name.unwrap_or_default(),
            account_code: note.acc_code.unwrap_or_default(),
            del_method: note.del_method,
            created_by: note.created_by.unwrap_or_default(),
            priority: note.priority.into(),
            current_status: note.current_status,
            status_label: OrderStatus::try_from(note.current_status)
                .ok()
                .map(|status| status.label().to_string()),
            lines,
            total,
        }
    }
}
