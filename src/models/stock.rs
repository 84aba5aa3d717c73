//! Stock records and stock-take captures

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use utoipa::ToSchema;
use uuid::Uuid;

/// One inventory item as returned by the stock check endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StockRecord {
    #[serde(rename = "StockLink")]
    pub stock_link: i64,
    #[serde(rename = "Code")]
    pub code: String,
    #[serde(rename = "Description_1")]
    pub description: String,
    #[serde(rename = "ucIIDesc1", default)]
    pub full_description: Option<String>,
    #[serde(rename = "ucIIDesc2", default)]
    pub details_1: Option<String>,
    #[serde(rename = "ucIIDesc3", default)]
    pub details_2: Option<String>,
    #[serde(rename = "ItemCost", default)]
    pub item_cost: Decimal,
    #[serde(rename = "QtyOnHand", default)]
    pub qty_on_hand: Decimal,
    /// Export price
    #[serde(rename = "ExPr1", default)]
    pub export_price: Decimal,
    /// Import price
    #[serde(rename = "InPr1", default)]
    pub import_price: Decimal,
    #[serde(rename = "Barcode", default)]
    pub barcode: Option<String>,
}

/// A decoded frame, consumed immediately by the scan session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEvent {
    pub code: String,
    pub decoded_at: DateTime<Utc>,
}

impl ScanEvent {
    pub fn now(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            decoded_at: Utc::now(),
        }
    }
}

/// Stock-take entry posted to the capture endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureRequest {
    #[serde(rename = "BatchNo")]
    pub batch_no: String,
    #[serde(rename = "Chrono", serialize_with = "iso8601_millis")]
    pub chrono: DateTime<Utc>,
    #[serde(rename = "StkCode")]
    pub stk_code: String,
    #[serde(rename = "StkItem")]
    pub stk_item: String,
    #[serde(rename = "Count")]
    pub count: u32,
    #[serde(rename = "name", skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    /// Sent as a header, never in the body
    #[serde(skip)]
    pub idempotency_key: Uuid,
}

impl CaptureRequest {
    pub fn new(
        reference: &str,
        record: &StockRecord,
        count: u32,
        operator: Option<String>,
        chrono: DateTime<Utc>,
    ) -> Self {
        Self {
            batch_no: reference.to_string(),
            chrono,
            stk_code: record.code.clone(),
            stk_item: record.description.clone(),
            count,
            operator,
            idempotency_key: Uuid::new_v4(),
        }
    }

    /// Whether `other` captures the same form input (timestamp and key aside)
    pub fn same_capture(&self, other: &CaptureRequest) -> bool {
        self.batch_no == other.batch_no
            && self.stk_code == other.stk_code
            && self.count == other.count
            && self.operator == other.operator
    }
}

pub(crate) fn iso8601_millis<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
}
