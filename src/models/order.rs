//! Sales / dispatch orders and their status workflow

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::stock::iso8601_millis;

// ---------------------------------------------------------------------------
// OrderStatus
// ---------------------------------------------------------------------------

/// Order status codes known to the order API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[repr(i32)]
pub enum OrderStatus {
    OrderCaptured = 1,
    AtFinance = 2,
    ReturnedFromFinance = 3,
    IncorrectPricing = 4,
    NewMonthOrders = 5,
    BackOrder = 6,
    PendingCustom = 7,
    AwaitingFinanceApproval = 8,
    AwaitingConfirmation = 9,
    AwaitingPayment = 10,
    SentToDispatch = 11,
    ReceivedInDispatch = 12,
    PrintedInDispatch = 13,
    SentToCollections = 21,
}

impl OrderStatus {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::OrderCaptured => "Order Captured",
            OrderStatus::AtFinance => "Order At Finance",
            OrderStatus::ReturnedFromFinance => "Returned From Finance",
            OrderStatus::IncorrectPricing => "Incorrect Pricing",
            OrderStatus::NewMonthOrders => "New Month Orders",
            OrderStatus::BackOrder => "Back Order",
            OrderStatus::PendingCustom => "Pending Order - Custom",
            OrderStatus::AwaitingFinanceApproval => "Awaiting Finance Approval",
            OrderStatus::AwaitingConfirmation => "Awaiting Confirmation",
            OrderStatus::AwaitingPayment => "Awaiting Payment",
            OrderStatus::SentToDispatch => "Sent To Dispatch",
            OrderStatus::ReceivedInDispatch => "Received In Dispatch",
            OrderStatus::PrintedInDispatch => "Printed In Dispatch",
            OrderStatus::SentToCollections => "Sent To Collections",
        }
    }
}

impl TryFrom<i32> for OrderStatus {
    type Error = i32;

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        Ok(match v {
            1 => OrderStatus::OrderCaptured,
            2 => OrderStatus::AtFinance,
            3 => OrderStatus::ReturnedFromFinance,
            4 => OrderStatus::IncorrectPricing,
            5 => OrderStatus::NewMonthOrders,
            6 => OrderStatus::BackOrder,
            7 => OrderStatus::PendingCustom,
            8 => OrderStatus::AwaitingFinanceApproval,
            9 => OrderStatus::AwaitingConfirmation,
            10 => OrderStatus::AwaitingPayment,
            11 => OrderStatus::SentToDispatch,
            12 => OrderStatus::ReceivedInDispatch,
            13 => OrderStatus::PrintedInDispatch,
            21 => OrderStatus::SentToCollections,
            other => return Err(other),
        })
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// WorkflowStage
// ---------------------------------------------------------------------------

/// Desk an order status change is made from; each offers its own statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStage {
    Sales,
    Dispatch,
}

const SALES_STATUSES: &[OrderStatus] = &[
    OrderStatus::OrderCaptured,
    OrderStatus::AtFinance,
    OrderStatus::ReturnedFromFinance,
    OrderStatus::IncorrectPricing,
    OrderStatus::NewMonthOrders,
    OrderStatus::BackOrder,
    OrderStatus::PendingCustom,
    OrderStatus::AwaitingFinanceApproval,
    OrderStatus::AwaitingConfirmation,
    OrderStatus::AwaitingPayment,
    OrderStatus::SentToDispatch,
    OrderStatus::SentToCollections,
];

const DISPATCH_STATUSES: &[OrderStatus] = &[
    OrderStatus::SentToDispatch,
    OrderStatus::SentToCollections,
    OrderStatus::ReceivedInDispatch,
    OrderStatus::PrintedInDispatch,
];

impl WorkflowStage {
    pub fn statuses(self) -> &'static [OrderStatus] {
        match self {
            WorkflowStage::Sales => SALES_STATUSES,
            WorkflowStage::Dispatch => DISPATCH_STATUSES,
        }
    }

    /// Resolve a status code offered by this stage
    pub fn status(self, code: i32) -> Option<OrderStatus> {
        self.statuses().iter().copied().find(|s| s.code() == code)
    }
}

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Normal,
    High,
}

impl From<i32> for Priority {
    fn from(v: i32) -> Self {
        if v == 1 {
            Priority::High
        } else {
            Priority::Normal
        }
    }
}

impl From<Priority> for i32 {
    fn from(p: Priority) -> Self {
        match p {
            Priority::Normal => 0,
            Priority::High => 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// Order row as returned by the captured-orders endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteOrder {
    #[serde(rename = "AutoIndex")]
    pub auto_index: i64,
    #[serde(rename = "OrderNum")]
    pub order_num: String,
    #[serde(rename = "Priority", default)]
    pub priority: i32,
    #[serde(rename = "AccountName", default)]
    pub account_name: Option<String>,
    #[serde(rename = "Delivery_Method", default)]
    pub delivery_method: Option<String>,
}

/// Envelope shared by the captured and uncaptured order listings
#[derive(Debug, Deserialize)]
pub struct OrderListing<T> {
    #[serde(rename = "unmatchedOrders")]
    pub unmatched_orders: Vec<T>,
}

/// Order as presented to the status desks
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Order {
    pub auto_index: i64,
    pub order_num: String,
    pub priority: Priority,
    pub current_status: OrderStatus,
    pub customer_name: String,
    pub delivery_method: String,
}

impl From<RemoteOrder> for Order {
    fn from(o: RemoteOrder) -> Self {
        Self {
            auto_index: o.auto_index,
            order_num: o.order_num,
            priority: o.priority.into(),
            // Everything the endpoint returns is still at the capture stage
            current_status: OrderStatus::OrderCaptured,
            customer_name: o.account_name.unwrap_or_default(),
            delivery_method: o.delivery_method.unwrap_or_default(),
        }
    }
}

/// Some listings send `AutoIndex` as a number and others as text
fn index_from_number_or_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Index {
        Number(i64),
        Text(String),
    }

    match Index::deserialize(deserializer)? {
        Index::Number(n) => Ok(n),
        Index::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Order row as returned by the uncaptured-orders endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteUncapturedOrder {
    #[serde(rename = "AutoIndex", deserialize_with = "index_from_number_or_text")]
    pub auto_index: i64,
    #[serde(rename = "OrderNum")]
    pub order_num: String,
    #[serde(rename = "DeliveryNote", default)]
    pub delivery_note: Option<String>,
    #[serde(rename = "ExtOrderNum", default)]
    pub ext_order_num: Option<String>,
    #[serde(rename = "cAccountName", default)]
    pub account_name: Option<String>,
    #[serde(rename = "DelMethodID", default)]
    pub del_method_id: i32,
}

/// Order awaiting capture, as listed for the sales capture desk
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct UncapturedOrder {
    pub auto_index: i64,
    pub order_num: String,
    pub delivery_note: Option<String>,
    pub ext_order_num: Option<String>,
    pub account_name: String,
    pub del_method_id: i32,
    /// Desks start every listed order at normal priority
    pub priority: Priority,
}

impl From<RemoteUncapturedOrder> for UncapturedOrder {
    fn from(o: RemoteUncapturedOrder) -> Self {
        Self {
            auto_index: o.auto_index,
            order_num: o.order_num,
            delivery_note: o.delivery_note,
            ext_order_num: o.ext_order_num,
            account_name: o.account_name.unwrap_or_default(),
            del_method_id: o.del_method_id,
            priority: Priority::Normal,
        }
    }
}

/// One order the sales desk captures
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct OrderCapture {
    pub auto_index: i64,
    #[validate(length(min = 1))]
    pub order_num: String,
    #[serde(default = "normal_priority")]
    pub priority: Priority,
    pub del_method_id: i32,
}

fn normal_priority() -> Priority {
    Priority::Normal
}

/// Capture request body
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CaptureOrdersRequest {
    /// Capture date; now when omitted
    #[serde(default)]
    pub date_captured: Option<DateTime<Utc>>,
    #[validate(length(min = 1), nested)]
    pub orders: Vec<OrderCapture>,
}

/// Order capture as posted to the order API
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteOrderCapture {
    #[serde(rename = "AutoIndex")]
    pub auto_index: i64,
    #[serde(rename = "OrdNum")]
    pub order_num: String,
    #[serde(rename = "User")]
    pub user: String,
    #[serde(rename = "DateCaptured", serialize_with = "iso8601_millis")]
    pub date_captured: DateTime<Utc>,
    #[serde(rename = "Priority")]
    pub priority: i32,
    #[serde(rename = "DelMethodID")]
    pub del_method_id: i32,
}

/// One status change as requested by a desk
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct StatusChange {
    pub auto_index: i64,
    #[validate(length(min = 1))]
    pub order_num: String,
    pub priority: Priority,
    /// Status code, must belong to the request's stage
    pub status: i32,
}

/// Status change request body
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ChangeStatusRequest {
    pub stage: WorkflowStage,
    #[validate(length(min = 1), nested)]
    pub orders: Vec<StatusChange>,
}

/// Status change as posted to the order API
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteStatusChange {
    #[serde(rename = "AutoIndex")]
    pub auto_index: i64,
    #[serde(rename = "OrdNum")]
    pub order_num: String,
    #[serde(rename = "Priority")]
    pub priority: i32,
    #[serde(rename = "User")]
    pub user: String,
    #[serde(rename = "Status")]
    pub status: i32,
}
