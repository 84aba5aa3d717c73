//! Scan session view types

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::stock::StockRecord;
use crate::scanner::CameraDevice;

/// Where a scan session currently is in its capture cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Scanning,
    LookupInFlight,
    Ready,
    Submitting,
    Error,
}

/// Point-in-time view of a scan session, as rendered by the station
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub phase: SessionPhase,
    /// Last decoded code
    pub code: Option<String>,
    /// Record resolved for the latest completed lookup
    pub stock: Option<StockRecord>,
    /// Record the next capture will be booked against
    pub last_successful: Option<StockRecord>,
    /// Blank when absent
    pub quantity: Option<u32>,
    pub reference: String,
    pub loading: bool,
    pub error: Option<String>,
    pub cameras: Vec<CameraDevice>,
    pub camera_index: usize,
    pub scanning_available: bool,
    pub camera_toggle: bool,
    pub operator: Option<String>,
}
