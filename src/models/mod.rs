//! Data models for Stockscan

pub mod dispatch;
pub mod order;
pub mod session;
pub mod stock;
pub mod user;

// Re-export commonly used types
pub use dispatch::{DeliveryNote, TripSheetEntry};
pub use order::{Order, OrderStatus, Priority, UncapturedOrder, WorkflowStage};
pub use session::{SessionPhase, SessionSnapshot};
pub use stock::{CaptureRequest, ScanEvent, StockRecord};
pub use user::UserClaims;
