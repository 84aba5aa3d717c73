//! Barcode decoder adapters
//!
//! A decoder owns the scanner stream of one session: it enumerates the
//! devices the station offers, opens a stream on one of them and turns every
//! recognised frame into a [`DecoderEvent`] delivered through a [`DecodeSink`].
//! At most one stream is open per decoder; `start` on a running decoder
//! closes the previous stream first.

pub mod claims;
pub mod push;
pub mod serial;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use utoipa::ToSchema;

use crate::models::stock::ScanEvent;

pub use claims::{DeviceClaims, ExclusiveDecoder};
pub use push::{PushDecoder, PushHandle};
pub use serial::SerialLineDecoder;

/// A camera or scanner the station can decode from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CameraDevice {
    pub id: String,
    pub label: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScannerError {
    #[error("Camera access denied: {0}")]
    DeviceEnumeration(String),

    #[error("Unknown scanner device: {0}")]
    DeviceNotFound(String),

    #[error("Unable to start scanning: {0}")]
    Stream(String),

    #[error("Scanner {0} is in use by another session")]
    DeviceBusy(String),

    #[error("Scanner is not running")]
    NotRunning,
}

/// What a decoder reports for a frame or for its stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecoderEvent {
    Decoded(ScanEvent),
    /// A frame could not be decoded; the stream keeps running
    Failed(String),
    /// The stream is gone and no further frames will arrive
    Ended(String),
}

/// Callback side of a decode stream.
///
/// Delivery reports `false` once the receiving session is gone, which tells
/// the decoder to stop reading.
#[derive(Clone)]
pub struct DecodeSink {
    deliver: Arc<dyn Fn(DecoderEvent) -> bool + Send + Sync>,
}

impl DecodeSink {
    pub fn new(deliver: impl Fn(DecoderEvent) -> bool + Send + Sync + 'static) -> Self {
        Self {
            deliver: Arc::new(deliver),
        }
    }

    /// Sink backed by a channel, handy for driving a decoder directly
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DecoderEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(move |event| tx.send(event).is_ok()), rx)
    }

    pub fn decoded(&self, code: &str) -> bool {
        (self.deliver)(DecoderEvent::Decoded(ScanEvent::now(code)))
    }

    pub fn failed(&self, message: impl Into<String>) -> bool {
        (self.deliver)(DecoderEvent::Failed(message.into()))
    }

    pub fn ended(&self, message: impl Into<String>) -> bool {
        (self.deliver)(DecoderEvent::Ended(message.into()))
    }
}

impl std::fmt::Debug for DecodeSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeSink").finish_non_exhaustive()
    }
}

/// Camera / scanner stream lifecycle
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BarcodeDecoder: Send + Sync {
    /// Devices in the order the station reports them
    async fn list_devices(&self) -> Result<Vec<CameraDevice>, ScannerError>;

    /// Open a decode stream on `device_id`, closing any running stream first
    async fn start(&mut self, device_id: &str, sink: DecodeSink) -> Result<(), ScannerError>;

    /// Close the running stream; a no-op when nothing is running
    async fn stop(&mut self) -> Result<(), ScannerError>;

    fn active_device(&self) -> Option<String>;
}
