//! Decoder fed by frames decoded on the scanning station.
//!
//! The station runs the camera decoding library in the browser and pushes
//! every decoded text over HTTP. The service side only tracks which camera
//! the stream is open on and forwards frames while it is.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{BarcodeDecoder, CameraDevice, DecodeSink, ScannerError};

struct ActiveStream {
    device_id: String,
    sink: DecodeSink,
}

type Slot = Arc<Mutex<Option<ActiveStream>>>;

pub struct PushDecoder {
    devices: Result<Vec<CameraDevice>, ScannerError>,
    slot: Slot,
}

/// Producer side used by the frames endpoint
#[derive(Clone)]
pub struct PushHandle {
    slot: Slot,
}

impl PushDecoder {
    pub fn new(devices: Vec<CameraDevice>) -> Self {
        Self {
            devices: Ok(devices),
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Station reported that camera access was refused
    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            devices: Err(ScannerError::DeviceEnumeration(reason.into())),
            slot: Arc::new(Mutex::new(None)),
        }
    }

    pub fn handle(&self) -> PushHandle {
        PushHandle {
            slot: self.slot.clone(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<ActiveStream>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl BarcodeDecoder for PushDecoder {
    async fn list_devices(&self) -> Result<Vec<CameraDevice>, ScannerError> {
        self.devices.clone()
    }

    async fn start(&mut self, device_id: &str, sink: DecodeSink) -> Result<(), ScannerError> {
        let known = match &self.devices {
            Ok(devices) => devices.iter().any(|d| d.id == device_id),
            Err(e) => return Err(e.clone()),
        };
        if !known {
            return Err(ScannerError::DeviceNotFound(device_id.to_string()));
        }

        let previous = self.lock().replace(ActiveStream {
            device_id: device_id.to_string(),
            sink,
        });
        if let Some(previous) = previous {
            tracing::debug!("Closed push stream on {}", previous.device_id);
        }
        tracing::debug!("Push stream open on {}", device_id);
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), ScannerError> {
        if let Some(stream) = self.lock().take() {
            tracing::debug!("Closed push stream on {}", stream.device_id);
        }
        Ok(())
    }

    fn active_device(&self) -> Option<String> {
        self.lock().as_ref().map(|s| s.device_id.clone())
    }
}

impl PushHandle {
    /// Forward one decoded frame. Blank frames are dropped.
    pub fn push(&self, text: &str) -> Result<(), ScannerError> {
        let code = text.trim();
        let guard = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let stream = guard.as_ref().ok_or(ScannerError::NotRunning)?;
        if code.is_empty() {
            return Ok(());
        }
        if stream.sink.decoded(code) {
            Ok(())
        } else {
            Err(ScannerError::NotRunning)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::DecoderEvent;
    use tokio_test::assert_ok;

    fn cameras() -> Vec<CameraDevice> {
        vec![
            CameraDevice {
                id: "environment".to_string(),
                label: "Back camera".to_string(),
            },
            CameraDevice {
                id: "user".to_string(),
                label: "Front camera".to_string(),
            },
        ]
    }

    #[tokio::test]
    async fn test_frames_rejected_until_started() {
        let decoder = PushDecoder::new(cameras());
        assert_eq!(decoder.handle().push("6001087332420"), Err(ScannerError::NotRunning));
    }

    #[tokio::test]
    async fn test_frames_forwarded_while_running() {
        let mut decoder = PushDecoder::new(cameras());
        let handle = decoder.handle();
        let (sink, mut rx) = DecodeSink::channel();

        assert_ok!(decoder.start("environment", sink).await);
        assert_ok!(handle.push(" 6001087332420\n"));
        assert_ok!(handle.push("   "));

        match rx.recv().await {
            Some(DecoderEvent::Decoded(scan)) => assert_eq!(scan.code, "6001087332420"),
            other => panic!("unexpected event {:?}", other),
        }
        assert!(rx.try_recv().is_err());

        decoder.stop().await.unwrap();
        assert_eq!(handle.push("6001087332420"), Err(ScannerError::NotRunning));
        assert_eq!(decoder.active_device(), None);
    }

    #[tokio::test]
    async fn test_restart_switches_device() {
        let mut decoder = PushDecoder::new(cameras());
        let (first, _first_rx) = DecodeSink::channel();
        let (second, _second_rx) = DecodeSink::channel();

        assert_ok!(decoder.start("environment", first).await);
        assert_ok!(decoder.start("user", second).await);
        assert_eq!(decoder.active_device().as_deref(), Some("user"));
    }

    #[tokio::test]
    async fn test_unknown_device() {
        let mut decoder = PushDecoder::new(cameras());
        let (sink, _rx) = DecodeSink::channel();
        assert_eq!(
            decoder.start("usb-0", sink).await,
            Err(ScannerError::DeviceNotFound("usb-0".to_string()))
        );
    }

    #[tokio::test]
    async fn test_denied_access_fails_enumeration() {
        let decoder = PushDecoder::denied("NotAllowedError");
        assert!(matches!(
            decoder.list_devices().await,
            Err(ScannerError::DeviceEnumeration(_))
        ));
    }

    #[tokio::test]
    async fn test_push_after_session_gone() {
        let mut decoder = PushDecoder::new(cameras());
        let (sink, rx) = DecodeSink::channel();
        decoder.start("environment", sink).await.unwrap();
        drop(rx);
        assert_eq!(decoder.handle().push("25/009/2P"), Err(ScannerError::NotRunning));
    }
}
