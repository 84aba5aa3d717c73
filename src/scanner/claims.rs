//! One open stream per physical scanner across all sessions

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;

use super::{BarcodeDecoder, CameraDevice, DecodeSink, ScannerError};

/// Devices currently streaming to some session
#[derive(Clone, Default)]
pub struct DeviceClaims {
    held: Arc<Mutex<HashSet<String>>>,
}

impl DeviceClaims {
    fn held(&self) -> MutexGuard<'_, HashSet<String>> {
        self.held.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn claim(&self, device_id: &str) -> bool {
        self.held().insert(device_id.to_string())
    }

    fn release(&self, device_id: &str) {
        self.held().remove(device_id);
    }

    pub fn is_held(&self, device_id: &str) -> bool {
        self.held().contains(device_id)
    }
}

/// Decoder that refuses to open a device another session is streaming from
pub struct ExclusiveDecoder {
    inner: Box<dyn BarcodeDecoder>,
    claims: DeviceClaims,
    held: Option<String>,
}

impl ExclusiveDecoder {
    pub fn new(inner: Box<dyn BarcodeDecoder>, claims: DeviceClaims) -> Self {
        Self {
            inner,
            claims,
            held: None,
        }
    }

    fn release_held(&mut self) {
        if let Some(device_id) = self.held.take() {
            self.claims.release(&device_id);
        }
    }
}

#[async_trait]
impl BarcodeDecoder for ExclusiveDecoder {
    async fn list_devices(&self) -> Result<Vec<CameraDevice>, ScannerError> {
        self.inner.list_devices().await
    }

    async fn start(&mut self, device_id: &str, sink: DecodeSink) -> Result<(), ScannerError> {
        let already_held = self.held.as_deref() == Some(device_id);
        if !already_held && !self.claims.claim(device_id) {
            return Err(ScannerError::DeviceBusy(device_id.to_string()));
        }

        match self.inner.start(device_id, sink).await {
            Ok(()) => {
                if !already_held {
                    self.release_held();
                    self.held = Some(device_id.to_string());
                }
                Ok(())
            }
            Err(e) => {
                // The inner decoder stops its previous stream before opening
                self.release_held();
                if !already_held {
                    self.claims.release(device_id);
                }
                Err(e)
            }
        }
    }

    async fn stop(&mut self) -> Result<(), ScannerError> {
        let result = self.inner.stop().await;
        self.release_held();
        result
    }

    fn active_device(&self) -> Option<String> {
        self.inner.active_device()
    }
}

impl Drop for ExclusiveDecoder {
    fn drop(&mut self) {
        self.release_held();
    }
}
