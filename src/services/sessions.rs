//! Registry of mounted scan sessions

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::{sync::RwLock, task::JoinHandle};
use uuid::Uuid;

use super::session::{FormUpdate, ScanSession, SessionDeps, SessionHandle};
use crate::{
    config::{ScannerBackend, ScannerConfig, StationConfig},
    error::{AppError, AppResult},
    models::session::SessionSnapshot,
    scanner::{
        BarcodeDecoder, CameraDevice, DeviceClaims, ExclusiveDecoder, PushDecoder, PushHandle,
        SerialLineDecoder,
    },
};

/// What the station reports about its cameras when mounting a session
#[derive(Debug, Clone, Default)]
pub struct StationCameras {
    /// Cameras enumerated on the station, `None` to use the configured ones
    pub cameras: Option<Vec<CameraDevice>>,
    /// Set when the station was refused camera access
    pub access_error: Option<String>,
}

struct SessionEntry {
    handle: SessionHandle,
    frames: Option<PushHandle>,
    last_active: Instant,
}

#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
    deps: SessionDeps,
    scanner: ScannerConfig,
    station: StationConfig,
    claims: DeviceClaims,
}

impl SessionRegistry {
    pub fn new(deps: SessionDeps, scanner: ScannerConfig, station: StationConfig) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            deps,
            scanner,
            station,
            claims: DeviceClaims::default(),
        }
    }

    fn decoder_for(&self, cameras: StationCameras) -> (Box<dyn BarcodeDecoder>, Option<PushHandle>) {
        match self.scanner.backend {
            ScannerBackend::Push => {
                let decoder = match cameras.access_error {
                    Some(reason) => PushDecoder::denied(reason),
                    None => PushDecoder::new(cameras.cameras.unwrap_or_else(|| {
                        self.scanner
                            .devices
                            .iter()
                            .map(|d| CameraDevice {
                                id: d.id.clone(),
                                label: d.label.clone(),
                            })
                            .collect()
                    })),
                };
                let frames = decoder.handle();
                (Box::new(decoder), Some(frames))
            }
            ScannerBackend::Serial => (
                Box::new(ExclusiveDecoder::new(
                    Box::new(SerialLineDecoder::new(&self.scanner.device_dir)),
                    self.claims.clone(),
                )),
                None,
            ),
        }
    }

    /// Mount a new session and return its state once scanning has started
    pub async fn create(
        &self,
        operator: Option<String>,
        cameras: StationCameras,
    ) -> AppResult<SessionSnapshot> {
        let id = Uuid::new_v4();
        let (decoder, frames) = self.decoder_for(cameras);
        let (session, events) =
            ScanSession::new(id, self.station, decoder, self.deps.clone(), operator);
        let handle = SessionHandle::spawn(session, events);

        self.sessions.write().await.insert(
            id,
            SessionEntry {
                handle: handle.clone(),
                frames,
                last_active: Instant::now(),
            },
        );
        tracing::info!("Session {} mounted", id);

        handle.snapshot().await
    }

    /// Handle of a live session, marking it active
    async fn handle(&self, id: Uuid) -> AppResult<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))?;
        entry.last_active = Instant::now();
        Ok(entry.handle.clone())
    }

    pub async fn snapshot(&self, id: Uuid) -> AppResult<SessionSnapshot> {
        self.handle(id).await?.snapshot().await
    }

    pub async fn update_form(&self, id: Uuid, update: FormUpdate) -> AppResult<SessionSnapshot> {
        self.handle(id).await?.update_form(update).await
    }

    pub async fn capture(&self, id: Uuid) -> AppResult<SessionSnapshot> {
        self.handle(id).await?.capture().await
    }

    pub async fn toggle_camera(&self, id: Uuid) -> AppResult<SessionSnapshot> {
        self.handle(id).await?.toggle_camera().await
    }

    /// Deliver a frame decoded on the station
    pub async fn push_frame(&self, id: Uuid, text: &str) -> AppResult<()> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))?;
        entry.last_active = Instant::now();
        let frames = entry.frames.as_ref().ok_or_else(|| {
            AppError::Conflict("Session scans from a hardware scanner".to_string())
        })?;
        frames.push(text)?;
        Ok(())
    }

    pub async fn teardown(&self, id: Uuid) -> AppResult<SessionSnapshot> {
        let entry = self
            .sessions
            .write()
            .await
            .remove(&id)
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))?;
        entry.handle.teardown().await
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    fn idle_timeout(&self) -> Option<Duration> {
        match self.scanner.idle_timeout_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Tear down sessions idle for longer than the configured timeout as of
    /// `now`. Returns how many were closed.
    pub async fn reap_idle(&self, now: Instant) -> usize {
        let Some(timeout) = self.idle_timeout() else {
            return 0;
        };

        let expired: Vec<SessionEntry> = {
            let mut sessions = self.sessions.write().await;
            let ids: Vec<Uuid> = sessions
                .iter()
                .filter(|(_, entry)| now.saturating_duration_since(entry.last_active) >= timeout)
                .map(|(id, _)| *id)
                .collect();
            ids.iter().filter_map(|id| sessions.remove(id)).collect()
        };

        let count = expired.len();
        for entry in expired {
            tracing::info!("Session {} idle for over {:?}, closing", entry.handle.id(), timeout);
            if let Err(e) = entry.handle.teardown().await {
                tracing::warn!("Failed to close session {}: {}", entry.handle.id(), e);
            }
        }
        count
    }

    /// Periodically close idle sessions; `None` when sessions never expire
    pub fn spawn_reaper(&self) -> Option<JoinHandle<()>> {
        let timeout = self.idle_timeout()?;
        let period = (timeout / 4).clamp(Duration::from_millis(250), Duration::from_secs(60));
        let registry = self.clone();

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let closed = registry.reap_idle(Instant::now()).await;
                if closed > 0 {
                    tracing::debug!("Reaped {} idle sessions", closed);
                }
            }
        }))
    }

    /// Tear down every session, releasing their scanners
    pub async fn shutdown(&self) {
        let entries: Vec<SessionEntry> = self
            .sessions
            .write()
            .await
            .drain()
            .map(|(_, entry)| entry)
            .collect();

        for entry in entries {
            if let Err(e) = entry.handle.teardown().await {
                tracing::warn!("Failed to close session {}: {}", entry.handle.id(), e);
            }
        }
    }
}
