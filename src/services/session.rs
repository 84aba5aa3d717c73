//! Scan session controller
//!
//! A session drives one scanning station through the capture cycle:
//! frame → decode → stock lookup → display → operator input → submit → reset.
//!
//! Each session runs as a single task. Decoder events, lookup completions and
//! operator commands are all serialized through it, so state only changes
//! between awaits. Lookups run as spawned tasks that post their result back
//! tagged with a sequence number; only the result for the latest scan is
//! applied.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use uuid::Uuid;

use crate::{
    clients::{CaptureSubmitter, LookupError, ReferenceIssuer, StockLookup},
    config::StationConfig,
    error::{AppError, AppResult},
    models::{
        session::{SessionPhase, SessionSnapshot},
        stock::{CaptureRequest, ScanEvent, StockRecord},
    },
    scanner::{BarcodeDecoder, CameraDevice, DecodeSink, DecoderEvent},
};

const COMMAND_BUFFER: usize = 32;

/// Remote collaborators of a session
#[derive(Clone)]
pub struct SessionDeps {
    pub stock: Arc<dyn StockLookup>,
    pub submitter: Arc<dyn CaptureSubmitter>,
    pub references: Arc<dyn ReferenceIssuer>,
}

/// Operator actions a session refuses without contacting the API
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionRejection {
    #[error("No stock information available to capture")]
    NoScan,

    #[error("Enter a quantity before capturing stock")]
    MissingQuantity,

    #[error("Operator identity is required to capture stock")]
    MissingOperator,

    #[error("Camera toggling is not available on this station")]
    CameraToggleDisabled,
}

/// Form edits; a `None` field is left untouched
#[derive(Debug, Clone, Default)]
pub struct FormUpdate {
    /// `Some(None)` blanks the quantity
    pub quantity: Option<Option<u32>>,
    pub reference: Option<String>,
}

pub enum SessionEvent {
    Decoder(DecoderEvent),
    LookupFinished {
        seq: u64,
        result: Result<StockRecord, LookupError>,
    },
}

enum Command {
    Snapshot(oneshot::Sender<SessionSnapshot>),
    UpdateForm(FormUpdate, oneshot::Sender<SessionSnapshot>),
    Capture(oneshot::Sender<Result<SessionSnapshot, SessionRejection>>),
    ToggleCamera(oneshot::Sender<Result<SessionSnapshot, SessionRejection>>),
    Teardown(oneshot::Sender<SessionSnapshot>),
}

#[derive(Debug, Clone)]
struct SessionState {
    phase: SessionPhase,
    code: Option<String>,
    current: Option<StockRecord>,
    last_successful: Option<StockRecord>,
    quantity: Option<u32>,
    reference: String,
    loading: bool,
    error: Option<String>,
    cameras: Vec<CameraDevice>,
    camera_index: usize,
    scanning_available: bool,
    operator: Option<String>,
}

pub struct ScanSession {
    id: Uuid,
    station: StationConfig,
    decoder: Box<dyn BarcodeDecoder>,
    deps: SessionDeps,
    state: SessionState,
    seq: u64,
    in_flight: Option<JoinHandle<()>>,
    /// Last capture the API refused, kept so a retry reuses its idempotency key
    failed_capture: Option<CaptureRequest>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl ScanSession {
    pub fn new(
        id: Uuid,
        station: StationConfig,
        decoder: Box<dyn BarcodeDecoder>,
        deps: SessionDeps,
        operator: Option<String>,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let session = Self {
            id,
            station,
            decoder,
            deps,
            state: SessionState {
                phase: SessionPhase::Idle,
                code: None,
                current: None,
                last_successful: None,
                quantity: None,
                reference: String::new(),
                loading: false,
                error: None,
                cameras: Vec::new(),
                camera_index: 0,
                scanning_available: false,
                operator,
            },
            seq: 0,
            in_flight: None,
            failed_capture: None,
            events,
        };
        (session, rx)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = &self.state;
        SessionSnapshot {
            id: self.id,
            phase: state.phase,
            code: state.code.clone(),
            stock: state.current.clone(),
            last_successful: state.last_successful.clone(),
            quantity: state.quantity,
            reference: state.reference.clone(),
            loading: state.loading,
            error: state.error.clone(),
            cameras: state.cameras.clone(),
            camera_index: state.camera_index,
            scanning_available: state.scanning_available,
            camera_toggle: self.station.camera_toggle && state.cameras.len() > 1,
            operator: state.operator.clone(),
        }
    }

    /// Prefill the reference, enumerate devices and start scanning on the first
    pub async fn mount(&mut self) {
        self.refresh_reference().await;

        match self.decoder.list_devices().await {
            Ok(devices) if devices.is_empty() => {
                tracing::warn!("Session {}: no scanner devices available", self.id);
                self.state.error = Some("No camera found".to_string());
                self.state.scanning_available = false;
            }
            Ok(devices) => {
                self.state.cameras = devices;
                self.start_decoder(0).await;
            }
            Err(e) => {
                tracing::error!("Session {}: {}", self.id, e);
                self.state.error = Some(e.to_string());
                self.state.scanning_available = false;
            }
        }
    }

    fn sink(&self) -> DecodeSink {
        let events = self.events.clone();
        DecodeSink::new(move |event| events.send(SessionEvent::Decoder(event)).is_ok())
    }

    async fn start_decoder(&mut self, index: usize) {
        let device_id = self.state.cameras[index].id.clone();
        self.state.camera_index = index;

        match self.decoder.start(&device_id, self.sink()).await {
            Ok(()) => {
                tracing::info!("Session {}: scanning on {}", self.id, device_id);
                self.state.scanning_available = true;
                self.state.phase = SessionPhase::Scanning;
            }
            Err(e) => {
                tracing::error!("Session {}: unable to start scanning: {}", self.id, e);
                self.state.error = Some(e.to_string());
                self.state.scanning_available = false;
                self.state.phase = SessionPhase::Idle;
            }
        }
    }

    async fn refresh_reference(&mut self) {
        match self.deps.references.issue().await {
            Ok(Some(reference)) => self.state.reference = reference,
            Ok(None) => tracing::debug!("Session {}: no reference issued", self.id),
            Err(e) => {
                tracing::warn!("Session {}: failed to fetch reference: {}", self.id, e);
                self.state.error = Some(format!("Failed to fetch reference: {}", e));
            }
        }
    }

    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Decoder(DecoderEvent::Decoded(scan)) => self.on_decode(scan),
            SessionEvent::Decoder(DecoderEvent::Failed(message)) => {
                tracing::debug!("Session {}: decode error: {}", self.id, message);
            }
            SessionEvent::Decoder(DecoderEvent::Ended(message)) => self.on_stream_ended(message),
            SessionEvent::LookupFinished { seq, result } => self.on_lookup_finished(seq, result),
        }
    }

    fn on_stream_ended(&mut self, message: String) {
        tracing::warn!("Session {}: scanner stream ended: {}", self.id, message);
        self.state.scanning_available = false;
        self.state.error = Some(message);
        if self.state.phase == SessionPhase::Scanning {
            self.state.phase = SessionPhase::Idle;
        }
    }

    fn on_decode(&mut self, scan: ScanEvent) {
        self.seq += 1;
        let seq = self.seq;
        tracing::debug!("Session {}: scan #{} {}", self.id, seq, scan.code);

        if let Some(previous) = self.in_flight.take() {
            previous.abort();
        }

        self.state.code = Some(scan.code.clone());
        self.state.loading = true;
        self.state.phase = SessionPhase::LookupInFlight;

        let stock = self.deps.stock.clone();
        let events = self.events.clone();
        self.in_flight = Some(tokio::spawn(async move {
            let result = stock.lookup(&scan.code).await;
            let _ = events.send(SessionEvent::LookupFinished { seq, result });
        }));
    }

    fn on_lookup_finished(&mut self, seq: u64, result: Result<StockRecord, LookupError>) {
        if seq != self.seq {
            tracing::debug!("Session {}: dropping stale lookup #{} (latest #{})", self.id, seq, self.seq);
            return;
        }
        self.in_flight = None;
        self.state.loading = false;

        match result {
            Ok(record) => {
                self.state.current = Some(record.clone());
                self.state.last_successful = Some(record);
                self.state.error = None;
                self.state.phase = SessionPhase::Ready;
            }
            Err(e) => {
                tracing::warn!("Session {}: failed to fetch stock info: {}", self.id, e);
                self.state.current = None;
                self.state.error = Some(format!("Failed to fetch stock info: {}", e));
                self.state.phase = SessionPhase::Error;
            }
        }
    }

    pub fn update_form(&mut self, update: FormUpdate) {
        if let Some(quantity) = update.quantity {
            self.state.quantity = quantity;
        }
        if let Some(reference) = update.reference {
            self.state.reference = reference;
        }
    }

    /// Book the counted quantity against the last resolved stock item
    pub async fn capture(&mut self) -> Result<(), SessionRejection> {
        let record = self
            .state
            .last_successful
            .clone()
            .ok_or(SessionRejection::NoScan)?;
        let count = self.state.quantity.ok_or(SessionRejection::MissingQuantity)?;
        if self.station.require_operator && self.state.operator.is_none() {
            return Err(SessionRejection::MissingOperator);
        }
        let operator = self
            .state
            .operator
            .clone()
            .filter(|_| self.station.stamp_operator);

        let mut request =
            CaptureRequest::new(&self.state.reference, &record, count, operator, Utc::now());
        if let Some(failed) = self.failed_capture.take() {
            if failed.same_capture(&request) {
                request.idempotency_key = failed.idempotency_key;
            }
        }

        self.state.phase = SessionPhase::Submitting;
        self.state.loading = true;
        let result = self.deps.submitter.submit(&request).await;
        // A scan taken before the capture may still be resolving
        let lookup_pending = self.in_flight.is_some();
        self.state.loading = lookup_pending;

        match result {
            Ok(()) => {
                tracing::info!(
                    "Session {}: captured {} x {} on {}",
                    self.id,
                    request.count,
                    request.stk_code,
                    request.batch_no
                );
                self.state.quantity = None;
                if !lookup_pending {
                    self.state.code = None;
                }
                self.state.current = None;
                self.state.last_successful = None;
                self.state.error = None;
                self.state.reference.clear();
                self.refresh_reference().await;
                self.state.phase = if lookup_pending {
                    SessionPhase::LookupInFlight
                } else if self.state.scanning_available && self.decoder.active_device().is_some() {
                    SessionPhase::Scanning
                } else {
                    SessionPhase::Idle
                };
            }
            Err(e) => {
                tracing::warn!("Session {}: failed to post stock take: {}", self.id, e);
                self.state.error = Some(format!("Failed to capture stock: {}", e));
                self.state.phase = SessionPhase::Error;
                self.failed_capture = Some(request);
            }
        }
        Ok(())
    }

    /// Move scanning to the next enumerated camera. Returns whether it moved.
    pub async fn toggle_camera(&mut self) -> Result<bool, SessionRejection> {
        if !self.station.camera_toggle {
            return Err(SessionRejection::CameraToggleDisabled);
        }
        let count = self.state.cameras.len();
        if count <= 1 {
            return Ok(false);
        }

        let next = (self.state.camera_index + 1) % count;
        if let Err(e) = self.decoder.stop().await {
            tracing::warn!("Session {}: unable to stop scanning: {}", self.id, e);
        }
        self.start_decoder(next).await;
        Ok(true)
    }

    /// Release the scanner and abandon any lookup still running
    pub async fn teardown(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
        if let Err(e) = self.decoder.stop().await {
            tracing::warn!("Session {}: unable to stop scanning: {}", self.id, e);
        }
        self.state.loading = false;
        self.state.phase = SessionPhase::Idle;
        tracing::info!("Session {} closed", self.id);
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            Command::UpdateForm(update, reply) => {
                self.update_form(update);
                let _ = reply.send(self.snapshot());
            }
            Command::Capture(reply) => {
                let result = self.capture().await.map(|()| self.snapshot());
                let _ = reply.send(result);
            }
            Command::ToggleCamera(reply) => {
                let result = self.toggle_camera().await.map(|_| self.snapshot());
                let _ = reply.send(result);
            }
            Command::Teardown(reply) => {
                self.teardown().await;
                let _ = reply.send(self.snapshot());
            }
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut events: mpsc::UnboundedReceiver<SessionEvent>,
    ) {
        self.mount().await;

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command @ Command::Teardown(_)) => {
                        self.handle_command(command).await;
                        return;
                    }
                    Some(command) => self.handle_command(command).await,
                    None => {
                        self.teardown().await;
                        return;
                    }
                },
                Some(event) = events.recv() => self.handle_event(event),
            }
        }
    }
}

/// Handle to a running session task
#[derive(Clone)]
pub struct SessionHandle {
    id: Uuid,
    commands: mpsc::Sender<Command>,
}

impl SessionHandle {
    /// Run `session` on its own task; it mounts before serving any command
    pub fn spawn(session: ScanSession, events: mpsc::UnboundedReceiver<SessionEvent>) -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let id = session.id();
        tokio::spawn(session.run(rx, events));
        Self { id, commands: tx }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> AppResult<T> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(command(tx))
            .await
            .map_err(|_| self.closed())?;
        rx.await.map_err(|_| self.closed())
    }

    fn closed(&self) -> AppError {
        AppError::NotFound(format!("Session {} is closed", self.id))
    }

    pub async fn snapshot(&self) -> AppResult<SessionSnapshot> {
        self.request(Command::Snapshot).await
    }

    pub async fn update_form(&self, update: FormUpdate) -> AppResult<SessionSnapshot> {
        self.request(|reply| Command::UpdateForm(update, reply)).await
    }

    pub async fn capture(&self) -> AppResult<SessionSnapshot> {
        Ok(self.request(Command::Capture).await??)
    }

    pub async fn toggle_camera(&self) -> AppResult<SessionSnapshot> {
        Ok(self.request(Command::ToggleCamera).await??)
    }

    pub async fn teardown(&self) -> AppResult<SessionSnapshot> {
        self.request(Command::Teardown).await
    }
}
