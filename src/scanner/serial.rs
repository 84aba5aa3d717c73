//! Hardware scanners exposed as character devices.
//!
//! Handheld scanners in serial (CDC-ACM) mode emit one decoded code per
//! line. Devices are enumerated from a directory such as `/dev/serial/by-id`.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::net::unix::pipe;
use tokio::task::JoinHandle;
use tokio_stream::{wrappers::SplitStream, StreamExt};

use super::{BarcodeDecoder, CameraDevice, DecodeSink, ScannerError};

pub struct SerialLineDecoder {
    device_dir: PathBuf,
    reader: Option<(String, JoinHandle<()>)>,
}

impl SerialLineDecoder {
    pub fn new(device_dir: impl Into<PathBuf>) -> Self {
        Self {
            device_dir: device_dir.into(),
            reader: None,
        }
    }
}

/// Open a device for non-blocking reads driven by the reactor.
///
/// The returned receiver owns the descriptor; dropping it closes the device.
fn open_device(device_id: &str) -> std::io::Result<pipe::Receiver> {
    let mut options = pipe::OpenOptions::new();
    // Holding a write end keeps the device from reporting EOF between writers
    #[cfg(target_os = "linux")]
    options.read_write(true);
    options.unchecked(true).open_receiver(device_id)
}

/// Read codes line by line until the stream ends or the sink goes away.
///
/// A line that is not valid UTF-8 is reported as a failed frame and skipped.
/// End of stream and read errors end the task with [`DecodeSink::ended`].
pub fn spawn_line_reader<R>(reader: R, sink: DecodeSink) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = SplitStream::new(BufReader::new(reader).split(b'\n'));
        while let Some(line) = lines.next().await {
            let delivered = match line {
                Ok(bytes) => match String::from_utf8(bytes) {
                    Ok(line) => {
                        let code = line.trim();
                        if code.is_empty() {
                            continue;
                        }
                        sink.decoded(code)
                    }
                    Err(_) => sink.failed("Unreadable scan skipped: not valid UTF-8"),
                },
                Err(e) => {
                    sink.ended(format!("Scanner read failed: {}", e));
                    return;
                }
            };
            if !delivered {
                return;
            }
        }
        sink.ended("Scanner stream closed");
    })
}

#[async_trait]
impl BarcodeDecoder for SerialLineDecoder {
    async fn list_devices(&self) -> Result<Vec<CameraDevice>, ScannerError> {
        let dir_error =
            |e: std::io::Error| ScannerError::DeviceEnumeration(format!("{}: {}", self.device_dir.display(), e));

        let mut entries = tokio::fs::read_dir(&self.device_dir).await.map_err(dir_error)?;
        let mut devices = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(dir_error)? {
            devices.push(CameraDevice {
                id: entry.path().to_string_lossy().into_owned(),
                label: entry.file_name().to_string_lossy().into_owned(),
            });
        }
        devices.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(devices)
    }

    async fn start(&mut self, device_id: &str, sink: DecodeSink) -> Result<(), ScannerError> {
        self.stop().await?;

        let device = open_device(device_id).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ScannerError::DeviceNotFound(device_id.to_string()),
            _ => ScannerError::Stream(format!("{}: {}", device_id, e)),
        })?;

        tracing::info!("Serial scanner stream open on {}", device_id);
        self.reader = Some((device_id.to_string(), spawn_line_reader(device, sink)));
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), ScannerError> {
        if let Some((device_id, task)) = self.reader.take() {
            task.abort();
            // Resolves once the reader, and with it the descriptor, is dropped
            let _ = task.await;
            tracing::info!("Serial scanner stream closed on {}", device_id);
        }
        Ok(())
    }

    fn active_device(&self) -> Option<String> {
        self.reader.as_ref().map(|(id, _)| id.clone())
    }
}

impl Drop for SerialLineDecoder {
    fn drop(&mut self) {
        if let Some((_, task)) = self.reader.take() {
            task.abort();
        }
    }
}
