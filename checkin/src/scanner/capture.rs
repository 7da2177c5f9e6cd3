//! Scoped access to a capture device (camera).
//!
//! A [`CaptureSession`] holds the device from [`CaptureSession::start`] until
//! it is stopped or dropped. Release happens exactly once on every path,
//! including a kiosk view torn down mid-scan.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::sync::Mutex;

/// Errors from acquiring a capture device
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The user or platform refused access
    #[error("Camera access denied")]
    PermissionDenied,

    /// No usable device
    #[error("Camera unavailable: {0}")]
    Unavailable(String),
}

/// Boxed future returned by capture devices
pub type CaptureFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A device producing decoded QR text
pub trait CaptureDevice: Send + Sync {
    /// Request access; suspends until granted or refused
    fn acquire(&self) -> CaptureFuture<'_, Result<(), CaptureError>>;

    /// Next decoded code, or `None` when the device stops producing
    fn next_code(&self) -> CaptureFuture<'_, Option<String>>;

    /// Give the device back
    fn release(&self);
}

/// Held capture device
pub struct CaptureSession {
    device: Option<Arc<dyn CaptureDevice>>,
}

impl CaptureSession {
    /// Acquire `device`
    ///
    /// # Errors
    ///
    /// The device's refusal; nothing is held afterwards.
    pub async fn start(device: Arc<dyn CaptureDevice>) -> Result<Self, CaptureError> {
        device.acquire().await?;
        tracing::debug!("Capture started");
        Ok(Self {
            device: Some(device),
        })
    }

    /// Next decoded code
    pub async fn next_code(&self) -> Option<String> {
        match &self.device {
            Some(device) => device.next_code().await,
            None => None,
        }
    }

    /// Release the device now
    pub fn stop(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(device) = self.device.take() {
            device.release();
            tracing::debug!("Capture released");
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.release();
    }
}

/// Keyboard-wedge scanner: a device that types each decoded code as one line
///
/// Blank lines are skipped. One session at a time may hold it.
pub struct LineScanner<R> {
    lines: Mutex<Lines<R>>,
    held: AtomicBool,
}

impl<R> LineScanner<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    /// Scanner reading codes from `reader`
    pub fn new(reader: R) -> Self {
        Self {
            lines: Mutex::new(reader.lines()),
            held: AtomicBool::new(false),
        }
    }
}

impl<R> CaptureDevice for LineScanner<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    fn acquire(&self) -> CaptureFuture<'_, Result<(), CaptureError>> {
        Box::pin(async move {
            if self.held.swap(true, Ordering::AcqRel) {
                return Err(CaptureError::Unavailable("scanner already in use".to_string()));
            }
            Ok(())
        })
    }

    fn next_code(&self) -> CaptureFuture<'_, Option<String>> {
        Box::pin(async move {
            let mut lines = self.lines.lock().await;
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) if line.trim().is_empty() => {},
                    Ok(Some(line)) => return Some(line.trim().to_string()),
                    Ok(None) => return None,
                    Err(error) => {
                        tracing::warn!(%error, "Scanner input failed");
                        return None;
                    },
                }
            }
        })
    }

    fn release(&self) {
        self.held.store(false, Ordering::Release);
    }
}
