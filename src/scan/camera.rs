//! Continuous scanning over a frame source.
//!
//! A [`CameraScanner`] opens a [`FrameSource`], then a background task pulls
//! frames at a fixed rate and hands each to the decoder. The first payload
//! that decodes is sent on a oneshot channel and the session ends. Frames
//! that fail to arrive or decode are skipped.

use async_trait::async_trait;
use image::DynamicImage;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use super::{Decoder, RqrrDecoder};
use crate::error::{QrForgeError, Result};

/// Frames per second pulled from the source.
pub const DEFAULT_FPS: u32 = 10;

const START_FAILED: &str = "Failed to start QR scanner";

/// A live image source such as a camera.
#[async_trait]
pub trait FrameSource: Send {
    /// Acquire the device. Errors here abort the scan before it starts.
    async fn open(&mut self) -> Result<()>;

    /// Next frame, or `None` once the source is exhausted.
    async fn next_frame(&mut self) -> Result<Option<DynamicImage>>;

    /// Release the device. Called once when the session ends.
    async fn close(&mut self);
}

/// Starts scan sessions.
#[derive(Clone)]
pub struct CameraScanner {
    fps: u32,
    decoder: Arc<dyn Decoder>,
}

impl Default for CameraScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraScanner {
    pub fn new() -> Self {
        Self {
            fps: DEFAULT_FPS,
            decoder: Arc::new(RqrrDecoder),
        }
    }

    pub fn fps(mut self, fps: u32) -> Self {
        self.fps = fps.max(1);
        self
    }

    pub fn decoder(mut self, decoder: Arc<dyn Decoder>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Open `source` and start pulling frames.
    ///
    /// Fails with [`QrForgeError::Capability`] when the source cannot be
    /// opened (permission denied, no device).
    pub async fn start<S>(&self, mut source: S) -> Result<ScanSession>
    where
        S: FrameSource + 'static,
    {
        if let Err(e) = source.open().await {
            warn!(error = %e, "frame source failed to open");
            return Err(QrForgeError::Capability(START_FAILED.into()));
        }

        let (result_tx, result_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = oneshot::channel();
        let period = Duration::from_secs_f64(1.0 / self.fps as f64);
        let decoder = self.decoder.clone();

        info!(fps = self.fps, "scanner started");
        let task = tokio::spawn(run(source, decoder, period, result_tx, stop_rx));

        Ok(ScanSession {
            result: Some(result_rx),
            stop: Some(stop_tx),
            task: Some(task),
        })
    }
}

async fn run<S: FrameSource>(
    mut source: S,
    decoder: Arc<dyn Decoder>,
    period: Duration,
    result_tx: oneshot::Sender<String>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = &mut stop_rx => {
                debug!("scanner stopped");
                break;
            }
            _ = ticker.tick() => {}
        }

        // A source may block indefinitely, so stop is honoured while waiting
        let next = tokio::select! {
            _ = &mut stop_rx => {
                debug!("scanner stopped while waiting for a frame");
                break;
            }
            next = source.next_frame() => next,
        };
        let frame = match next {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                debug!("frame source exhausted");
                break;
            }
            Err(e) => {
                trace!(error = %e, "frame skipped");
                continue;
            }
        };

        let decoder = decoder.clone();
        let decoded = tokio::select! {
            _ = &mut stop_rx => {
                debug!("scanner stopped during decode");
                break;
            }
            decoded = tokio::task::spawn_blocking(move || decoder.decode(&frame)) => decoded,
        };
        match decoded {
            Ok(Ok(text)) => {
                info!(len = text.len(), "QR code scanned");
                let _ = result_tx.send(text);
                break;
            }
            Ok(Err(e)) => trace!(error = %e, "no code in frame"),
            Err(e) => trace!(error = %e, "decode task failed"),
        }
    }

    source.close().await;
}

/// A running (or finished) scan.
pub struct ScanSession {
    result: Option<oneshot::Receiver<String>>,
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ScanSession {
    /// Wait for the first decoded payload.
    ///
    /// Returns `None` if the session was stopped or the source ran out of
    /// frames first, and on every call after the first.
    pub async fn result(&mut self) -> Option<String> {
        let rx = self.result.take()?;
        rx.await.ok()
    }

    /// Stop pulling frames and release the source. Calling it again, or
    /// after the session finished on its own, does nothing.
    pub async fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "scanner task ended abnormally");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

// ============================================================================
// IMAGE SEQUENCE
// ============================================================================

enum Frame {
    Image(DynamicImage),
    File(PathBuf),
}

/// A [`FrameSource`] over in-memory images or image files, in order.
pub struct ImageSequence {
    frames: VecDeque<Frame>,
    open: bool,
}

impl ImageSequence {
    pub fn from_images(images: impl IntoIterator<Item = DynamicImage>) -> Self {
        Self {
            frames: images.into_iter().map(Frame::Image).collect(),
            open: false,
        }
    }

    pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            frames: paths.into_iter().map(Frame::File).collect(),
            open: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

#[async_trait]
impl FrameSource for ImageSequence {
    async fn open(&mut self) -> Result<()> {
        for frame in &self.frames {
            if let Frame::File(path) = frame {
                if !tokio::fs::try_exists(path).await? {
                    return Err(QrForgeError::NotFound(path.display().to_string()));
                }
            }
        }
        self.open = true;
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<Option<DynamicImage>> {
        match self.frames.pop_front() {
            None => Ok(None),
            Some(Frame::Image(img)) => Ok(Some(img)),
            Some(Frame::File(path)) => {
                let bytes = tokio::fs::read(&path).await?;
                image::load_from_memory(&bytes)
                    .map(Some)
                    .map_err(|e| QrForgeError::Decode(format!("{}: {}", path.display(), e)))
            }
        }
    }

    async fn close(&mut self) {
        self.frames.clear();
        self.open = false;
    }
}
