//! StreamingLoader: one background worker decoding a whole video collection
//! into a bounded queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};

use super::decoder::DecoderBackend;
use super::{Frame, FrameSource, VideoCollection};
use crate::config::ConfigError;

/// Configuration for the StreamingLoader.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Frames discarded before each frame that is kept
    pub skip_n_frames: u32,
    /// Capacity of the frame queue
    pub queue_size: usize,
    /// Producer sleep while the queue is full
    pub backoff_ms: u64,
    /// How long a consumer `read` blocks on an empty queue
    pub read_timeout_ms: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            skip_n_frames: 9,
            queue_size: 500,
            backoff_ms: 100,
            read_timeout_ms: 100,
        }
    }
}

impl LoaderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_size == 0 {
            return Err(ConfigError::invalid("loader.queue_size", "must be greater than 0"));
        }
        if self.backoff_ms == 0 {
            return Err(ConfigError::invalid("loader.backoff_ms", "must be greater than 0"));
        }
        if self.read_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "loader.read_timeout_ms",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot {action} a loader that is {state:?}")]
    InvalidState {
        action: &'static str,
        state: LoaderState,
    },
    #[error("failed to spawn the decode worker: {0}")]
    Spawn(#[source] std::io::Error),
}

pub struct StreamingLoader {
    config: LoaderConfig,
    backend: Arc<dyn DecoderBackend>,
    state: LoaderState,
    collection: Option<VideoCollection>,
    receiver: Option<Receiver<Frame>>,
    stop_requested: Arc<AtomicBool>,
    producer_finished: Arc<AtomicBool>,
    worker: Option<JoinHandle<VideoCollection>>,
}

impl StreamingLoader {
    pub fn new(
        collection: VideoCollection,
        backend: Arc<dyn DecoderBackend>,
        config: LoaderConfig,
    ) -> Result<Self, LoaderError> {
        config.validate()?;
        Ok(Self {
            config,
            backend,
            state: LoaderState::Idle,
            collection: Some(collection),
            receiver: None,
            stop_requested: Arc::new(AtomicBool::new(false)),
            producer_finished: Arc::new(AtomicBool::new(false)),
            worker: None,
        })
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Idle -> Running: spawn the decode worker.
    pub fn start(&mut self) -> Result<(), LoaderError> {
        if self.state != LoaderState::Idle {
            return Err(LoaderError::InvalidState {
                action: "start",
                state: self.state(),
            });
        }
        let collection = self.collection.take().unwrap_or_default();
        let (sender, receiver) = crossbeam_channel::bounded(self.config.queue_size);

        let worker = Worker {
            collection,
            backend: Arc::clone(&self.backend),
            sender,
            stop_requested: Arc::clone(&self.stop_requested),
            producer_finished: Arc::clone(&self.producer_finished),
            skip_n_frames: self.config.skip_n_frames,
            backoff: Duration::from_millis(self.config.backoff_ms),
        };
        let handle = thread::Builder::new()
            .name("frame-loader".to_string())
            .spawn(move || worker.run())
            .map_err(LoaderError::Spawn)?;

        log::info!(
            "frame loader started (queue_size={}, skip_n_frames={})",
            self.config.queue_size,
            self.config.skip_n_frames
        );
        self.receiver = Some(receiver);
        self.worker = Some(handle);
        self.state = LoaderState::Running;
        Ok(())
    }

    /// Pop the next frame, waiting at most `read_timeout_ms`.
    ///
    /// `None` means nothing arrived in time or the stream is exhausted; use
    /// [`more`](Self::more) to tell the two apart.
    pub fn read(&self) -> Option<Frame> {
        let receiver = self.receiver.as_ref()?;
        match receiver.recv_timeout(Duration::from_millis(self.config.read_timeout_ms)) {
            Ok(frame) => Some(frame),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Whether more frames may still arrive: queued frames, or a producer that
    /// has not finished.
    pub fn more(&self) -> bool {
        match &self.receiver {
            Some(receiver) => {
                // Flag first: once it is set every frame has already been queued.
                let finished = self.producer_finished.load(Ordering::Acquire);
                !finished || !receiver.is_empty()
            }
            None => false,
        }
    }

    /// Frames currently waiting in the queue.
    pub fn queue_len(&self) -> usize {
        self.receiver.as_ref().map_or(0, Receiver::len)
    }

    pub fn state(&self) -> LoaderState {
        if self.state == LoaderState::Running && self.producer_finished.load(Ordering::Acquire) {
            LoaderState::Stopped
        } else {
            self.state
        }
    }

    /// Ask the worker to stop and wait until it has released its decoder and exited.
    ///
    /// Idempotent. Queued frames stay readable afterwards.
    pub fn stop(&mut self) {
        match self.state {
            LoaderState::Stopped | LoaderState::Stopping => return,
            LoaderState::Idle => {
                self.state = LoaderState::Stopped;
                return;
            }
            LoaderState::Running => {}
        }

        self.state = LoaderState::Stopping;
        self.stop_requested.store(true, Ordering::Release);
        if let Some(handle) = self.worker.take() {
            match handle.join() {
                Ok(collection) => self.collection = Some(collection),
                Err(_) => log::error!("frame loader worker panicked"),
            }
        }
        self.state = LoaderState::Stopped;
        log::info!("frame loader stopped");
    }

    /// Stop the loader and take back the video collection, e.g. to `reset` it
    /// and stream it again.
    pub fn into_collection(mut self) -> Option<VideoCollection> {
        self.stop();
        self.collection.take()
    }
}

impl Drop for StreamingLoader {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Raises the producer-finished flag when the worker returns or unwinds.
struct FinishedFlag(Arc<AtomicBool>);

impl Drop for FinishedFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}

struct Worker {
    collection: VideoCollection,
    backend: Arc<dyn DecoderBackend>,
    sender: Sender<Frame>,
    stop_requested: Arc<AtomicBool>,
    producer_finished: Arc<AtomicBool>,
    skip_n_frames: u32,
    backoff: Duration,
}

impl Worker {
    fn run(mut self) -> VideoCollection {
        // Declared first so it is dropped last, after the source, even on panic.
        let _finished = FinishedFlag(Arc::clone(&self.producer_finished));
        let mut source: Option<FrameSource> = None;

        while !self.stop_requested.load(Ordering::Acquire) {
            if source.is_none() {
                match self.open_next() {
                    Some(next) => source = Some(next),
                    None => break,
                }
            }
            let Some(current) = source.as_mut() else {
                break;
            };

            match current.next_frame() {
                Some(frame) => {
                    if !self.push(frame) {
                        break;
                    }
                }
                // The source has already released its decoder
                None => source = None,
            }
        }

        drop(source);
        log::debug!("frame loader worker exiting");
        self.collection
    }

    /// Open the next readable video; unreadable ones are logged and skipped.
    fn open_next(&mut self) -> Option<FrameSource> {
        while let Some(video) = self.collection.advance() {
            match FrameSource::open(video, self.backend.as_ref(), self.skip_n_frames) {
                Ok(source) => return Some(source),
                Err(e) => log::warn!("skipping video {}: {}", video.id(), e),
            }
        }
        None
    }

    /// Enqueue a frame, sleeping while the queue is full. Returns false when
    /// the loader is stopping or the consumer is gone.
    fn push(&self, frame: Frame) -> bool {
        let mut pending = frame;
        loop {
            match self.sender.try_send(pending) {
                Ok(()) => return true,
                Err(TrySendError::Full(frame)) => {
                    if self.stop_requested.load(Ordering::Acquire) {
                        return false;
                    }
                    log::trace!("frame queue full, backing off");
                    pending = frame;
                    thread::sleep(self.backoff);
                }
                Err(TrySendError::Disconnected(_)) => return false,
            }
        }
    }
}
