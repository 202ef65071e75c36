// loader.rs: panorama preload with simulated progress
//
// Real loads give no byte-level progress, so a ticker nudges the percentage
// toward a cap (90% by default) while the image is in flight. The real load
// or error event then jumps straight to 100% or to the failed state.

use image::io::Reader as ImageReader;
use image::{GenericImageView, RgbaImage};
use std::{
    fs::File,
    io::BufReader,
    path::PathBuf,
    sync::mpsc::{channel, Receiver, Sender, TryRecvError},
    thread,
    time::Duration,
};
use thiserror::Error;

use crate::clock::{TimerId, TimerKind, TimerQueue};
use crate::config::ViewerConfig;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unsupported image source: {0}")]
    UnsupportedSource(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode error: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image loader stopped")]
    Disconnected,
}

/// Host image-loading primitive.
///
/// `start` must not block; the result is picked up later through `poll`.
pub trait ImageLoaderPort {
    type Image;

    fn start(&mut self, url: &str);
    fn poll(&mut self) -> Option<Result<Self::Image, LoadError>>;
    /// Abandons the current load. A result arriving afterwards is dropped.
    fn cancel(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadState {
    pub is_loading: bool,
    pub progress_percent: u8,
    pub failed: bool,
}

/// Terminal outcome of a load. Progress steps come from `tick`.
#[derive(Debug)]
pub enum LoadEvent<I> {
    Loaded(I),
    Failed(String),
}

pub struct LoadProgressTracker<L: ImageLoaderPort> {
    loader: L,
    state: LoadState,
    ticker: Option<TimerId>,
    interval: Duration,
    step: u8,
    cap: u8,
}

impl<L: ImageLoaderPort> LoadProgressTracker<L> {
    pub fn new(loader: L, config: &ViewerConfig) -> Self {
        Self {
            loader,
            state: LoadState::default(),
            ticker: None,
            interval: config.progress_interval(),
            step: config.progress_step,
            cap: config.progress_cap.min(99),
        }
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn start(&mut self, url: &str, timers: &mut TimerQueue) {
        self.stop_ticker(timers);
        self.state = LoadState {
            is_loading: true,
            progress_percent: 0,
            failed: false,
        };
        self.ticker = Some(timers.set_interval(TimerKind::LoadProgress, self.interval));
        log::info!("loading panorama {url}");
        self.loader.start(url);
    }

    /// Simulated progress step. Returns the new percentage when it moved.
    pub fn tick(&mut self, id: TimerId) -> Option<u8> {
        if self.ticker != Some(id) || !self.state.is_loading {
            return None;
        }
        let next = self.state.progress_percent.saturating_add(self.step).min(self.cap);
        if next == self.state.progress_percent {
            return None;
        }
        self.state.progress_percent = next;
        Some(next)
    }

    /// Checks the loader for a finished load. The ticker is cancelled before
    /// the terminal event is returned.
    pub fn poll(&mut self, timers: &mut TimerQueue) -> Option<LoadEvent<L::Image>> {
        if !self.state.is_loading {
            return None;
        }
        let result = self.loader.poll()?;
        self.stop_ticker(timers);
        self.state.is_loading = false;

        match result {
            Ok(image) => {
                self.state.progress_percent = 100;
                log::info!("panorama loaded");
                Some(LoadEvent::Loaded(image))
            }
            Err(e) => {
                self.state.failed = true;
                log::warn!("panorama failed to load: {e}");
                Some(LoadEvent::Failed(e.to_string()))
            }
        }
    }

    /// Stops everything without producing an event (viewer closed).
    pub fn cancel(&mut self, timers: &mut TimerQueue) {
        self.stop_ticker(timers);
        if self.state.is_loading {
            self.loader.cancel();
            self.state.is_loading = false;
        }
    }

    fn stop_ticker(&mut self, timers: &mut TimerQueue) {
        if let Some(id) = self.ticker.take() {
            timers.clear(id);
        }
    }
}

/// Decodes images on a worker thread and hands them back over a channel.
///
/// Accepts plain paths and `file://` URLs.
pub struct ThreadImageLoader {
    tx: Sender<(u64, Result<RgbaImage, LoadError>)>,
    rx: Receiver<(u64, Result<RgbaImage, LoadError>)>,
    generation: u64,
}

impl Default for ThreadImageLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadImageLoader {
    pub fn new() -> Self {
        let (tx, rx) = channel();
        Self { tx, rx, generation: 0 }
    }
}

impl ImageLoaderPort for ThreadImageLoader {
    type Image = RgbaImage;

    fn start(&mut self, url: &str) {
        self.generation += 1;
        let generation = self.generation;
        let tx = self.tx.clone();

        let path = match resolve_source(url) {
            Ok(p) => p,
            Err(e) => {
                let _ = tx.send((generation, Err(e)));
                return;
            }
        };

        thread::spawn(move || {
            let result = decode_file(path);
            // receiver gone means the viewer was torn down
            let _ = tx.send((generation, result));
        });
    }

    fn poll(&mut self) -> Option<Result<RgbaImage, LoadError>> {
        loop {
            match self.rx.try_recv() {
                Ok((generation, result)) if generation == self.generation => return Some(result),
                Ok(_) => continue,
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => return Some(Err(LoadError::Disconnected)),
            }
        }
    }

    fn cancel(&mut self) {
        self.generation += 1;
    }
}

pub fn resolve_source(url: &str) -> Result<PathBuf, LoadError> {
    let trimmed = url.trim();
    if let Some(rest) = trimmed.strip_prefix("file://") {
        return Ok(PathBuf::from(rest));
    }
    if trimmed.is_empty() || trimmed.contains("://") {
        return Err(LoadError::UnsupportedSource(url.to_string()));
    }
    Ok(PathBuf::from(trimmed))
}

fn decode_file(path: PathBuf) -> Result<RgbaImage, LoadError> {
    let file = File::open(&path)?;
    let mut reader = ImageReader::new(BufReader::new(file)).with_guessed_format()?;
    // 8K panoramas exceed the default decoder limits
    reader.no_limits();
    let img = reader.decode()?;
    let (w, h) = img.dimensions();
    log::debug!("decoded {} ({w}x{h})", path.display());
    Ok(img.to_rgba8())
}
