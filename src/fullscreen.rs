// fullscreen.rs: presentation-mode toggle
//
// Fullscreen is a best-effort enhancement. Requests may be refused or may
// silently do nothing, so `is_fullscreen` only changes when the platform
// reports that the window actually changed.

use std::sync::Arc;
use thiserror::Error;
use winit::window::{Fullscreen, Window};

#[derive(Debug, Error)]
pub enum FullscreenError {
    #[error("fullscreen is not available on this display")]
    Unsupported,
    #[error("fullscreen request rejected: {0}")]
    Rejected(String),
}

/// Platform fullscreen capability, bound to one container.
pub trait FullscreenPort {
    fn request_enter(&mut self) -> Result<(), FullscreenError>;
    fn request_exit(&mut self) -> Result<(), FullscreenError>;
    /// Reports the new state after the platform changed it.
    fn poll_change(&mut self) -> Option<bool>;
}

#[derive(Debug)]
pub struct FullscreenManager<F: FullscreenPort> {
    port: F,
    is_fullscreen: bool,
    /// Last accepted request the platform has not reported back on yet.
    requested: Option<bool>,
}

impl<F: FullscreenPort> FullscreenManager<F> {
    pub fn new(port: F) -> Self {
        Self {
            port,
            is_fullscreen: false,
            requested: None,
        }
    }

    pub fn is_fullscreen(&self) -> bool {
        self.is_fullscreen
    }

    pub fn port(&self) -> &F {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut F {
        &mut self.port
    }

    /// Asks the platform to enter or leave fullscreen. Rejections are
    /// swallowed; the control simply has no effect.
    pub fn toggle(&mut self) {
        let target = !self.is_fullscreen;
        let result = if target {
            self.port.request_enter()
        } else {
            self.port.request_exit()
        };
        match result {
            Ok(()) => self.requested = Some(target),
            Err(e) => log::debug!("fullscreen toggle ignored: {e}"),
        }
    }

    /// Leaves fullscreen, including an enter that is still in flight.
    pub fn exit(&mut self) {
        if !self.is_fullscreen && self.requested != Some(true) {
            return;
        }
        match self.port.request_exit() {
            Ok(()) => self.requested = Some(false),
            Err(e) => log::debug!("fullscreen exit ignored: {e}"),
        }
    }

    /// Syncs with the platform. Returns the new state when it changed.
    pub fn observe(&mut self) -> Option<bool> {
        let now = self.port.poll_change()?;
        self.requested = None;
        if now == self.is_fullscreen {
            return None;
        }
        self.is_fullscreen = now;
        Some(now)
    }
}

/// Borderless fullscreen on the window's current monitor.
pub struct WindowFullscreen {
    window: Arc<Window>,
    observed: bool,
}

impl WindowFullscreen {
    pub fn new(window: Arc<Window>) -> Self {
        let observed = window.fullscreen().is_some();
        Self { window, observed }
    }
}

impl FullscreenPort for WindowFullscreen {
    fn request_enter(&mut self) -> Result<(), FullscreenError> {
        if self.window.available_monitors().next().is_none() {
            return Err(FullscreenError::Unsupported);
        }
        self.window
            .set_fullscreen(Some(Fullscreen::Borderless(self.window.current_monitor())));
        Ok(())
    }

    fn request_exit(&mut self) -> Result<(), FullscreenError> {
        self.window.set_fullscreen(None);
        Ok(())
    }

    fn poll_change(&mut self) -> Option<bool> {
        let now = self.window.fullscreen().is_some();
        if now == self.observed {
            return None;
        }
        self.observed = now;
        Some(now)
    }
}
