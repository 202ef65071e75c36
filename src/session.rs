// session.rs: one open viewer, its state and reducer
//
// Everything the viewer knows lives in `ViewerSession`. It is created when the
// viewer opens and torn down when it closes; nothing carries over between
// opens. Input arrives as `Message`s, time arrives through `advance`, and
// port completions are collected by `pump`.

use std::time::Duration;

use crate::autoplay::{AutoplayScheduler, AutoplayState};
use crate::clock::{TimerId, TimerKind, TimerQueue};
use crate::config::ViewerConfig;
use crate::fullscreen::{FullscreenManager, FullscreenPort};
use crate::gesture::{Gesture, GestureMapper, PointerInput};
use crate::loader::{ImageLoaderPort, LoadEvent, LoadProgressTracker, LoadState};
use crate::panorama::{Orientation, PanoramaResource};
use crate::projector::{Projection, Projector};
use crate::zoom::ZoomState;

/// Longest span a single `advance` will simulate.
pub const MAX_ADVANCE: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Message {
    Pointer(PointerInput),
    Wheel { delta_y: f32 },
    ZoomIn,
    ZoomOut,
    Reset,
    ToggleFullscreen,
    SetAutoRotate(bool),
}

#[derive(Debug)]
pub enum SessionEvent<I> {
    Progress(u8),
    Loaded(I),
    Failed(String),
    FullscreenChanged(bool),
}

pub struct ViewerSession<L: ImageLoaderPort, F: FullscreenPort> {
    resource: PanoramaResource,
    config: ViewerConfig,
    projector: Projector,
    orientation: Orientation,
    zoom: ZoomState,
    gestures: GestureMapper,
    autoplay: AutoplayScheduler,
    load: LoadProgressTracker<L>,
    fullscreen: FullscreenManager<F>,
    timers: TimerQueue,
    events: Vec<SessionEvent<L::Image>>,
    is_open: bool,
}

impl<L: ImageLoaderPort, F: FullscreenPort> ViewerSession<L, F> {
    /// Opens the viewer: starts the preload and, if asked, auto-rotation.
    pub fn open(
        resource: PanoramaResource,
        auto_rotate: bool,
        config: ViewerConfig,
        loader: L,
        fullscreen: F,
    ) -> Self {
        let mut session = Self {
            projector: Projector::from_config(&config),
            orientation: Orientation::default(),
            zoom: ZoomState::default(),
            gestures: GestureMapper::new(),
            autoplay: AutoplayScheduler::from_config(&config),
            load: LoadProgressTracker::new(loader, &config),
            fullscreen: FullscreenManager::new(fullscreen),
            timers: TimerQueue::new(),
            events: Vec::new(),
            is_open: true,
            resource,
            config,
        };

        log::info!("opening viewer for \"{}\"", session.resource.title);
        session.load.start(&session.resource.url, &mut session.timers);
        session
            .autoplay
            .set_enabled(auto_rotate, false, &mut session.timers);
        session
    }

    /// Applies one input message. Ignored once the viewer is closed.
    pub fn dispatch(&mut self, message: Message) {
        if !self.is_open {
            return;
        }

        match message {
            Message::Pointer(input) => self.pointer(input),
            Message::Wheel { delta_y } => {
                self.zoom.apply_wheel(delta_y, self.config.wheel_rate);
            }
            Message::ZoomIn => {
                self.zoom.zoom_in();
            }
            Message::ZoomOut => {
                self.zoom.zoom_out();
            }
            Message::Reset => {
                self.orientation = Orientation::reset();
                self.zoom.reset();
            }
            Message::ToggleFullscreen => self.fullscreen.toggle(),
            Message::SetAutoRotate(enabled) => {
                self.autoplay
                    .set_enabled(enabled, self.gestures.is_dragging(), &mut self.timers);
            }
        }
    }

    fn pointer(&mut self, input: PointerInput) {
        match self.gestures.handle(input) {
            Gesture::Began => self.autoplay.suspend(&mut self.timers),
            Gesture::Moved(delta) => {
                self.orientation = self
                    .orientation
                    .apply_drag(delta, self.config.drag_sensitivity);
            }
            Gesture::Ended => self.autoplay.resume(&mut self.timers),
            Gesture::Ignored => {}
        }
    }

    /// Runs every timer that falls due within `elapsed`, in order.
    /// `elapsed` is clamped to [`MAX_ADVANCE`]; wall-clock gaps belong in
    /// `advance_frame`.
    pub fn advance(&mut self, elapsed: Duration) {
        if !self.is_open {
            return;
        }
        if elapsed > MAX_ADVANCE {
            log::debug!("advance of {elapsed:?} clamped to {MAX_ADVANCE:?}");
        }
        let until = self.timers.now().saturating_add(elapsed.min(MAX_ADVANCE));
        while let Some((id, kind)) = self.timers.pop_due(until) {
            self.on_timer(id, kind);
        }
        self.timers.settle(until);
    }

    /// `advance` for a real frame gap. Long stalls are not replayed in full.
    pub fn advance_frame(&mut self, elapsed: Duration) {
        self.advance(elapsed.min(self.config.max_catchup()));
    }

    fn on_timer(&mut self, id: TimerId, kind: TimerKind) {
        match kind {
            TimerKind::Autoplay => {
                if let Some(next) = self.autoplay.tick(id, self.orientation) {
                    self.orientation = next;
                }
            }
            TimerKind::LoadProgress => {
                if let Some(percent) = self.load.tick(id) {
                    self.events.push(SessionEvent::Progress(percent));
                }
            }
        }
    }

    /// Collects port completions and queued progress, oldest first.
    pub fn pump(&mut self) -> Vec<SessionEvent<L::Image>> {
        if self.is_open {
            match self.load.poll(&mut self.timers) {
                Some(LoadEvent::Loaded(image)) => self.events.push(SessionEvent::Loaded(image)),
                Some(LoadEvent::Failed(reason)) => self.events.push(SessionEvent::Failed(reason)),
                None => {}
            }
        }
        if let Some(fullscreen) = self.fullscreen.observe() {
            self.events.push(SessionEvent::FullscreenChanged(fullscreen));
        }
        std::mem::take(&mut self.events)
    }

    /// Tears the session down: clears every timer, abandons the load, ends
    /// any drag and leaves fullscreen. Safe to call twice.
    pub fn close(&mut self) {
        if !self.is_open {
            return;
        }
        self.timers.clear_all();
        self.autoplay.teardown(&mut self.timers);
        self.load.cancel(&mut self.timers);
        self.gestures.end();
        self.fullscreen.exit();
        self.events.clear();
        self.is_open = false;
        log::info!("closed viewer for \"{}\"", self.resource.title);
    }

    pub fn projection(&self) -> Projection {
        self.projector
            .project(self.orientation, self.zoom.fov(), self.gestures.is_dragging())
    }

    pub fn resource(&self) -> &PanoramaResource {
        &self.resource
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn fov(&self) -> f32 {
        self.zoom.fov()
    }

    pub fn zoom(&self) -> &ZoomState {
        &self.zoom
    }

    pub fn load_state(&self) -> LoadState {
        self.load.state()
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn is_dragging(&self) -> bool {
        self.gestures.is_dragging()
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen.is_fullscreen()
    }

    pub fn auto_rotate_enabled(&self) -> bool {
        self.autoplay.is_enabled()
    }

    pub fn autoplay_state(&self) -> AutoplayState {
        self.autoplay.state()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.pending()
    }
}

impl<L: ImageLoaderPort, F: FullscreenPort> Drop for ViewerSession<L, F> {
    fn drop(&mut self) {
        self.close();
    }
}
