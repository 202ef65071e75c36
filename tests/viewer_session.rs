// Scenario tests for a full viewer session, driven through mock ports.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use panorama_tour::autoplay::AutoplayState;
use panorama_tour::{
    FullscreenError, FullscreenPort, ImageLoaderPort, LoadError, Message, PanoramaResource,
    PointerInput, SessionEvent, TouchPhase, ViewerConfig, ViewerSession,
};

#[derive(Default)]
struct LoaderLog {
    started: Vec<String>,
    cancelled: usize,
    ready: Option<Result<u32, LoadError>>,
}

#[derive(Clone, Default)]
struct MockLoader(Rc<RefCell<LoaderLog>>);

impl ImageLoaderPort for MockLoader {
    type Image = u32;

    fn start(&mut self, url: &str) {
        self.0.borrow_mut().started.push(url.to_string());
    }

    fn poll(&mut self) -> Option<Result<u32, LoadError>> {
        self.0.borrow_mut().ready.take()
    }

    fn cancel(&mut self) {
        self.0.borrow_mut().cancelled += 1;
    }
}

#[derive(Default)]
struct ScreenLog {
    reject: bool,
    fullscreen: bool,
    pending: Option<bool>,
    exits: usize,
}

#[derive(Clone, Default)]
struct MockScreen(Rc<RefCell<ScreenLog>>);

impl FullscreenPort for MockScreen {
    fn request_enter(&mut self) -> Result<(), FullscreenError> {
        let mut s = self.0.borrow_mut();
        if s.reject {
            return Err(FullscreenError::Rejected("permission denied".into()));
        }
        s.pending = Some(true);
        Ok(())
    }

    fn request_exit(&mut self) -> Result<(), FullscreenError> {
        let mut s = self.0.borrow_mut();
        s.exits += 1;
        s.pending = Some(false);
        Ok(())
    }

    fn poll_change(&mut self) -> Option<bool> {
        let mut s = self.0.borrow_mut();
        let next = s.pending.take()?;
        if next == s.fullscreen {
            return None;
        }
        s.fullscreen = next;
        Some(next)
    }
}

type Session = ViewerSession<MockLoader, MockScreen>;

fn open(auto_rotate: bool) -> (Session, MockLoader, MockScreen) {
    let loader = MockLoader::default();
    let screen = MockScreen::default();
    let session = ViewerSession::open(
        PanoramaResource::new("tours/lobby.jpg", "Lobby").with_thumbnail("tours/lobby_thumb.jpg"),
        auto_rotate,
        ViewerConfig::default(),
        loader.clone(),
        screen.clone(),
    );
    (session, loader, screen)
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn mouse_down(x: i32, y: i32) -> Message {
    Message::Pointer(PointerInput::MouseDown { x, y })
}

fn mouse_move(x: i32, y: i32) -> Message {
    Message::Pointer(PointerInput::MouseMove { x, y })
}

#[test]
fn opening_starts_load_from_defaults() {
    let (session, loader, _) = open(false);
    assert_eq!(loader.0.borrow().started, vec!["tours/lobby.jpg".to_string()]);
    assert!(session.is_open());
    assert!(session.load_state().is_loading);
    assert_eq!(session.load_state().progress_percent, 0);
    assert_eq!(session.orientation().yaw, 0.0);
    assert_eq!(session.orientation().pitch, 0.0);
    assert_eq!(session.fov(), 75.0);
    assert!(!session.is_fullscreen());
    assert!(!session.auto_rotate_enabled());
    assert_eq!(session.resource().title, "Lobby");
}

#[test]
fn auto_rotate_advances_yaw_over_160ms() {
    let (mut session, _, _) = open(true);
    session.advance(ms(160));
    assert!((session.orientation().yaw - 1.0).abs() < 1e-4);
    assert_eq!(session.orientation().pitch, 0.0);
}

#[test]
fn drag_scenario_moves_yaw_and_pitch() {
    let (mut session, _, _) = open(false);
    session.dispatch(mouse_down(100, 100));
    session.dispatch(mouse_move(70, 160));
    assert!((session.orientation().yaw - -9.0).abs() < 1e-4);
    assert!((session.orientation().pitch - -18.0).abs() < 1e-4);
    session.dispatch(Message::Pointer(PointerInput::MouseUp));
    assert!(!session.is_dragging());
}

#[test]
fn drag_suspends_autoplay_until_release() {
    let (mut session, _, _) = open(true);

    session.advance(ms(160));
    let before_drag = session.orientation().yaw;
    assert!(before_drag > 0.0);

    session.dispatch(mouse_down(10, 10));
    assert_eq!(session.autoplay_state(), AutoplayState::Suspended);
    session.advance(ms(500));
    assert_eq!(session.orientation().yaw, before_drag);

    session.dispatch(Message::Pointer(PointerInput::MouseUp));
    assert_eq!(session.autoplay_state(), AutoplayState::Idle);
    session.advance(ms(160));
    assert!(session.orientation().yaw > before_drag);
}

#[test]
fn leaving_the_surface_ends_drag_and_resumes_autoplay() {
    let (mut session, _, _) = open(true);
    session.dispatch(mouse_down(0, 0));
    session.dispatch(Message::Pointer(PointerInput::Leave));
    assert!(!session.is_dragging());
    assert_eq!(session.autoplay_state(), AutoplayState::Idle);

    // late mouse-up after leave is a no-op
    let o = session.orientation();
    session.dispatch(Message::Pointer(PointerInput::MouseUp));
    session.dispatch(mouse_move(500, 500));
    assert_eq!(session.orientation(), o);
}

#[test]
fn touch_drag_matches_mouse_drag() {
    let (mut session, _, _) = open(false);
    let touch = |id, phase, x, y| Message::Pointer(PointerInput::Touch { id, phase, x, y });
    session.dispatch(touch(3, TouchPhase::Started, 100, 100));
    session.dispatch(touch(4, TouchPhase::Started, 300, 300));
    session.dispatch(touch(4, TouchPhase::Moved, 0, 0));
    session.dispatch(touch(3, TouchPhase::Moved, 70, 160));
    assert!((session.orientation().yaw - -9.0).abs() < 1e-4);
    assert!((session.orientation().pitch - -18.0).abs() < 1e-4);
    session.dispatch(touch(3, TouchPhase::Ended, 70, 160));
    assert!(!session.is_dragging());
}

#[test]
fn projection_is_direct_while_dragging() {
    let (mut session, _, _) = open(false);
    assert!(session.projection().smoothing.is_some());
    session.dispatch(mouse_down(0, 0));
    assert!(session.projection().smoothing.is_none());
    session.dispatch(mouse_move(40, 0));
    let p = session.projection();
    assert!((p.position_x - 56.0).abs() < 1e-4);
}

#[test]
fn wheel_and_buttons_zoom_within_range() {
    let (mut session, _, _) = open(false);
    session.dispatch(Message::Wheel { delta_y: -300.0 });
    assert_eq!(session.fov(), 60.0);
    for _ in 0..10 {
        session.dispatch(Message::ZoomIn);
    }
    assert_eq!(session.fov(), 30.0);
    for _ in 0..5 {
        session.dispatch(Message::Wheel { delta_y: 10_000.0 });
    }
    assert_eq!(session.fov(), 120.0);
    session.dispatch(Message::ZoomOut);
    assert_eq!(session.fov(), 120.0);
}

#[test]
fn zoom_and_rotation_in_the_same_frame() {
    let (mut session, _, _) = open(false);
    session.dispatch(mouse_down(0, 0));
    session.dispatch(Message::Wheel { delta_y: 100.0 });
    session.dispatch(mouse_move(10, 0));
    assert_eq!(session.fov(), 80.0);
    assert!((session.orientation().yaw - 3.0).abs() < 1e-4);
}

#[test]
fn reset_restores_defaults_from_any_state() {
    let (mut session, _, _) = open(true);
    session.dispatch(mouse_down(0, 0));
    session.dispatch(mouse_move(-900, 700));
    session.dispatch(Message::Pointer(PointerInput::MouseUp));
    session.dispatch(Message::ZoomIn);
    session.advance(ms(1000));

    session.dispatch(Message::Reset);
    assert_eq!(session.orientation().yaw, 0.0);
    assert_eq!(session.orientation().pitch, 0.0);
    assert_eq!(session.fov(), 75.0);
}

#[test]
fn progress_ticks_then_load_completes() {
    let (mut session, loader, _) = open(false);
    session.advance(ms(600));
    let events = session.pump();
    let progress: Vec<u8> = events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::Progress(p) => Some(*p),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![10, 20, 30]);

    session.advance(ms(10_000));
    assert_eq!(session.load_state().progress_percent, 90);

    loader.0.borrow_mut().ready = Some(Ok(42));
    let events = session.pump();
    assert!(events.iter().any(|e| matches!(e, SessionEvent::Loaded(42))));
    assert_eq!(session.load_state().progress_percent, 100);
    assert!(!session.load_state().is_loading);
    assert_eq!(session.pending_timers(), 0);
}

#[test]
fn load_failure_leaves_viewer_usable() {
    let (mut session, loader, _) = open(false);
    loader.0.borrow_mut().ready = Some(Err(LoadError::UnsupportedSource("x".into())));
    let events = session.pump();
    assert!(events.iter().any(|e| matches!(e, SessionEvent::Failed(_))));
    assert!(session.load_state().failed);
    assert!(!session.load_state().is_loading);
    assert_eq!(session.pending_timers(), 0);

    session.dispatch(Message::ZoomIn);
    assert_eq!(session.fov(), 65.0);
}

#[test]
fn closing_mid_load_leaves_no_timers() {
    let (mut session, loader, _) = open(true);
    session.advance(ms(400));
    assert_eq!(session.pending_timers(), 2);

    session.close();
    assert!(!session.is_open());
    assert_eq!(session.pending_timers(), 0);
    assert_eq!(loader.0.borrow().cancelled, 1);

    let orientation = session.orientation();
    let load = session.load_state();
    session.advance(ms(5_000));
    loader.0.borrow_mut().ready = Some(Ok(1));
    assert!(session.pump().is_empty());
    session.dispatch(Message::ZoomIn);
    assert_eq!(session.orientation(), orientation);
    assert_eq!(session.load_state(), load);
    assert_eq!(session.fov(), 75.0);
}

#[test]
fn fullscreen_rejection_is_swallowed() {
    let (mut session, _, screen) = open(false);
    screen.0.borrow_mut().reject = true;
    session.dispatch(Message::ToggleFullscreen);
    assert!(session.pump().is_empty());
    assert!(!session.is_fullscreen());
}

#[test]
fn fullscreen_follows_platform_events() {
    let (mut session, _, _) = open(false);
    session.dispatch(Message::ToggleFullscreen);
    assert!(!session.is_fullscreen());
    let events = session.pump();
    assert!(matches!(events.as_slice(), [SessionEvent::FullscreenChanged(true)]));
    assert!(session.is_fullscreen());
}

#[test]
fn closing_exits_fullscreen() {
    let (mut session, _, screen) = open(false);
    session.dispatch(Message::ToggleFullscreen);
    session.pump();
    assert!(session.is_fullscreen());

    session.close();
    assert_eq!(screen.0.borrow().exits, 1);
    session.close();
    assert_eq!(screen.0.borrow().exits, 1);
}

#[test]
fn closing_before_fullscreen_lands_still_exits() {
    let (mut session, _, screen) = open(false);
    session.dispatch(Message::ToggleFullscreen);
    session.close();
    assert_eq!(screen.0.borrow().exits, 1);

    let mut port = screen.clone();
    assert_eq!(port.poll_change(), None);
    assert!(!screen.0.borrow().fullscreen);
}

#[test]
fn dropping_an_open_session_cleans_up() {
    let (mut session, loader, screen) = open(true);
    session.dispatch(Message::ToggleFullscreen);
    session.pump();
    drop(session);
    assert_eq!(loader.0.borrow().cancelled, 1);
    assert_eq!(screen.0.borrow().exits, 1);
}

#[test]
fn toggling_auto_rotate_mid_session() {
    let (mut session, _, _) = open(false);
    session.advance(ms(160));
    assert_eq!(session.orientation().yaw, 0.0);

    session.dispatch(Message::SetAutoRotate(true));
    session.advance(ms(160));
    let yaw = session.orientation().yaw;
    assert!(yaw > 0.0);

    session.dispatch(Message::SetAutoRotate(false));
    session.advance(ms(160));
    assert_eq!(session.orientation().yaw, yaw);
}

#[test]
fn long_frame_gap_is_capped() {
    let (mut session, _, _) = open(true);
    session.advance_frame(Duration::from_secs(10));
    // 250 ms cap → 15 ticks of 16 ms
    assert!((session.orientation().yaw - 1.5).abs() < 1e-3);
}

#[test]
fn huge_advance_is_bounded() {
    let (mut session, _, _) = open(true);
    session.advance(Duration::MAX);
    session.advance(Duration::MAX);
    assert!(session.orientation().yaw.is_finite());
    assert!(session.orientation().yaw > 0.0);
    assert_eq!(session.load_state().progress_percent, 90);
    assert_eq!(session.pending_timers(), 2);
}

#[test]
fn each_open_starts_fresh() {
    let (mut first, _, _) = open(false);
    first.dispatch(Message::ZoomIn);
    first.close();
    let (second, _, _) = open(false);
    assert_eq!(second.fov(), 75.0);
    assert_eq!(second.load_state().progress_percent, 0);
}
