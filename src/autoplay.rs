// autoplay.rs: idle auto-rotation
//
//   Disabled ──enable──▶ Idle ──drag begins──▶ Suspended
//      ▲                  │  ◀──drag ends────────┘
//      └────disable───────┘
//
// The interval only exists in Idle, so a tick can never land during a drag.

use std::time::Duration;

use crate::clock::{TimerId, TimerKind, TimerQueue};
use crate::config::ViewerConfig;
use crate::panorama::Orientation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoplayState {
    Disabled,
    Idle,
    Suspended,
}

#[derive(Debug)]
pub struct AutoplayScheduler {
    state: AutoplayState,
    timer: Option<TimerId>,
    interval: Duration,
    step_deg: f32,
}

impl AutoplayScheduler {
    pub fn new(interval: Duration, step_deg: f32) -> Self {
        Self {
            state: AutoplayState::Disabled,
            timer: None,
            interval,
            step_deg,
        }
    }

    pub fn from_config(config: &ViewerConfig) -> Self {
        Self::new(config.autoplay_interval(), config.autoplay_step_deg)
    }

    pub fn state(&self) -> AutoplayState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state != AutoplayState::Disabled
    }

    pub fn set_enabled(&mut self, enabled: bool, dragging: bool, timers: &mut TimerQueue) {
        match (enabled, self.state) {
            (false, _) => self.teardown(timers),
            (true, AutoplayState::Disabled) if dragging => self.state = AutoplayState::Suspended,
            (true, AutoplayState::Disabled) => self.start(timers),
            (true, _) => {}
        }
    }

    /// Called the moment a drag begins.
    pub fn suspend(&mut self, timers: &mut TimerQueue) {
        if self.state == AutoplayState::Idle {
            self.cancel_timer(timers);
            self.state = AutoplayState::Suspended;
        }
    }

    /// Called when the drag ends; rotation resumes only if still enabled.
    pub fn resume(&mut self, timers: &mut TimerQueue) {
        if self.state == AutoplayState::Suspended {
            self.start(timers);
        }
    }

    /// Applies one tick if `id` is the live autoplay interval.
    pub fn tick(&self, id: TimerId, orientation: Orientation) -> Option<Orientation> {
        (self.state == AutoplayState::Idle && self.timer == Some(id))
            .then(|| orientation.rotate_yaw(self.step_deg))
    }

    pub fn teardown(&mut self, timers: &mut TimerQueue) {
        self.cancel_timer(timers);
        self.state = AutoplayState::Disabled;
    }

    fn start(&mut self, timers: &mut TimerQueue) {
        self.cancel_timer(timers);
        self.timer = Some(timers.set_interval(TimerKind::Autoplay, self.interval));
        self.state = AutoplayState::Idle;
    }

    fn cancel_timer(&mut self, timers: &mut TimerQueue) {
        if let Some(id) = self.timer.take() {
            timers.clear(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(
        autoplay: &AutoplayScheduler,
        timers: &mut TimerQueue,
        mut o: Orientation,
        dt: Duration,
    ) -> Orientation {
        let until = timers.now() + dt;
        while let Some((id, _)) = timers.pop_due(until) {
            if let Some(next) = autoplay.tick(id, o) {
                o = next;
            }
        }
        timers.settle(until);
        o
    }

    #[test]
    fn disabled_by_default() {
        let a = AutoplayScheduler::from_config(&ViewerConfig::default());
        assert_eq!(a.state(), AutoplayState::Disabled);
        assert!(!a.is_enabled());
    }

    #[test]
    fn suspend_and_resume_around_drag() {
        let mut timers = TimerQueue::new();
        let mut a = AutoplayScheduler::from_config(&ViewerConfig::default());
        a.set_enabled(true, false, &mut timers);
        assert_eq!(a.state(), AutoplayState::Idle);

        let o = run(&a, &mut timers, Orientation::default(), Duration::from_millis(160));
        assert!((o.yaw - 1.0).abs() < 1e-4);

        a.suspend(&mut timers);
        assert_eq!(a.state(), AutoplayState::Suspended);
        assert_eq!(timers.pending(), 0);
        let held = run(&a, &mut timers, o, Duration::from_millis(500));
        assert_eq!(held, o);

        a.resume(&mut timers);
        assert_eq!(a.state(), AutoplayState::Idle);
        let moved = run(&a, &mut timers, held, Duration::from_millis(32));
        assert!(moved.yaw > held.yaw);
    }

    #[test]
    fn enabling_during_drag_waits_for_release() {
        let mut timers = TimerQueue::new();
        let mut a = AutoplayScheduler::from_config(&ViewerConfig::default());
        a.set_enabled(true, true, &mut timers);
        assert_eq!(a.state(), AutoplayState::Suspended);
        assert_eq!(timers.pending(), 0);
        a.resume(&mut timers);
        assert_eq!(timers.pending(), 1);
    }

    #[test]
    fn resume_after_disable_stays_disabled() {
        let mut timers = TimerQueue::new();
        let mut a = AutoplayScheduler::from_config(&ViewerConfig::default());
        a.set_enabled(true, false, &mut timers);
        a.suspend(&mut timers);
        a.set_enabled(false, true, &mut timers);
        a.resume(&mut timers);
        assert_eq!(a.state(), AutoplayState::Disabled);
        assert_eq!(timers.pending(), 0);
    }

    #[test]
    fn stale_timer_id_does_not_rotate() {
        let mut timers = TimerQueue::new();
        let mut a = AutoplayScheduler::from_config(&ViewerConfig::default());
        a.set_enabled(true, false, &mut timers);
        let stale = timers.set_interval(TimerKind::Autoplay, Duration::from_millis(16));
        assert_eq!(a.tick(stale, Orientation::default()), None);
    }
}
