// clock.rs: virtual interval timers
//
// The viewer runs on one event loop. Instead of OS timers, every periodic job
// is an interval in this queue and the host advances it with elapsed frame
// time. Tests advance it by hand.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    Autoplay,
    LoadProgress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Interval {
    id: TimerId,
    kind: TimerKind,
    period: Duration,
    next_due: Duration,
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    now: Duration,
    next_id: u64,
    intervals: Vec<Interval>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time since the queue was created.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// First firing is one full period from now.
    pub fn set_interval(&mut self, kind: TimerKind, period: Duration) -> TimerId {
        let period = period.max(Duration::from_millis(1));
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.intervals.push(Interval {
            id,
            kind,
            period,
            next_due: self.now.saturating_add(period),
        });
        id
    }

    pub fn clear(&mut self, id: TimerId) -> bool {
        let before = self.intervals.len();
        self.intervals.retain(|i| i.id != id);
        self.intervals.len() != before
    }

    pub fn clear_all(&mut self) {
        self.intervals.clear();
    }

    pub fn pending(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.intervals.iter().any(|i| i.id == id)
    }

    /// Pops the earliest interval due at or before `until`, moving the clock
    /// to its due time and rescheduling it. Ties fire in creation order.
    ///
    /// Call in a loop; the caller may clear timers between firings.
    pub fn pop_due(&mut self, until: Duration) -> Option<(TimerId, TimerKind)> {
        let interval = self
            .intervals
            .iter_mut()
            .filter(|i| i.next_due <= until)
            .min_by_key(|i| (i.next_due, i.id))?;

        self.now = self.now.max(interval.next_due);
        interval.next_due = interval.next_due.saturating_add(interval.period);
        Some((interval.id, interval.kind))
    }

    /// Moves the clock to `until` once every due interval has been popped.
    pub fn settle(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(q: &mut TimerQueue, dt: Duration) -> Vec<TimerKind> {
        let until = q.now() + dt;
        let mut fired = Vec::new();
        while let Some((_, kind)) = q.pop_due(until) {
            fired.push(kind);
        }
        q.settle(until);
        fired
    }

    #[test]
    fn fires_once_per_period() {
        let mut q = TimerQueue::new();
        q.set_interval(TimerKind::Autoplay, Duration::from_millis(16));
        assert_eq!(drain(&mut q, Duration::from_millis(15)).len(), 0);
        assert_eq!(drain(&mut q, Duration::from_millis(1)).len(), 1);
        assert_eq!(drain(&mut q, Duration::from_millis(144)).len(), 9);
        assert_eq!(q.now(), Duration::from_millis(160));
    }

    #[test]
    fn interleaves_by_due_time() {
        let mut q = TimerQueue::new();
        q.set_interval(TimerKind::LoadProgress, Duration::from_millis(30));
        q.set_interval(TimerKind::Autoplay, Duration::from_millis(20));
        let fired = drain(&mut q, Duration::from_millis(60));
        assert_eq!(
            fired,
            vec![
                TimerKind::Autoplay,     // 20
                TimerKind::LoadProgress, // 30
                TimerKind::Autoplay,     // 40
                TimerKind::LoadProgress, // 60 (created first)
                TimerKind::Autoplay,     // 60
            ]
        );
    }

    #[test]
    fn cleared_interval_stops_mid_batch() {
        let mut q = TimerQueue::new();
        let id = q.set_interval(TimerKind::Autoplay, Duration::from_millis(10));
        let until = Duration::from_millis(100);
        let mut count = 0;
        while let Some((fired, _)) = q.pop_due(until) {
            count += 1;
            if count == 3 {
                assert!(q.clear(fired));
            }
        }
        assert_eq!(count, 3);
        assert_eq!(q.pending(), 0);
        assert!(!q.is_pending(id));
        assert!(!q.clear(id));
    }

    #[test]
    fn clear_all_leaves_nothing_pending() {
        let mut q = TimerQueue::new();
        q.set_interval(TimerKind::Autoplay, Duration::from_millis(16));
        q.set_interval(TimerKind::LoadProgress, Duration::from_millis(200));
        assert_eq!(q.pending(), 2);
        q.clear_all();
        assert_eq!(q.pending(), 0);
        assert!(drain(&mut q, Duration::from_secs(5)).is_empty());
    }
}
