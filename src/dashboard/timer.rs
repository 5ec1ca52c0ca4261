/// Fixed-rate poll timer for the dashboard refresh loop.
///
/// The timer holds no thread and no clock of its own: callers pass the
/// current [`Instant`] in, which keeps tick boundaries deterministic in
/// tests. Ticks are scheduled on a fixed grid anchored at [`start`]:
/// the next tick is due one interval after the previous tick was *due*,
/// not after it finished, so request latency never stretches the cadence.
///
/// When a tick overruns the interval the next one is already due when it
/// returns, and fires right away rather than being dropped. After a longer
/// gap (e.g. the machine slept) exactly one tick fires, and the schedule
/// resumes at the first grid point after it.
///
/// [`start`]: PollTimer::start
use std::time::{Duration, Instant};

/// Default interval between dashboard refresh ticks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5_000);

#[derive(Debug, Clone)]
pub struct PollTimer {
    interval: Duration,
    next: Option<Instant>,
}

impl Default for PollTimer {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl PollTimer {
    /// A stopped timer. A zero interval is bumped to one millisecond.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            next: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Arm the timer; the first tick is due one interval after `now`.
    /// Restarting a running timer re-anchors it.
    pub fn start(&mut self, now: Instant) {
        self.next = Some(now + self.interval);
    }

    pub fn stop(&mut self) {
        self.next = None;
    }

    pub fn is_running(&self) -> bool {
        self.next.is_some()
    }

    /// When the next tick is due, if running.
    pub fn next_due(&self) -> Option<Instant> {
        self.next
    }

    /// Time left until the next tick (zero when overdue), if running.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.next.map(|due| due.saturating_duration_since(now))
    }

    /// Consume a due tick and schedule the following one.
    ///
    /// Returns `true` if a tick was due at `now`.
    pub fn fire(&mut self, now: Instant) -> bool {
        let Some(due) = self.next else {
            return false;
        };
        if now < due {
            return false;
        }

        let mut following = due + self.interval;
        while following <= now {
            following += self.interval;
        }
        self.next = Some(following);
        true
    }
}
