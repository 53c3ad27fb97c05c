use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    /// Timer is stopped; the tick was ignored
    Idle,
    Running,
    /// This tick drained the timer. Reported exactly once per start.
    Expired,
}

/// Per-question countdown driven by host ticks.
///
/// The timer never fires on its own. A stopped timer swallows ticks, so a
/// tick delivered after `stop()` can't leak into the next question.
#[derive(Debug, Clone)]
pub struct QuestionTimer {
    limit: Duration,
    remaining: Duration,
    running: bool,
}

impl QuestionTimer {
    pub fn new(limit: Duration) -> Self {
        Self {
            limit,
            remaining: limit,
            running: false,
        }
    }

    /// (Re)arm with the full limit. Any previous countdown is discarded.
    pub fn start(&mut self) {
        self.stop();
        self.remaining = self.limit;
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn tick(&mut self, elapsed: Duration) -> TimerTick {
        if !self.running {
            return TimerTick::Idle;
        }
        self.remaining = self.remaining.saturating_sub(elapsed);
        if self.remaining.is_zero() {
            self.running = false;
            TimerTick::Expired
        } else {
            TimerTick::Running
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whole seconds left, rounded up so "1" shows until the very end
    pub fn seconds_remaining(&self) -> u64 {
        let secs = self.remaining.as_secs();
        if self.remaining.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }

    /// Remaining share of the limit in 0.0..=1.0, for gauges
    pub fn fraction_remaining(&self) -> f64 {
        if self.limit.is_zero() {
            return 0.0;
        }
        (self.remaining.as_secs_f64() / self.limit.as_secs_f64()).clamp(0.0, 1.0)
    }
}
