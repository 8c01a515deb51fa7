/// A virtual millisecond clock driven explicitly by the caller.
///
/// Nothing here reads wall-clock time; the live service advances it from
/// a tokio interval and tests advance it directly.
///
/// # Examples
///
/// ```
/// use household_sim::sim::clock::{Clock, Interval};
///
/// let mut clock = Clock::new();
/// let mut every_200 = Interval::new(200);
/// let mut fired = Vec::new();
///
/// clock.advance(450);
/// every_200.run_due(clock.now_ms(), |at| fired.push(at));
/// assert_eq!(fired, vec![200, 400]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Clock {
    /// Milliseconds elapsed since the clock was created.
    now_ms: u64,
}

impl Clock {
    /// Creates a clock at time zero.
    pub fn new() -> Self {
        Self { now_ms: 0 }
    }

    /// Current logical time in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Moves the clock forward by `ms` and returns the new time.
    pub fn advance(&mut self, ms: u64) -> u64 {
        self.now_ms = self.now_ms.saturating_add(ms);
        self.now_ms
    }
}

/// A fixed-period schedule on a [`Clock`].
///
/// The first firing happens one full period after creation, and missed
/// firings are all delivered when the clock jumps ahead.
#[derive(Debug, Clone)]
pub struct Interval {
    /// Period between firings in milliseconds.
    period_ms: u64,
    /// Logical time of the next firing.
    next_due_ms: u64,
}

impl Interval {
    /// Creates an interval with the given period.
    ///
    /// # Panics
    ///
    /// Panics if `period_ms` is zero.
    pub fn new(period_ms: u64) -> Self {
        assert!(period_ms > 0, "interval period must be > 0");
        Self {
            period_ms,
            next_due_ms: period_ms,
        }
    }

    /// Period between firings in milliseconds.
    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }

    /// Returns the next firing time at or before `now_ms` and schedules the
    /// following one, or `None` if nothing is due yet.
    pub fn poll(&mut self, now_ms: u64) -> Option<u64> {
        if self.next_due_ms <= now_ms {
            let at = self.next_due_ms;
            self.next_due_ms += self.period_ms;
            Some(at)
        } else {
            None
        }
    }

    /// Logical time of the next firing.
    pub fn next_due_ms(&self) -> u64 {
        self.next_due_ms
    }

    /// Consumes the next firing regardless of the current time and returns
    /// its scheduled time.
    pub fn fire_next(&mut self) -> u64 {
        let at = self.next_due_ms;
        self.next_due_ms += self.period_ms;
        at
    }

    /// Calls `f` with each firing time due at or before `now_ms`.
    pub fn run_due(&mut self, now_ms: u64, mut f: impl FnMut(u64)) {
        while let Some(at) = self.poll(now_ms) {
            f(at);
        }
    }
}
