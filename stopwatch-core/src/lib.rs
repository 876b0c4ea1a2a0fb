//! Pure stopwatch logic with no platform dependencies.
//! Testable on host, usable from any frontend.

/// Elapsed-time and lap bookkeeping for a single stopwatch session.
///
/// The caller owns the clock: `advance` is handed a millisecond timestamp
/// on every refresh tick and folds the delta into the elapsed total while
/// the stopwatch is running. All operations are total; recording a lap
/// while paused is a no-op by contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stopwatch {
    running: bool,
    elapsed_ms: u64,
    last_tick_ms: Option<u64>,
    last_lap_boundary_ms: u64,
    laps: Vec<u64>,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self {
            running: false,
            elapsed_ms: 0,
            last_tick_ms: None,
            last_lap_boundary_ms: 0,
            laps: vec![0],
        }
    }

    /// Accumulate the time since the previous tick.
    ///
    /// `now_ms` values must be non-decreasing; a regressing clock is not
    /// defended against beyond saturating arithmetic. The first tick after
    /// starting only establishes the baseline.
    pub fn advance(&mut self, now_ms: u64) {
        if self.running {
            if let Some(prev) = self.last_tick_ms {
                self.elapsed_ms = self
                    .elapsed_ms
                    .saturating_add(now_ms.saturating_sub(prev));
            }
            self.last_tick_ms = Some(now_ms);
        } else {
            self.last_tick_ms = None;
        }
    }

    /// Start when stopped, pause when running. The elapsed total is left
    /// untouched; the next `advance` sets a fresh baseline.
    pub fn toggle_run(&mut self) {
        self.running = !self.running;
    }

    /// Record the segment since the previous lap boundary. No-op unless
    /// running.
    pub fn record_lap(&mut self) {
        if !self.running {
            return;
        }
        let delta = self.elapsed_ms.saturating_sub(self.last_lap_boundary_ms);
        self.laps.push(delta);
        self.last_lap_boundary_ms = self.elapsed_ms;
    }

    /// Back to the initial state: stopped, zero elapsed, sentinel lap only.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Lap segment durations in insertion order, sentinel `0` first.
    pub fn laps(&self) -> &[u64] {
        &self.laps
    }

    /// The most recently recorded lap segment.
    pub fn latest_lap_ms(&self) -> u64 {
        self.laps.last().copied().unwrap_or(0)
    }

    /// Elapsed value at the most recent lap boundary.
    pub fn last_lap_boundary_ms(&self) -> u64 {
        self.last_lap_boundary_ms
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Format milliseconds as "HH:MM:SS.CC" (hundredths truncated, not rounded).
/// Hours widen past two digits when the value demands it.
pub fn format_duration(ms: u64) -> String {
    let total_secs = ms / 1000;
    let cs = (ms % 1000) / 10;
    let h = total_secs / 3600;
    let m = (total_secs % 3600) / 60;
    let s = total_secs % 60;
    format!("{:02}:{:02}:{:02}.{:02}", h, m, s, cs)
}
