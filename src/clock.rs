use std::time::Instant;

/// Milliseconds since app start, read from a monotonic source.
///
/// The stopwatch core wants non-decreasing timestamps; `Instant` gives us
/// that even when the wall clock jumps.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn start() -> Self {
        MonotonicClock {
            origin: Instant::now(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}
