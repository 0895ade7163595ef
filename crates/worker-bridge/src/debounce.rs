/// Invalidation debouncer: a burst of edits inside the window collapses
/// to one rebuild, and at most one rebuild runs per window.
///
/// Time is an opaque millisecond tick supplied by the caller, so the
/// same code runs under native clocks and the worker's clock.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window_ms: u64,
    deadline: Option<u64>,
}

/// The rebuild cadence: one 16 ms frame.
pub const REBUILD_DEBOUNCE_MS: u64 = 16;

impl Debouncer {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            deadline: None,
        }
    }

    /// Record an invalidation. Later invalidations inside the window do
    /// not push the deadline further out — the first one wins, so a
    /// steady edit stream still rebuilds every window.
    pub fn mark(&mut self, now_ms: u64) {
        if self.deadline.is_none() {
            self.deadline = Some(now_ms + self.window_ms);
        }
    }

    pub fn pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// True exactly once when the window elapses; clears the mark.
    pub fn fire(&mut self, now_ms: u64) -> bool {
        match self.deadline {
            Some(deadline) if now_ms >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(REBUILD_DEBOUNCE_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_collapses_to_one_fire() {
        let mut d = Debouncer::new(16);
        d.mark(0);
        d.mark(5);
        d.mark(10);
        assert!(!d.fire(15));
        assert!(d.fire(16));
        assert!(!d.fire(17), "no second fire without a new mark");
    }

    #[test]
    fn steady_stream_fires_once_per_window() {
        let mut d = Debouncer::new(16);
        let mut fires = 0;
        for t in 0..100 {
            d.mark(t);
            if d.fire(t) {
                fires += 1;
            }
        }
        assert!(fires >= 5 && fires <= 7, "fires = {fires}");
    }
}
