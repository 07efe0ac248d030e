/// A single pending value that becomes ready after a quiet period.
///
/// Time is injected as milliseconds so callers (and tests) control the
/// clock. Queueing a new value discards the previous one and restarts the
/// wait from zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Debouncer<T> {
    delay_ms: u64,
    pending: Option<(T, u64)>,
}

impl<T> Debouncer<T> {
    pub const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    pub const fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    /// Replace any pending value and restart the quiet period at `now_ms`.
    pub fn queue(&mut self, value: T, now_ms: u64) {
        self.pending = Some((value, now_ms));
    }

    /// Take the pending value once the quiet period has elapsed.
    pub fn take_ready(&mut self, now_ms: u64) -> Option<T> {
        let (_, queued_at) = self.pending.as_ref()?;
        if now_ms.saturating_sub(*queued_at) < self.delay_ms {
            return None;
        }
        self.pending.take().map(|(value, _)| value)
    }

    /// Drop the pending value, returning it if there was one.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }

    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending value becomes ready, if any.
    pub fn deadline_ms(&self) -> Option<u64> {
        self.pending
            .as_ref()
            .map(|(_, queued_at)| queued_at.saturating_add(self.delay_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_ready_before_delay() {
        let mut debouncer = Debouncer::new(300);
        debouncer.queue("a", 1_000);
        assert_eq!(debouncer.take_ready(1_299), None);
        assert!(debouncer.is_pending());
    }

    #[test]
    fn test_ready_exactly_at_delay() {
        let mut debouncer = Debouncer::new(300);
        debouncer.queue("a", 1_000);
        assert_eq!(debouncer.take_ready(1_300), Some("a"));
        assert!(!debouncer.is_pending());
        assert_eq!(debouncer.take_ready(5_000), None);
    }

    #[test]
    fn test_requeue_restarts_window_and_replaces_value() {
        let mut debouncer = Debouncer::new(300);
        debouncer.queue("a", 0);
        debouncer.queue("b", 200);
        assert_eq!(debouncer.take_ready(300), None);
        assert_eq!(debouncer.deadline_ms(), Some(500));
        assert_eq!(debouncer.take_ready(500), Some("b"));
    }

    #[test]
    fn test_cancel_drops_pending_value() {
        let mut debouncer = Debouncer::new(300);
        debouncer.queue("a", 0);
        assert_eq!(debouncer.cancel(), Some("a"));
        assert_eq!(debouncer.take_ready(10_000), None);
        assert_eq!(debouncer.deadline_ms(), None);
    }

    #[test]
    fn test_clock_going_backwards_does_not_fire() {
        let mut debouncer = Debouncer::new(100);
        debouncer.queue(1, 500);
        assert_eq!(debouncer.take_ready(10), None);
    }
}
