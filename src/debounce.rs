use std::time::Duration;

use tokio::time::Instant;

/// Delay between the last edit and the render it triggers.
pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(100);

/// Cancel-on-supersede scheduler holding at most one pending value.
///
/// Scheduling replaces whatever is pending and restarts the delay, so a burst of edits
/// closer together than the delay yields exactly one value: the last one.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn schedule(&mut self, value: T, now: Instant) {
        if self.pending.is_some() {
            tracing::trace!("Superseding pending render");
        }
        self.pending = Some((now + self.delay, value));
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(d, _)| *d)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Takes the pending value if its deadline has been reached.
    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        match self.pending {
            Some((deadline, _)) if deadline <= now => self.pending.take().map(|(_, v)| v),
            _ => None,
        }
    }

    /// Takes the pending value regardless of its deadline.
    pub fn take_now(&mut self) -> Option<T> {
        self.pending.take().map(|(_, v)| v)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(DEBOUNCE_DELAY)
    }
}

#[cfg(test)]
mod debounce_tests {
    use std::time::Duration;

    use tokio::time::Instant;

    use super::Debouncer;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_burst_coalesces_to_last() {
        let t0 = Instant::now();
        let mut d = Debouncer::default();
        for (t, v) in [(0, "a"), (10, "ab"), (30, "abc"), (60, "abcd")] {
            d.schedule(v, t0 + ms(t));
            assert_eq!(d.take_due(t0 + ms(t)), None);
        }
        assert_eq!(d.deadline(), Some(t0 + ms(160)));
        assert_eq!(d.take_due(t0 + ms(100)), None);
        assert_eq!(d.take_due(t0 + ms(159)), None);
        assert_eq!(d.take_due(t0 + ms(160)), Some("abcd"));
        assert_eq!(d.take_due(t0 + ms(500)), None);
    }

    #[test]
    fn test_spaced_edits_each_fire() {
        let t0 = Instant::now();
        let mut d = Debouncer::default();
        d.schedule(1, t0);
        assert_eq!(d.take_due(t0 + ms(100)), Some(1));
        d.schedule(2, t0 + ms(150));
        assert_eq!(d.take_due(t0 + ms(250)), Some(2));
    }

    #[test]
    fn test_cancel_and_take_now() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(ms(50));
        d.schedule(1, t0);
        d.cancel();
        assert!(!d.is_pending());
        assert_eq!(d.take_due(t0 + ms(1000)), None);

        d.schedule(2, t0);
        assert_eq!(d.take_now(), Some(2));
        assert_eq!(d.deadline(), None);
    }
}
