use crate::PacingConfig;

/// Time-driven release accounting for a simulated serial line.
///
/// Nothing runs in the background: each query recomputes how many bytes the
/// line would have delivered since `start`, one per `us_per_byte`. The line
/// never banks time while it has nothing queued, so data appended after an
/// idle spell is still released one byte-time at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacer {
    baud_rate: u32,
    us_per_byte: Option<u64>,
    start: u64,
    /// Unread bytes at the last observation.
    queued: usize,
}

impl Pacer {
    pub fn new(config: &PacingConfig, now: u64) -> Self {
        Self {
            baud_rate: config.baud_rate,
            us_per_byte: config.micros_per_byte(),
            start: now,
            queued: 0,
        }
    }

    pub fn unlimited() -> Self {
        Self::new(&PacingConfig::default(), 0)
    }

    /// Restarts the line at `now` with `queued` bytes already waiting.
    pub fn reset(&mut self, config: &PacingConfig, now: u64, queued: usize) {
        *self = Self::new(config, now);
        self.queued = queued;
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    pub fn micros_per_byte(&self) -> Option<u64> {
        self.us_per_byte
    }

    /// How many of `unread` bytes the line has delivered by `now`.
    pub fn releasable(&self, now: u64, unread: usize) -> usize {
        match self.us_per_byte {
            None => unread,
            Some(us) => {
                let slots = now.saturating_sub(self.start) / us;
                usize::try_from(slots).map_or(unread, |n| n.min(unread))
            }
        }
    }

    /// Like [`releasable`](Self::releasable), but first moves the reference up
    /// so that no more slots have accrued than bytes were queued at the last
    /// observation. Bytes that showed up since then start their slots at `now`.
    pub fn sync(&mut self, now: u64, unread: usize) -> usize {
        if let Some(us) = self.us_per_byte {
            let queued = self.queued.min(unread) as u64;
            let floor = now.saturating_sub(queued.saturating_mul(us));
            if self.start < floor {
                self.start = floor;
            }
        }
        self.queued = unread;
        self.releasable(now, unread)
    }

    /// Records that one released byte was consumed.
    pub fn on_release(&mut self) {
        self.queued = self.queued.saturating_sub(1);
        if let Some(us) = self.us_per_byte {
            self.start = self.start.saturating_add(us);
        }
    }

    /// Microseconds until one more byte is released, `None` when unpaced.
    pub fn micros_until_next(&self, now: u64) -> Option<u64> {
        let us = self.us_per_byte?;
        let elapsed = now.saturating_sub(self.start);
        Some(us - elapsed % us)
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::unlimited()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlimited_releases_everything() {
        let pacer = Pacer::unlimited();
        assert_eq!(pacer.releasable(0, 17), 17);
        assert_eq!(pacer.micros_until_next(0), None);
    }

    #[test]
    fn test_release_is_capped_by_unread() {
        let pacer = Pacer::new(&PacingConfig::with_baud(10_000), 100);
        assert_eq!(pacer.releasable(100, 10), 0);
        assert_eq!(pacer.releasable(2_600, 10), 2);
        assert_eq!(pacer.releasable(1_000_000, 10), 10);
    }

    #[test]
    fn test_clock_before_start_releases_nothing() {
        let pacer = Pacer::new(&PacingConfig::with_baud(10_000), 5_000);
        assert_eq!(pacer.releasable(1_000, 10), 0);
    }

    #[test]
    fn test_idle_time_is_not_banked() {
        let mut pacer = Pacer::new(&PacingConfig::with_baud(10_000), 0);
        assert_eq!(pacer.micros_per_byte(), Some(1_000));
        assert_eq!(pacer.sync(1_000_000, 0), 0);
        assert_eq!(pacer.sync(1_000_000, 10), 0);
        assert_eq!(pacer.sync(1_001_000, 10), 1);
    }

    #[test]
    fn test_sync_without_prior_observation_is_clamped() {
        let mut pacer = Pacer::new(&PacingConfig::with_baud(10_000), 0);
        assert_eq!(pacer.sync(1_000_000, 10), 0);
        assert_eq!(pacer.sync(1_002_500, 10), 2);
    }

    #[test]
    fn test_sync_matches_releasable_for_prefilled_line() {
        let mut pacer = Pacer::new(&PacingConfig::with_baud(10_000), 0);
        pacer.reset(&PacingConfig::with_baud(10_000), 0, 4);
        assert_eq!(pacer.sync(2_500, 4), 2);
        assert_eq!(pacer.sync(60_000, 4), 4);
        pacer.on_release();
        assert_eq!(pacer.sync(60_000, 3), 3);
    }

    #[test]
    fn test_on_release_moves_reference() {
        let mut pacer = Pacer::new(&PacingConfig::with_baud(10_000), 0);
        assert_eq!(pacer.releasable(2_500, 10), 2);
        pacer.on_release();
        assert_eq!(pacer.releasable(2_500, 9), 1);
        assert_eq!(pacer.micros_until_next(2_500), Some(500));
    }
}
