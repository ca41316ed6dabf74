use std::sync::atomic::{AtomicU64, Ordering};

use indicatif::ProgressBar;

/// Receives one tick per visited `(i, j)` pair
pub trait ProgressSink: Sync {
    fn set_length(&self, _total: u64) {}

    fn inc(&self, delta: u64);

    fn finish(&self) {}
}

/// Discards every tick
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn inc(&self, _delta: u64) {}
}

/// Counts ticks; usable from several workers at once
#[derive(Debug, Default)]
pub struct ProgressCounter {
    total: AtomicU64,
    done: AtomicU64,
}

impl ProgressCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn done(&self) -> u64 {
        self.done.load(Ordering::Relaxed)
    }
}

impl ProgressSink for ProgressCounter {
    fn set_length(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
    }

    fn inc(&self, delta: u64) {
        self.done.fetch_add(delta, Ordering::Relaxed);
    }
}

impl ProgressSink for ProgressBar {
    fn set_length(&self, total: u64) {
        ProgressBar::set_length(self, total);
    }

    fn inc(&self, delta: u64) {
        ProgressBar::inc(self, delta);
    }

    fn finish(&self) {
        ProgressBar::finish(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_accumulates() {
        let counter = ProgressCounter::new();
        counter.set_length(10);
        counter.inc(3);
        counter.inc(4);
        assert_eq!(counter.total(), 10);
        assert_eq!(counter.done(), 7);
    }

    #[test]
    fn test_hidden_bar_tracks_position() {
        let bar = ProgressBar::hidden();
        let sink: &dyn ProgressSink = &bar;
        sink.set_length(5);
        sink.inc(2);
        assert_eq!(bar.position(), 2);
        assert_eq!(bar.length(), Some(5));
    }
}
