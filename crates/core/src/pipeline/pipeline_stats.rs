use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Frame counters shared by the three stages of one pipeline run.
///
/// Counters are relaxed atomics: they are reported, never used for
/// synchronization.
#[derive(Debug)]
pub struct PipelineStats {
    captured: AtomicU64,
    capture_evicted: AtomicU64,
    processed: AtomicU64,
    processed_evicted: AtomicU64,
    dropped: AtomicU64,
    output: AtomicU64,
    started: Mutex<Instant>,
}

/// Point-in-time copy of [`PipelineStats`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub captured: u64,
    pub capture_evicted: u64,
    pub processed: u64,
    pub processed_evicted: u64,
    /// Frames discarded because a detector or segmenter failed on them.
    pub dropped: u64,
    pub output: u64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self {
            captured: AtomicU64::new(0),
            capture_evicted: AtomicU64::new(0),
            processed: AtomicU64::new(0),
            processed_evicted: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            output: AtomicU64::new(0),
            started: Mutex::new(Instant::now()),
        }
    }

    /// Zeroes every counter and restarts the clock.
    pub fn reset(&self) {
        for counter in [
            &self.captured,
            &self.capture_evicted,
            &self.processed,
            &self.processed_evicted,
            &self.dropped,
            &self.output,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        *self.started.lock().unwrap_or_else(|e| e.into_inner()) = Instant::now();
    }

    pub fn record_captured(&self, evicted: usize) {
        self.captured.fetch_add(1, Ordering::Relaxed);
        self.capture_evicted
            .fetch_add(evicted as u64, Ordering::Relaxed);
    }

    pub fn record_processed(&self, evicted: usize) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        self.processed_evicted
            .fetch_add(evicted as u64, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_output(&self) {
        self.output.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            captured: self.captured.load(Ordering::Relaxed),
            capture_evicted: self.capture_evicted.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            processed_evicted: self.processed_evicted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            output: self.output.load(Ordering::Relaxed),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .elapsed()
    }

    /// Formatted run report, or `None` if nothing was captured.
    pub fn summary_string(&self) -> Option<String> {
        format_summary(&self.snapshot(), self.elapsed())
    }
}

impl Default for PipelineStats {
    fn default() -> Self {
        Self::new()
    }
}

fn format_summary(s: &StatsSnapshot, elapsed: Duration) -> Option<String> {
    if s.captured == 0 {
        return None;
    }
    let secs = elapsed.as_secs_f64();
    let mut lines = vec![
        format!("Pipeline summary ({secs:.1}s):"),
        format!(
            "  captured : {:6}  (evicted before processing: {})",
            s.captured, s.capture_evicted
        ),
        format!(
            "  processed: {:6}  (evicted before output: {}, dropped on error: {})",
            s.processed, s.processed_evicted, s.dropped
        ),
        format!("  output   : {:6}", s.output),
    ];
    if s.output > 0 && secs > 0.0 {
        lines.push(format!("  Throughput: {:.1} fps", s.output as f64 / secs));
    }
    Some(lines.join("\n"))
}
