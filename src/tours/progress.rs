use std::sync::Mutex;
/// Progress callback for tour detection phases.
///
/// Implementations receive phase transitions and per-item progress updates
/// while a trip collection is processed. Detection runs users on parallel
/// threads, so implementations must be `Send + Sync`. Callbacks are purely
/// observational and never influence the detected tours.
use std::sync::atomic::{AtomicU32, Ordering};

use crate::Tour;

/// Detection phases, ordered by execution sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionPhase {
    /// Schema validation of every input trip
    Validating,
    /// Partitioning trips by user and sorting each sequence chronologically
    Sorting,
    /// Per-user window scan, one item per user
    Detecting,
    /// Concatenating per-user results and assigning tour ids
    Merging,
}

impl DetectionPhase {
    /// Returns the phase name as a stable string key.
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionPhase::Validating => "validating",
            DetectionPhase::Sorting => "sorting",
            DetectionPhase::Detecting => "detecting",
            DetectionPhase::Merging => "merging",
        }
    }
}

/// Trait for receiving progress updates during tour detection.
///
/// Called from parallel rayon threads. Implementations must be thread-safe.
pub trait DetectionProgressCallback: Send + Sync {
    /// Called when entering a new phase. `total` is the number of items in this phase.
    fn on_phase(&self, phase: DetectionPhase, total: u32);
    /// Called after completing one item in the current phase.
    fn on_progress(&self);
    /// Called once per tour as it is assigned its final id.
    fn on_tour(&self, _tour: &Tour) {}
}

/// No-op implementation used by the plain entry point.
pub struct NoopProgress;

impl DetectionProgressCallback for NoopProgress {
    fn on_phase(&self, _phase: DetectionPhase, _total: u32) {}
    fn on_progress(&self) {}
}

/// Simple atomic progress tracker that can be polled from another thread.
/// Useful for testing and as a reference implementation.
pub struct AtomicProgressTracker {
    pub phase: Mutex<String>,
    pub completed: AtomicU32,
    pub total: AtomicU32,
    pub tours_seen: AtomicU32,
}

impl Default for AtomicProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl AtomicProgressTracker {
    pub fn new() -> Self {
        Self {
            phase: Mutex::new(String::new()),
            completed: AtomicU32::new(0),
            total: AtomicU32::new(0),
            tours_seen: AtomicU32::new(0),
        }
    }
}

impl DetectionProgressCallback for AtomicProgressTracker {
    fn on_phase(&self, phase: DetectionPhase, total: u32) {
        *self.phase.lock().unwrap() = phase.as_str().to_string();
        self.completed.store(0, Ordering::SeqCst);
        self.total.store(total, Ordering::SeqCst);
    }

    fn on_progress(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    fn on_tour(&self, _tour: &Tour) {
        self.tours_seen.fetch_add(1, Ordering::SeqCst);
    }
}
