//! Run statistics for a visualisation pass
//!
//! Counts batches, samples and list restarts, and accumulates the time spent
//! in forward passes and in rendering. The summary is logged at the end of a
//! run and can be serialised to JSON.

use serde::Serialize;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunMetrics {
    /// Forward passes completed
    pub batches: usize,
    /// Images written
    pub samples: usize,
    /// Times the image list wrapped back to its first entry
    pub restarts: usize,
    /// Total forward pass time in milliseconds
    pub forward_ms: f64,
    /// Total image read, draw and write time in milliseconds
    pub render_ms: f64,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_forward(&mut self, elapsed: Duration) {
        self.batches += 1;
        self.forward_ms += elapsed.as_secs_f64() * 1000.0;
    }

    pub fn record_sample(&mut self, elapsed: Duration) {
        self.samples += 1;
        self.render_ms += elapsed.as_secs_f64() * 1000.0;
    }

    pub fn record_restart(&mut self) {
        self.restarts += 1;
    }

    /// Mean forward pass time, 0 before the first batch
    pub fn avg_forward_ms(&self) -> f64 {
        if self.batches == 0 {
            0.0
        } else {
            self.forward_ms / self.batches as f64
        }
    }

    /// Mean per-image render time, 0 before the first sample
    pub fn avg_render_ms(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.render_ms / self.samples as f64
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "batches": self.batches,
            "samples": self.samples,
            "restarts": self.restarts,
            "forward_ms": self.forward_ms,
            "render_ms": self.render_ms,
            "avg_forward_ms": self.avg_forward_ms(),
            "avg_render_ms": self.avg_render_ms(),
        })
    }
}

/// Wall-clock timer for one step
pub struct StepTimer {
    start: Instant,
}

impl StepTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
