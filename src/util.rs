//! Frame timing statistics

use std::collections::VecDeque;
use std::fmt;
use std::time::Instant;

/// Rolling window of frame durations, in seconds
pub struct FrameStats {
    frame_times: VecDeque<f32>,
    capacity: usize,
}

impl FrameStats {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frame_times: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Add one frame, evicting the oldest once the window is full
    pub fn record(&mut self, dt: f32) {
        self.frame_times.push_back(dt);
        if self.frame_times.len() > self.capacity {
            self.frame_times.pop_front();
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frame_times.len()
    }

    fn mean(&self) -> f32 {
        self.frame_times.iter().sum::<f32>() / self.frame_times.len().max(1) as f32
    }

    pub fn avg_frame_time_ms(&self) -> f32 {
        self.mean() * 1000.0
    }

    pub fn avg_fps(&self) -> f32 {
        let avg = self.mean();
        if avg > 0.0 {
            1.0 / avg
        } else {
            0.0
        }
    }

    /// (slowest, fastest) frame rate in the window
    pub fn min_max_fps(&self) -> (f32, f32) {
        if self.frame_times.is_empty() {
            return (0.0, 0.0);
        }
        let min_dt = self.frame_times.iter().copied().fold(f32::INFINITY, f32::min);
        let max_dt = self.frame_times.iter().copied().fold(0.0, f32::max);
        let max_fps = if min_dt > 0.0 { 1.0 / min_dt } else { 0.0 };
        let min_fps = if max_dt > 0.0 { 1.0 / max_dt } else { 0.0 };
        (min_fps, max_fps)
    }

    /// Population standard deviation of frame times in milliseconds
    pub fn std_dev_ms(&self) -> f32 {
        if self.frame_times.len() < 2 {
            return 0.0;
        }
        let mean = self.mean();
        let variance = self
            .frame_times
            .iter()
            .map(|&dt| (dt - mean).powi(2))
            .sum::<f32>()
            / self.frame_times.len() as f32;
        variance.sqrt() * 1000.0
    }

    /// (p1, p50, p99) frame times in milliseconds
    pub fn percentiles_ms(&self) -> (f32, f32, f32) {
        if self.frame_times.is_empty() {
            return (0.0, 0.0, 0.0);
        }
        let mut sorted: Vec<f32> = self.frame_times.iter().copied().collect();
        sorted.sort_by(f32::total_cmp);

        let len = sorted.len();
        let p1_idx = (len as f32 * 0.01).floor() as usize;
        let p50_idx = len / 2;
        let p99_idx = ((len as f32 * 0.99).floor() as usize).min(len - 1);

        (
            sorted[p1_idx] * 1000.0,
            sorted[p50_idx] * 1000.0,
            sorted[p99_idx] * 1000.0,
        )
    }

    pub fn summary(&self) -> FrameSummary {
        let (min_fps, max_fps) = self.min_max_fps();
        let (p1_ms, p50_ms, p99_ms) = self.percentiles_ms();
        FrameSummary {
            frames: self.frame_count(),
            avg_ms: self.avg_frame_time_ms(),
            avg_fps: self.avg_fps(),
            min_fps,
            max_fps,
            p1_ms,
            p50_ms,
            p99_ms,
            std_dev_ms: self.std_dev_ms(),
        }
    }
}

/// Snapshot of [`FrameStats`] for logging
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSummary {
    pub frames: usize,
    pub avg_ms: f32,
    pub avg_fps: f32,
    pub min_fps: f32,
    pub max_fps: f32,
    pub p1_ms: f32,
    pub p50_ms: f32,
    pub p99_ms: f32,
    pub std_dev_ms: f32,
}

impl fmt::Display for FrameSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} frames: {:.0} fps avg ({:.0} min, {:.0} max), {:.2}ms avg, \
             p1 {:.2}ms p50 {:.2}ms p99 {:.2}ms, stddev {:.2}ms",
            self.frames,
            self.avg_fps,
            self.min_fps,
            self.max_fps,
            self.avg_ms,
            self.p1_ms,
            self.p50_ms,
            self.p99_ms,
            self.std_dev_ms
        )
    }
}

/// Wall-clock frame timer feeding a rolling [`FrameStats`] window
pub struct FpsCounter {
    stats: FrameStats,
    last_frame: Instant,
}

impl FpsCounter {
    /// Create a new FPS counter with specified sample window
    pub fn new(sample_count: usize) -> Self {
        Self {
            stats: FrameStats::new(sample_count),
            last_frame: Instant::now(),
        }
    }

    /// Call at the start of each frame; returns seconds since the last call
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.stats.record(dt);
        dt
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }
}
