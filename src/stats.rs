use std::collections::VecDeque;

use instant::Duration;

/// Frame timing collected between two reports.
#[derive(Debug, Default, Clone)]
pub struct FrameStats {
    frames: u32,
    elapsed: Duration,
    slowest: Duration,
}

/// Summary handed out by [`FrameStats::take`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub frames: u32,
    pub fps: f32,
    pub mean_frame_ms: f32,
    pub slowest_frame_ms: f32,
}

impl FrameStats {
    pub fn record(&mut self, dt: Duration) {
        self.frames += 1;
        self.elapsed += dt;
        self.slowest = self.slowest.max(dt);
    }

    /// Returns the report for the frames recorded so far and starts over.
    /// `None` if no frame was recorded.
    pub fn take(&mut self) -> Option<FrameReport> {
        let stats = std::mem::take(self);
        if stats.frames == 0 {
            return None;
        }
        let secs = stats.elapsed.as_secs_f32();
        let fps = if secs > 0.0 {
            stats.frames as f32 / secs
        } else {
            0.0
        };
        Some(FrameReport {
            frames: stats.frames,
            fps,
            mean_frame_ms: secs * 1000.0 / stats.frames as f32,
            slowest_frame_ms: stats.slowest.as_secs_f32() * 1000.0,
        })
    }
}

/// The most recent frame rates, oldest first, for the on-screen graph.
/// Heights are relative to the highest rate seen since start up.
#[derive(Debug, Clone)]
pub struct FpsHistory {
    samples: VecDeque<f32>,
    capacity: usize,
    peak: f32,
}

impl FpsHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            peak: 0.0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn peak(&self) -> f32 {
        self.peak
    }

    pub fn push(&mut self, fps: f32) {
        if self.capacity == 0 || !fps.is_finite() {
            return;
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        let fps = fps.max(0.0);
        self.samples.push_back(fps);
        self.peak = self.peak.max(fps);
    }

    /// Each sample as a fraction of the peak, oldest first.
    pub fn heights(&self) -> impl Iterator<Item = f32> + '_ {
        let peak = self.peak;
        self.samples
            .iter()
            .map(move |&fps| if peak > 0.0 { fps / peak } else { 0.0 })
    }
}
