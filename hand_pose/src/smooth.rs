//! Moving-average smoothing of whole landmark frames.
//!
//! Detector output jitters by a few pixels from frame to frame.  Averaging
//! each landmark over the last few detected hands steadies both the finger
//! flags near their thresholds and the geometry fed to the mappers.

use std::collections::VecDeque;

use crate::landmark::{Landmark, LandmarkFrame, LANDMARK_COUNT};

/// Sliding window of the most recent complete frames.
#[derive(Debug, Clone)]
pub struct LandmarkSmoother {
    window: usize,
    frames: VecDeque<LandmarkFrame>,
}

impl LandmarkSmoother {
    /// `window` is clamped to at least 1; a window of 1 passes frames through.
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        LandmarkSmoother { window, frames: VecDeque::with_capacity(window) }
    }

    /// Add a frame and return the per-landmark mean over the window.
    pub fn push(&mut self, frame: LandmarkFrame) -> LandmarkFrame {
        if self.frames.len() == self.window {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);

        let n = self.frames.len() as f32;
        let mut sum = [(0.0f32, 0.0f32); LANDMARK_COUNT];
        for f in &self.frames {
            for (acc, lm) in sum.iter_mut().zip(f.iter()) {
                acc.0 += lm.x;
                acc.1 += lm.y;
            }
        }
        LandmarkFrame::from_array(std::array::from_fn(|i| {
            Landmark::new(i as u8, sum[i].0 / n, sum[i].1 / n)
        }))
    }

    pub fn clear(&mut self) { self.frames.clear(); }

    pub fn len(&self) -> usize { self.frames.len() }
    pub fn is_empty(&self) -> bool { self.frames.is_empty() }
    pub fn window(&self) -> usize { self.window }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
