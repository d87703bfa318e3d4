//! Volume mapper: thumb–index pinch distance to an absolute audio level.

use tracing::warn;

use hand_pose::landmark::{INDEX_TIP, THUMB_TIP};
use hand_pose::LandmarkFrame;

use crate::config::Span;
use crate::surface::AudioSurface;

#[derive(Clone, Debug)]
pub struct VolumeMapper {
    /// Pinch distance range in pixels.
    distance: Span,
    /// Device level range, queried once when the session opens the surface.
    range:    Span,
    last:     Option<f32>,
}

impl VolumeMapper {
    pub fn new(distance: Span, range: Span) -> Self {
        VolumeMapper { distance, range, last: None }
    }

    /// Level for this frame: interpolate the pinch distance onto the device
    /// range, then clamp.
    pub fn level_for(&self, frame: &LandmarkFrame) -> f32 {
        let d = frame.distance(THUMB_TIP, INDEX_TIP) as f64;
        self.range.clamp(self.distance.remap(d, self.range)) as f32
    }

    /// Set the level.  Runs every Volume frame even when the level is
    /// unchanged.  Returns the number of rejected commands.
    pub fn update(&mut self, frame: &LandmarkFrame, audio: &mut dyn AudioSurface) -> u32 {
        let level = self.level_for(frame);
        match audio.set_volume_level(level) {
            Ok(()) => {
                self.last = Some(level);
                0
            }
            Err(e) => {
                warn!(level, "volume command failed: {}", e);
                1
            }
        }
    }

    /// Last level the surface accepted.
    pub fn last_level(&self) -> Option<f32> { self.last }
    pub fn range(&self) -> Span { self.range }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
