//! Finger-state extraction: which digits are extended in one frame.

use std::fmt;

use crate::landmark::{LandmarkFrame, Landmark, THUMB_IP, THUMB_TIP, TIP_IDS};

/// Five "extended" flags in `[thumb, index, middle, ring, pinky]` order.
///
/// Derived from a single frame and never stored across frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FingerState(pub [bool; 5]);

impl FingerState {
    pub const THUMB:  usize = 0;
    pub const INDEX:  usize = 1;
    pub const MIDDLE: usize = 2;
    pub const RING:   usize = 3;
    pub const PINKY:  usize = 4;

    /// Read the finger flags off a complete frame.
    ///
    /// * Thumb: the tip lies to the right of the joint below it
    ///   (`x(4) > x(3)`).  This lateral test only holds for one hand facing
    ///   the camera one way; mirrored or opposite hands read inverted.
    /// * Other digits: the tip sits higher in the image than the joint two
    ///   segments below it (`y(tip) < y(tip - 2)`), image y growing downwards.
    pub fn from_frame(frame: &LandmarkFrame) -> Self {
        let mut flags = [false; 5];
        flags[Self::THUMB] = frame.x(THUMB_TIP) > frame.x(THUMB_IP);
        for (i, &tip) in TIP_IDS.iter().enumerate().skip(1) {
            flags[i] = frame.y(tip) < frame.y(tip - 2);
        }
        FingerState(flags)
    }

    /// Extract straight from raw detector output; `None` when the landmark set
    /// is incomplete.
    pub fn extract(landmarks: &[Landmark]) -> Option<Self> {
        LandmarkFrame::from_landmarks(landmarks).map(|f| Self::from_frame(&f))
    }

    pub fn thumb(&self)  -> bool { self.0[Self::THUMB] }
    pub fn index(&self)  -> bool { self.0[Self::INDEX] }
    pub fn middle(&self) -> bool { self.0[Self::MIDDLE] }
    pub fn ring(&self)   -> bool { self.0[Self::RING] }
    pub fn pinky(&self)  -> bool { self.0[Self::PINKY] }

    pub fn extended_count(&self) -> usize {
        self.0.iter().filter(|&&up| up).count()
    }
}

impl From<[bool; 5]> for FingerState {
    fn from(flags: [bool; 5]) -> Self { FingerState(flags) }
}

/// Renders as five `0`/`1` characters, thumb first.
impl fmt::Display for FingerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for up in self.0 {
            f.write_str(if up { "1" } else { "0" })?;
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
