//! Gesture classification: finger-state vector → raw gesture label.
//!
//! | `[T,I,M,R,P]` | Label |
//! |---|---|
//! | `0 1 0 0 0` | `ScrollUp` |
//! | `0 1 1 0 0` | `ScrollDown` |
//! | `1 1 0 0 0` | `Volume` |
//! | `1 1 1 1 1` | `Cursor` |
//! | `0 1 1 1 1` | `Cursor` (thumb tucked, the left-click pose) |
//! | `1 0 1 1 1` | `Cursor` (index bent, the right-click pose) |
//! | anything else | `None` |
//!
//! The patterns are kept few and far apart in Hamming distance so a single
//! misread finger rarely turns one gesture into another.

use std::fmt;

use crate::fingers::FingerState;

/// Raw per-frame gesture, before temporal stabilization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GestureLabel {
    #[default]
    None,
    ScrollUp,
    ScrollDown,
    Volume,
    Cursor,
}

impl GestureLabel {
    pub const ALL: [GestureLabel; 5] = [
        GestureLabel::None,
        GestureLabel::ScrollUp,
        GestureLabel::ScrollDown,
        GestureLabel::Volume,
        GestureLabel::Cursor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GestureLabel::None       => "none",
            GestureLabel::ScrollUp   => "scroll-up",
            GestureLabel::ScrollDown => "scroll-down",
            GestureLabel::Volume     => "volume",
            GestureLabel::Cursor     => "cursor",
        }
    }
}

impl fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed-table lookup.  Any vector without a row is `None`.
pub fn classify(state: FingerState) -> GestureLabel {
    const F: bool = false;
    const T: bool = true;
    match state.0 {
        [F, T, F, F, F] => GestureLabel::ScrollUp,
        [F, T, T, F, F] => GestureLabel::ScrollDown,
        [T, T, F, F, F] => GestureLabel::Volume,
        [T, T, T, T, T]
        | [F, T, T, T, T]
        | [T, F, T, T, T] => GestureLabel::Cursor,
        _ => GestureLabel::None,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
