//! The debounced control mode.

use std::fmt;

use hand_pose::GestureLabel;

/// States of the mode dispatcher.  `Idle` is both the initial state and what
/// a stabilized `GestureLabel::None` becomes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    #[default]
    Idle,
    ScrollUp,
    ScrollDown,
    Volume,
    Cursor,
}

impl Mode {
    /// Label shown by the presentation layer.
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Idle       => "Idle",
            Mode::ScrollUp   => "Scroll Up",
            Mode::ScrollDown => "Scroll Down",
            Mode::Volume     => "Volume",
            Mode::Cursor     => "Cursor",
        }
    }

    pub fn is_idle(&self) -> bool { *self == Mode::Idle }
}

impl From<GestureLabel> for Mode {
    fn from(label: GestureLabel) -> Self {
        match label {
            GestureLabel::None       => Mode::Idle,
            GestureLabel::ScrollUp   => Mode::ScrollUp,
            GestureLabel::ScrollDown => Mode::ScrollDown,
            GestureLabel::Volume     => Mode::Volume,
            GestureLabel::Cursor     => Mode::Cursor,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
