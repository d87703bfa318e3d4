//! Output surfaces: the OS input simulator and the system audio control.
//!
//! The engine never talks to the platform directly.  It is handed
//! `&mut dyn InputSurface` / `&mut dyn AudioSurface` each frame, so tests can
//! substitute the recording doubles in [`testing`].

use thiserror::Error;

use crate::config::Span;

/// Mouse buttons the cursor mapper can latch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
}

/// A rejected output command.  Never fatal to the frame loop.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SurfaceError {
    #[error("input command rejected: {0}")]
    Input(String),
    #[error("audio command rejected: {0}")]
    Audio(String),
    #[error("output surface unavailable")]
    Unavailable,
}

/// Fire-and-forget mouse commands.
pub trait InputSurface {
    fn move_cursor_absolute(&mut self, x: i32, y: i32) -> Result<(), SurfaceError>;
    fn button_down(&mut self, button: MouseButton) -> Result<(), SurfaceError>;
    fn button_up(&mut self, button: MouseButton) -> Result<(), SurfaceError>;
    /// Positive deltas scroll up.
    fn scroll(&mut self, delta: i32) -> Result<(), SurfaceError>;
}

/// Absolute output-volume control.
pub trait AudioSurface {
    /// Valid level range as reported by the device.
    fn volume_range(&mut self) -> Result<Span, SurfaceError>;
    fn set_volume_level(&mut self, level: f32) -> Result<(), SurfaceError>;
}

// ════════════════════════════════════════════════════════════════════════════
// Recording doubles
// ════════════════════════════════════════════════════════════════════════════

#[cfg(any(test, feature = "testing"))]
pub mod testing {
    use std::sync::{Arc, Mutex};

    use super::*;

    /// One command seen by a recording surface.
    #[derive(Clone, Debug, PartialEq)]
    pub enum Command {
        Move(i32, i32),
        Down(MouseButton),
        Up(MouseButton),
        Scroll(i32),
        Volume(f32),
    }

    /// Records every accepted command into a log that can be shared with
    /// another thread.  While `reject` is set every command fails and nothing
    /// is recorded.
    #[derive(Clone, Default)]
    pub struct RecordingInput {
        log:        Arc<Mutex<Vec<Command>>>,
        pub reject: bool,
    }

    impl RecordingInput {
        pub fn new() -> Self { Self::default() }

        /// Shared handle to the command log.
        pub fn log(&self) -> Arc<Mutex<Vec<Command>>> { Arc::clone(&self.log) }

        pub fn commands(&self) -> Vec<Command> {
            self.log.lock().map(|l| l.clone()).unwrap_or_default()
        }

        pub fn count(&self, wanted: &Command) -> usize {
            self.commands().iter().filter(|c| *c == wanted).count()
        }

        pub fn clear(&self) {
            if let Ok(mut l) = self.log.lock() { l.clear(); }
        }

        fn record(&mut self, cmd: Command) -> Result<(), SurfaceError> {
            if self.reject {
                return Err(SurfaceError::Input(format!("rejected {:?}", cmd)));
            }
            if let Ok(mut l) = self.log.lock() { l.push(cmd); }
            Ok(())
        }
    }

    impl InputSurface for RecordingInput {
        fn move_cursor_absolute(&mut self, x: i32, y: i32) -> Result<(), SurfaceError> {
            self.record(Command::Move(x, y))
        }
        fn button_down(&mut self, button: MouseButton) -> Result<(), SurfaceError> {
            self.record(Command::Down(button))
        }
        fn button_up(&mut self, button: MouseButton) -> Result<(), SurfaceError> {
            self.record(Command::Up(button))
        }
        fn scroll(&mut self, delta: i32) -> Result<(), SurfaceError> {
            self.record(Command::Scroll(delta))
        }
    }

    /// Audio double with a fixed range.
    #[derive(Clone)]
    pub struct RecordingAudio {
        pub range:  Span,
        log:        Arc<Mutex<Vec<Command>>>,
        pub reject: bool,
    }

    impl RecordingAudio {
        pub fn new(range: Span) -> Self {
            RecordingAudio { range, log: Arc::default(), reject: false }
        }

        pub fn levels(&self) -> Vec<f32> {
            self.log.lock().map(|l| {
                l.iter().filter_map(|c| match c {
                    Command::Volume(v) => Some(*v),
                    _ => None,
                }).collect()
            }).unwrap_or_default()
        }
    }

    impl AudioSurface for RecordingAudio {
        fn volume_range(&mut self) -> Result<Span, SurfaceError> {
            if self.reject { return Err(SurfaceError::Unavailable); }
            Ok(self.range)
        }
        fn set_volume_level(&mut self, level: f32) -> Result<(), SurfaceError> {
            if self.reject {
                return Err(SurfaceError::Audio(format!("rejected level {}", level)));
            }
            if let Ok(mut l) = self.log.lock() { l.push(Command::Volume(level)); }
            Ok(())
        }
    }
}
