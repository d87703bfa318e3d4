//! Output backends: enigo for the mouse, pactl for volume, null for both.
//!
//! Backends are opened on the session worker thread (some platform input
//! handles are not `Send`).  When a native backend cannot be opened the
//! session falls back to the null one with a warning, so the rest of the
//! pipeline still runs.

use std::process::Command;

use enigo::{Axis, Button, Coordinate, Direction, Enigo, Mouse, Settings};
use tracing::{debug, info, warn};

use mode_engine::{AudioSurface, InputSurface, MouseButton, ScreenSize, Span, SurfaceError};

/// Wheel units in one notch of a standard mouse wheel.
pub const UNITS_PER_NOTCH: i32 = 120;

// ════════════════════════════════════════════════════════════════════════════
// Surfaces bundle
// ════════════════════════════════════════════════════════════════════════════

/// What the session worker drives.  `screen` is what the input backend
/// reports; a configured screen size takes precedence.
pub struct Surfaces {
    pub input:  Box<dyn InputSurface>,
    pub audio:  Box<dyn AudioSurface>,
    pub screen: Option<ScreenSize>,
}

#[derive(Clone, Debug)]
pub struct BackendOptions {
    /// Log commands instead of performing them.
    pub dry_run:         bool,
    /// Sink name passed to `pactl`.
    pub sink:            String,
    pub max_volume:      f32,
    /// Screen size reported by the null input backend.
    pub fallback_screen: ScreenSize,
}

impl Default for BackendOptions {
    fn default() -> Self {
        BackendOptions {
            dry_run:         false,
            sink:            "@DEFAULT_SINK@".to_string(),
            max_volume:      100.0,
            fallback_screen: ScreenSize::new(1920, 1080),
        }
    }
}

/// Open the native backends, falling back to null output per surface.
pub fn open_surfaces(opts: &BackendOptions) -> Surfaces {
    if opts.dry_run {
        info!("dry run: output commands are only logged");
        return Surfaces {
            input:  Box::new(NullInput),
            audio:  Box::new(NullAudio::new(opts.max_volume)),
            screen: Some(opts.fallback_screen),
        };
    }

    let (input, screen): (Box<dyn InputSurface>, _) = match EnigoInput::new() {
        Ok(e) => {
            let screen = e.screen_size().or(Some(opts.fallback_screen));
            (Box::new(e), screen)
        }
        Err(e) => {
            warn!("{}; using null input", e);
            (Box::new(NullInput), Some(opts.fallback_screen))
        }
    };

    let audio: Box<dyn AudioSurface> = match PactlAudio::probe(&opts.sink, opts.max_volume) {
        Ok(p) => Box::new(p),
        Err(e) => {
            warn!("{}; using null audio", e);
            Box::new(NullAudio::new(opts.max_volume))
        }
    };

    Surfaces { input, audio, screen }
}

// ════════════════════════════════════════════════════════════════════════════
// EnigoInput
// ════════════════════════════════════════════════════════════════════════════

pub struct EnigoInput {
    enigo: Enigo,
}

impl EnigoInput {
    pub fn new() -> Result<Self, SurfaceError> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| SurfaceError::Input(format!("enigo init: {}", e)))?;
        Ok(EnigoInput { enigo })
    }

    pub fn screen_size(&self) -> Option<ScreenSize> {
        match self.enigo.main_display() {
            Ok((w, h)) if w > 0 && h > 0 => Some(ScreenSize::new(w as u32, h as u32)),
            Ok((w, h)) => {
                warn!(w, h, "display reported an empty size");
                None
            }
            Err(e) => {
                warn!("display size unavailable: {}", e);
                None
            }
        }
    }
}

fn enigo_button(b: MouseButton) -> Button {
    match b {
        MouseButton::Left  => Button::Left,
        MouseButton::Right => Button::Right,
    }
}

/// Convert a scroll delta (positive = up) to enigo wheel notches
/// (positive = down).  Any non-zero delta moves at least one notch.
pub fn wheel_notches(delta: i32) -> i32 {
    if delta == 0 {
        return 0;
    }
    -delta.signum() * (delta.abs() / UNITS_PER_NOTCH).max(1)
}

impl InputSurface for EnigoInput {
    fn move_cursor_absolute(&mut self, x: i32, y: i32) -> Result<(), SurfaceError> {
        self.enigo.move_mouse(x, y, Coordinate::Abs)
            .map_err(|e| SurfaceError::Input(e.to_string()))
    }

    fn button_down(&mut self, button: MouseButton) -> Result<(), SurfaceError> {
        self.enigo.button(enigo_button(button), Direction::Press)
            .map_err(|e| SurfaceError::Input(e.to_string()))
    }

    fn button_up(&mut self, button: MouseButton) -> Result<(), SurfaceError> {
        self.enigo.button(enigo_button(button), Direction::Release)
            .map_err(|e| SurfaceError::Input(e.to_string()))
    }

    fn scroll(&mut self, delta: i32) -> Result<(), SurfaceError> {
        let notches = wheel_notches(delta);
        if notches == 0 {
            return Ok(());
        }
        self.enigo.scroll(notches, Axis::Vertical)
            .map_err(|e| SurfaceError::Input(e.to_string()))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PactlAudio — PulseAudio / PipeWire through the pactl CLI
// ════════════════════════════════════════════════════════════════════════════

/// Levels are percentages of the sink's nominal volume.
pub struct PactlAudio {
    sink:        String,
    max_percent: f32,
    last:        Option<i32>,
}

impl PactlAudio {
    /// Check that `pactl` can reach a sound server before using it.
    pub fn probe(sink: &str, max_percent: f32) -> Result<Self, SurfaceError> {
        let out = Command::new("pactl").arg("info").output()
            .map_err(|e| SurfaceError::Audio(format!("pactl not runnable: {}", e)))?;
        if !out.status.success() {
            return Err(SurfaceError::Audio(format!("pactl info failed: {}", out.status)));
        }
        info!(sink, "audio via pactl");
        Ok(PactlAudio { sink: sink.to_string(), max_percent, last: None })
    }
}

/// `pactl` argument for `level` percent.
pub fn pactl_percent(level: f32) -> String {
    format!("{}%", level.round().max(0.0) as i32)
}

impl AudioSurface for PactlAudio {
    fn volume_range(&mut self) -> Result<Span, SurfaceError> {
        Ok(Span::new(0.0, self.max_percent))
    }

    fn set_volume_level(&mut self, level: f32) -> Result<(), SurfaceError> {
        let percent = level.round() as i32;
        // Skip the process spawn when the rounded level has not moved.
        if self.last == Some(percent) {
            return Ok(());
        }
        let status = Command::new("pactl")
            .args(["set-sink-volume", &self.sink, &pactl_percent(level)])
            .status()
            .map_err(|e| SurfaceError::Audio(e.to_string()))?;
        if !status.success() {
            return Err(SurfaceError::Audio(format!("pactl set-sink-volume: {}", status)));
        }
        self.last = Some(percent);
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Null backends
// ════════════════════════════════════════════════════════════════════════════

pub struct NullInput;

impl InputSurface for NullInput {
    fn move_cursor_absolute(&mut self, x: i32, y: i32) -> Result<(), SurfaceError> {
        debug!(x, y, "move");
        Ok(())
    }
    fn button_down(&mut self, button: MouseButton) -> Result<(), SurfaceError> {
        debug!(?button, "button down");
        Ok(())
    }
    fn button_up(&mut self, button: MouseButton) -> Result<(), SurfaceError> {
        debug!(?button, "button up");
        Ok(())
    }
    fn scroll(&mut self, delta: i32) -> Result<(), SurfaceError> {
        debug!(delta, "scroll");
        Ok(())
    }
}

pub struct NullAudio {
    range: Span,
}

impl NullAudio {
    pub fn new(max: f32) -> Self { NullAudio { range: Span::new(0.0, max) } }
}

impl AudioSurface for NullAudio {
    fn volume_range(&mut self) -> Result<Span, SurfaceError> { Ok(self.range) }

    fn set_volume_level(&mut self, level: f32) -> Result<(), SurfaceError> {
        debug!(level, "volume");
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_delta_becomes_inverted_notches() {
        assert_eq!(wheel_notches(200), -1);
        assert_eq!(wheel_notches(-200), 1);
        assert_eq!(wheel_notches(240), -2);
        assert_eq!(wheel_notches(30), -1);
        assert_eq!(wheel_notches(0), 0);
    }

    #[test]
    fn pactl_level_is_a_rounded_percentage() {
        assert_eq!(pactl_percent(46.6), "47%");
        assert_eq!(pactl_percent(0.2), "0%");
        assert_eq!(pactl_percent(100.0), "100%");
    }

    #[test]
    fn dry_run_uses_null_surfaces() {
        let opts = BackendOptions { dry_run: true, ..BackendOptions::default() };
        let mut s = open_surfaces(&opts);
        assert_eq!(s.screen, Some(ScreenSize::new(1920, 1080)));
        assert_eq!(s.audio.volume_range(), Ok(Span::new(0.0, 100.0)));
        assert!(s.input.scroll(200).is_ok());
        assert!(s.audio.set_volume_level(50.0).is_ok());
    }
}
