//! Engine configuration.
//!
//! Every tuning constant the engine uses lives in [`EngineConfig`].  The
//! struct deserializes with `#[serde(default)]`, so a partial JSON document
//! only overrides the fields it names.

use serde::Deserialize;
use thiserror::Error;

use hand_pose::landmark::{LANDMARK_COUNT, MIDDLE_TIP};

// ════════════════════════════════════════════════════════════════════════════
// Span — a closed numeric interval used for linear remapping
// ════════════════════════════════════════════════════════════════════════════

/// An interval `min → max`.  `min > max` is allowed and means a reversed
/// direction when used as a remap target.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    pub const fn new(min: f32, max: f32) -> Self { Span { min, max } }

    pub fn low(&self)  -> f32 { self.min.min(self.max) }
    pub fn high(&self) -> f32 { self.min.max(self.max) }
    pub fn width(&self) -> f32 { self.max - self.min }

    /// Linearly map `value` from `self` onto `target`, extrapolating past the
    /// ends.
    pub fn remap(&self, value: f64, target: Span) -> f64 {
        let (a, b) = (self.min as f64, self.max as f64);
        let (c, d) = (target.min as f64, target.max as f64);
        c + (value - a) * (d - c) / (b - a)
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.low() as f64, self.high() as f64)
    }

    pub(crate) fn is_degenerate(&self) -> bool {
        !self.min.is_finite() || !self.max.is_finite() || self.min == self.max
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Cursor geometry
// ════════════════════════════════════════════════════════════════════════════

/// Camera-space rectangle that maps onto the whole screen.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct ActiveZone {
    pub x: Span,
    pub y: Span,
}

impl Default for ActiveZone {
    fn default() -> Self {
        ActiveZone { x: Span::new(110.0, 620.0), y: Span::new(20.0, 350.0) }
    }
}

/// What happens to fingertip positions outside the active zone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneOverflow {
    /// Keep mapping linearly; the cursor target can leave the screen.
    #[default]
    Extrapolate,
    /// Pin positions to the zone edge.
    Clamp,
}

/// Target screen size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct ScreenSize {
    pub width:  u32,
    pub height: u32,
}

impl ScreenSize {
    pub const fn new(width: u32, height: u32) -> Self { ScreenSize { width, height } }
}

// ════════════════════════════════════════════════════════════════════════════
// EngineConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub active_zone:     ActiveZone,
    pub zone_overflow:   ZoneOverflow,
    /// Fixed screen size; `None` asks the input backend.
    pub screen:          Option<ScreenSize>,
    /// Landmark id that steers the cursor.
    pub cursor_landmark: usize,
    /// Thumb–index pixel distance that maps onto the audio range.
    pub volume_distance: Span,
    /// EMA factor α applied to the cursor each frame.
    pub smoothing:       f32,
    /// Gesture history capacity K.
    pub history_len:     usize,
    /// Votes T a label needs within the history.
    pub quorum:          usize,
    /// Consecutive handless frames before the forced idle reset.
    pub idle_frames:     u32,
    /// Scroll delta per frame while scrolling.  Must be positive; the
    /// direction comes from the mode.
    pub scroll_step:     i32,
    /// Landmark moving-average window; 1 disables it.
    pub landmark_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            active_zone:     ActiveZone::default(),
            zone_overflow:   ZoneOverflow::Extrapolate,
            screen:          None,
            cursor_landmark: MIDDLE_TIP,
            volume_distance: Span::new(50.0, 200.0),
            smoothing:       0.2,
            history_len:     5,
            quorum:          4,
            idle_frames:     30,
            scroll_step:     200,
            landmark_window: 5,
        }
    }
}

/// Rejected configuration values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("history length must be at least 1")]
    EmptyHistory,
    #[error("quorum {quorum} must be between 1 and the history length {history_len}")]
    Quorum { quorum: usize, history_len: usize },
    #[error("smoothing factor {0} must be in (0, 1]")]
    Smoothing(f32),
    #[error("idle threshold must be at least one frame")]
    IdleFrames,
    #[error("{0} range is empty or not finite")]
    DegenerateSpan(&'static str),
    #[error("cursor landmark {0} is not a hand landmark id")]
    CursorLandmark(usize),
    #[error("screen size {0}x{1} has a zero dimension")]
    Screen(u32, u32),
    #[error("landmark smoothing window must be at least 1")]
    LandmarkWindow,
    #[error("scroll step {0} must be positive")]
    ScrollStep(i32),
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_len == 0 {
            return Err(ConfigError::EmptyHistory);
        }
        if self.quorum == 0 || self.quorum > self.history_len {
            return Err(ConfigError::Quorum { quorum: self.quorum, history_len: self.history_len });
        }
        if !(self.smoothing > 0.0 && self.smoothing <= 1.0) {
            return Err(ConfigError::Smoothing(self.smoothing));
        }
        if self.idle_frames == 0 {
            return Err(ConfigError::IdleFrames);
        }
        if self.active_zone.x.is_degenerate() {
            return Err(ConfigError::DegenerateSpan("active zone x"));
        }
        if self.active_zone.y.is_degenerate() {
            return Err(ConfigError::DegenerateSpan("active zone y"));
        }
        if self.volume_distance.is_degenerate() {
            return Err(ConfigError::DegenerateSpan("volume distance"));
        }
        if self.cursor_landmark >= LANDMARK_COUNT {
            return Err(ConfigError::CursorLandmark(self.cursor_landmark));
        }
        if let Some(s) = self.screen {
            if s.width == 0 || s.height == 0 {
                return Err(ConfigError::Screen(s.width, s.height));
            }
        }
        if self.landmark_window == 0 {
            return Err(ConfigError::LandmarkWindow);
        }
        if self.scroll_step <= 0 {
            return Err(ConfigError::ScrollStep(self.scroll_step));
        }
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
    fn defaults_are_valid() {
        assert_eq!(EngineConfig::default().validate(), Ok(()));
    }

    #[test]
    fn quorum_above_history_is_rejected() {
        let cfg = EngineConfig { quorum: 6, ..EngineConfig::default() };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::Quorum { quorum: 6, history_len: 5 }),
        );
    }

    #[test]
    fn smoothing_must_be_in_unit_interval() {
        for bad in [0.0, -0.1, 1.5, f32::NAN] {
            let cfg = EngineConfig { smoothing: bad, ..EngineConfig::default() };
            assert!(matches!(cfg.validate(), Err(ConfigError::Smoothing(_))), "{}", bad);
        }
        let cfg = EngineConfig { smoothing: 1.0, ..EngineConfig::default() };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn degenerate_zone_is_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.active_zone.x = Span::new(300.0, 300.0);
        assert_eq!(cfg.validate(), Err(ConfigError::DegenerateSpan("active zone x")));
    }

    #[test]
    fn scroll_step_must_be_positive() {
        for bad in [0, -200, i32::MIN] {
            let cfg = EngineConfig { scroll_step: bad, ..EngineConfig::default() };
            assert_eq!(cfg.validate(), Err(ConfigError::ScrollStep(bad)));
        }
        let cfg = EngineConfig { scroll_step: i32::MAX, ..EngineConfig::default() };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn remap_extrapolates_and_reverses() {
        let zone = Span::new(110.0, 620.0);
        let screen = Span::new(1919.0, 0.0);
        assert!((zone.remap(110.0, screen) - 1919.0).abs() < 1e-9);
        assert!((zone.remap(620.0, screen)).abs() < 1e-9);
        assert!(zone.remap(700.0, screen) < 0.0);
        assert_eq!(screen.clamp(-50.0), 0.0);
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let cfg: EngineConfig = serde_json::from_str(
            r#"{ "scroll_step": 300, "zone_overflow": "clamp",
                 "active_zone": { "x": { "min": 100, "max": 540 }, "y": { "min": 0, "max": 400 } } }"#,
        ).unwrap();
        assert_eq!(cfg.scroll_step, 300);
        assert_eq!(cfg.zone_overflow, ZoneOverflow::Clamp);
        assert_eq!(cfg.active_zone.x, Span::new(100.0, 540.0));
        assert_eq!(cfg.quorum, 4);
        assert_eq!(cfg.idle_frames, 30);
    }

    #[test]
    fn unknown_fields_are_an_error() {
        let res: Result<EngineConfig, _> = serde_json::from_str(r#"{ "scrol_step": 1 }"#);
        assert!(res.is_err());
    }
}
