//! Mode dispatcher: the per-frame state machine.
//!
//! ```text
//!   frame ─▶ smoother ─▶ FingerState ─▶ classify ─▶ Stabilizer ─▶ Mode
//!                                                                 │
//!        ┌──────────────┬──────────────┬──────────────────────────┤
//!        ▼              ▼              ▼                          ▼
//!   CursorMapper   VolumeMapper   ScrollMapper                 (Idle)
//! ```
//!
//! Handless frames only advance the idle counter.  When it reaches the
//! threshold the dispatcher performs a full idle reset: latches released,
//! smoothed cursor position zeroed, gesture history and landmark window
//! cleared, mode forced to `Idle`.

use tracing::{debug, info};

use hand_pose::{classify, FingerState, GestureLabel, LandmarkFrame, LandmarkSmoother};

use crate::config::{ConfigError, EngineConfig, ScreenSize, Span};
use crate::cursor::{CursorMapper, CursorState};
use crate::mode::Mode;
use crate::scroll::ScrollMapper;
use crate::stabilizer::Stabilizer;
use crate::surface::{AudioSurface, InputSurface};
use crate::volume::VolumeMapper;

// ════════════════════════════════════════════════════════════════════════════
// FrameOutcome
// ════════════════════════════════════════════════════════════════════════════

/// What one call to [`ModeDispatcher::process`] did.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameOutcome {
    /// Stable mode after this frame.
    pub mode:        Mode,
    /// The mode changed on this frame.
    pub changed:     bool,
    /// Raw classifier output; `None` for handless frames too.
    pub label:       GestureLabel,
    pub fingers:     Option<FingerState>,
    /// The smoothed frame the mappers saw.
    pub frame:       Option<LandmarkFrame>,
    pub cursor:      CursorState,
    /// Consecutive handless frames so far.
    pub idle_frames: u32,
    pub idle_reset:  bool,
    /// Output commands rejected on this frame.
    pub failures:    u32,
}

// ════════════════════════════════════════════════════════════════════════════
// ModeDispatcher
// ════════════════════════════════════════════════════════════════════════════

pub struct ModeDispatcher {
    stabilizer:     Stabilizer,
    smoother:       LandmarkSmoother,
    cursor:         CursorMapper,
    volume:         VolumeMapper,
    scroll:         ScrollMapper,
    mode:           Mode,
    idle_counter:   u32,
    idle_threshold: u32,
}

impl ModeDispatcher {
    /// `screen` and `volume_range` come from the output surfaces, resolved
    /// once when the session starts.
    pub fn new(cfg: &EngineConfig, screen: ScreenSize, volume_range: Span) -> Result<Self, ConfigError> {
        cfg.validate()?;
        if screen.width == 0 || screen.height == 0 {
            return Err(ConfigError::Screen(screen.width, screen.height));
        }
        if !volume_range.min.is_finite() || !volume_range.max.is_finite() {
            return Err(ConfigError::DegenerateSpan("volume level"));
        }
        Ok(ModeDispatcher {
            stabilizer:     Stabilizer::new(cfg.history_len, cfg.quorum),
            smoother:       LandmarkSmoother::new(cfg.landmark_window),
            cursor:         CursorMapper::new(cfg, screen),
            volume:         VolumeMapper::new(cfg.volume_distance, volume_range),
            scroll:         ScrollMapper::new(cfg.scroll_step),
            mode:           Mode::Idle,
            idle_counter:   0,
            idle_threshold: cfg.idle_frames,
        })
    }

    /// Feed one frame; `None` means no complete hand was detected.
    pub fn process(
        &mut self,
        frame: Option<LandmarkFrame>,
        input: &mut dyn InputSurface,
        audio: &mut dyn AudioSurface,
    ) -> FrameOutcome {
        let before = self.mode;
        let mut out = FrameOutcome {
            mode:        before,
            changed:     false,
            label:       GestureLabel::None,
            fingers:     None,
            frame:       None,
            cursor:      self.cursor.state(),
            idle_frames: 0,
            idle_reset:  false,
            failures:    0,
        };

        match frame {
            None => {
                self.idle_counter += 1;
                if self.idle_counter >= self.idle_threshold {
                    out.failures += self.idle_reset(input);
                    out.idle_reset = true;
                }
            }
            Some(raw) => {
                self.idle_counter = 0;
                let smoothed = self.smoother.push(raw);
                let fingers = FingerState::from_frame(&smoothed);
                let label = classify(fingers);
                let stable = self.stabilizer.push(label);
                debug!(%fingers, %label, mode = %stable, "frame");

                let entered = stable != self.mode;
                out.failures += self.apply_mode(stable, input);
                out.failures += self.run_mapper(&smoothed, entered, input, audio);
                out.label = label;
                out.fingers = Some(fingers);
                out.frame = Some(smoothed);
            }
        }

        out.mode = self.mode;
        out.changed = self.mode != before;
        out.cursor = self.cursor.state();
        out.idle_frames = self.idle_counter;
        out
    }

    /// Switch to `mode`, running its entry action.  Re-applying the current
    /// mode does nothing.
    pub fn apply_mode(&mut self, mode: Mode, input: &mut dyn InputSurface) -> u32 {
        if mode == self.mode {
            return 0;
        }
        info!(from = %self.mode, to = %mode, "mode change");
        self.mode = mode;
        match mode {
            Mode::Idle => self.cursor.release_latches(input),
            Mode::Cursor | Mode::Volume | Mode::ScrollUp | Mode::ScrollDown => 0,
        }
    }

    /// Release any held buttons, e.g. when the session ends.
    pub fn shutdown(&mut self, input: &mut dyn InputSurface) -> u32 {
        self.cursor.release_latches(input)
    }

    pub fn mode(&self) -> Mode { self.mode }
    pub fn idle_counter(&self) -> u32 { self.idle_counter }
    pub fn cursor_state(&self) -> CursorState { self.cursor.state() }
    pub fn stabilizer(&self) -> &Stabilizer { &self.stabilizer }
    pub fn smoother(&self) -> &LandmarkSmoother { &self.smoother }

    fn run_mapper(
        &mut self,
        frame:   &LandmarkFrame,
        entered: bool,
        input:   &mut dyn InputSurface,
        audio:   &mut dyn AudioSurface,
    ) -> u32 {
        match self.mode {
            Mode::Idle if entered => 0,
            // A release rejected on Idle entry is retried on later frames.
            Mode::Idle => self.cursor.release_latches(input),
            Mode::Cursor => self.cursor.update(frame, input),
            Mode::Volume => self.volume.update(frame, audio),
            Mode::ScrollUp | Mode::ScrollDown => self.scroll.update(self.mode, input),
        }
    }

    fn idle_reset(&mut self, input: &mut dyn InputSurface) -> u32 {
        let was = self.mode;
        let held = self.cursor.state().any_latch();
        let failures = if was.is_idle() {
            self.cursor.release_latches(input)
        } else {
            self.apply_mode(Mode::Idle, input)
        };
        self.cursor.reset();
        self.stabilizer.clear();
        self.smoother.clear();
        self.idle_counter = 0;
        if was != Mode::Idle || held {
            info!(from = %was, "idle reset after {} handless frames", self.idle_threshold);
        } else {
            debug!("idle reset");
        }
        failures
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
