//! Cursor mapper: zone remap, exponential smoothing, click latches.
//!
//! # Per-frame algorithm
//!
//! 1. Read the steering fingertip (landmark 12 by default) and remap the
//!    active zone onto the screen, x mirrored so moving the hand right moves
//!    the cursor right in a selfie-view camera.
//! 2. Blend into the previous position: `prev = prev·(1 − α) + target·α`.
//! 3. Send the rounded point as an absolute move.
//! 4. Evaluate both click latches and emit a press or release on an edge.

use tracing::{debug, warn};

use hand_pose::landmark::{INDEX_PIP, INDEX_TIP, THUMB_TIP};
use hand_pose::LandmarkFrame;

use crate::config::{ActiveZone, EngineConfig, ScreenSize, Span, ZoneOverflow};
use crate::surface::{InputSurface, MouseButton};

// ════════════════════════════════════════════════════════════════════════════
// CursorState
// ════════════════════════════════════════════════════════════════════════════

/// Smoothed pointer position and the two button latches.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CursorState {
    pub prev_x:      f64,
    pub prev_y:      f64,
    pub left_latch:  bool,
    pub right_latch: bool,
}

impl CursorState {
    pub fn any_latch(&self) -> bool { self.left_latch || self.right_latch }
}

// ════════════════════════════════════════════════════════════════════════════
// CursorMapper
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct CursorMapper {
    zone:     ActiveZone,
    overflow: ZoneOverflow,
    landmark: usize,
    alpha:    f64,
    screen_x: Span,
    screen_y: Span,
    state:    CursorState,
}

impl CursorMapper {
    pub fn new(cfg: &EngineConfig, screen: ScreenSize) -> Self {
        let w = screen.width.max(1) as f32;
        let h = screen.height.max(1) as f32;
        CursorMapper {
            zone:     cfg.active_zone,
            overflow: cfg.zone_overflow,
            landmark: cfg.cursor_landmark,
            alpha:    cfg.smoothing as f64,
            screen_x: Span::new(w - 1.0, 0.0),
            screen_y: Span::new(0.0, h - 1.0),
            state:    CursorState::default(),
        }
    }

    /// Unsmoothed screen target for this frame's steering fingertip.
    pub fn target(&self, frame: &LandmarkFrame) -> (f64, f64) {
        let (mut x, mut y) = (frame.x(self.landmark) as f64, frame.y(self.landmark) as f64);
        if self.overflow == ZoneOverflow::Clamp {
            x = self.zone.x.clamp(x);
            y = self.zone.y.clamp(y);
        }
        (self.zone.x.remap(x, self.screen_x), self.zone.y.remap(y, self.screen_y))
    }

    /// Run one Cursor-mode frame.  Returns the number of rejected commands.
    pub fn update(&mut self, frame: &LandmarkFrame, input: &mut dyn InputSurface) -> u32 {
        let (tx, ty) = self.target(frame);
        let a = self.alpha;
        let s = &mut self.state;
        s.prev_x = s.prev_x * (1.0 - a) + tx * a;
        s.prev_y = s.prev_y * (1.0 - a) + ty * a;

        let mut failures = 0;
        let (px, py) = (s.prev_x.round() as i32, s.prev_y.round() as i32);
        if let Err(e) = input.move_cursor_absolute(px, py) {
            warn!(x = px, y = py, "cursor move failed: {}", e);
            failures += 1;
        }

        let want_left  = frame.x(THUMB_TIP) < frame.x(INDEX_TIP);
        let want_right = frame.y(INDEX_TIP) > frame.y(INDEX_PIP);
        failures += set_latch(&mut s.left_latch,  want_left,  MouseButton::Left,  input);
        failures += set_latch(&mut s.right_latch, want_right, MouseButton::Right, input);
        failures
    }

    /// Release whichever buttons are held.  A latch whose release is
    /// rejected stays set so the caller can try again.
    pub fn release_latches(&mut self, input: &mut dyn InputSurface) -> u32 {
        let s = &mut self.state;
        set_latch(&mut s.left_latch,  false, MouseButton::Left,  input)
            + set_latch(&mut s.right_latch, false, MouseButton::Right, input)
    }

    /// Forget the smoothed position.  Latches are left to `release_latches`.
    pub fn reset(&mut self) {
        self.state.prev_x = 0.0;
        self.state.prev_y = 0.0;
    }

    pub fn state(&self) -> CursorState { self.state }
}

/// Drive one latch towards `want`, emitting a single down/up on an edge.
/// The latch only flips once the surface accepts the command.
fn set_latch(
    latch:  &mut bool,
    want:   bool,
    button: MouseButton,
    input:  &mut dyn InputSurface,
) -> u32 {
    if *latch == want {
        return 0;
    }
    let res = if want { input.button_down(button) } else { input.button_up(button) };
    match res {
        Ok(()) => {
            debug!(?button, pressed = want, "latch");
            *latch = want;
            0
        }
        Err(e) => {
            warn!(?button, pressed = want, "button command failed: {}", e);
            1
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::testing::{Command, RecordingInput};
    use hand_pose::{synthesize, FingerState};
    use hand_pose::pose::{DEFAULT_SPREAD, MIDDLE_TIP_OFFSET};

    const SCREEN: ScreenSize = ScreenSize::new(1920, 1080);

    fn mapper() -> CursorMapper { CursorMapper::new(&EngineConfig::default(), SCREEN) }

    /// Open hand whose middle fingertip sits at `tip`.
    fn open_at(tip: (f32, f32)) -> LandmarkFrame {
        pose_at(FingerState([true; 5]), tip)
    }

    fn pose_at(state: FingerState, tip: (f32, f32)) -> LandmarkFrame {
        let palm = (tip.0 - MIDDLE_TIP_OFFSET.0, tip.1 - MIDDLE_TIP_OFFSET.1);
        synthesize(state, palm, DEFAULT_SPREAD)
    }

    #[test]
    fn zone_corners_map_to_mirrored_screen_corners() {
        let m = mapper();
        assert_eq!(m.target(&open_at((110.0, 20.0))), (1919.0, 0.0));
        assert_eq!(m.target(&open_at((620.0, 350.0))), (0.0, 1079.0));
    }

    #[test]
    fn overflow_extrapolates_or_clamps() {
        let outside = open_at((700.0, 400.0));
        let (x, y) = mapper().target(&outside);
        assert!(x < 0.0 && y > 1079.0);

        let cfg = EngineConfig { zone_overflow: ZoneOverflow::Clamp, ..EngineConfig::default() };
        let clamped = CursorMapper::new(&cfg, SCREEN);
        assert_eq!(clamped.target(&outside), (0.0, 1079.0));
    }

    #[test]
    fn ema_converges_geometrically() {
        let mut m = mapper();
        let mut input = RecordingInput::new();
        let frame = open_at((365.0, 185.0));
        let (tx, ty) = m.target(&frame);
        let keep = 1.0 - EngineConfig::default().smoothing as f64;
        for n in 1..=20 {
            m.update(&frame, &mut input);
            let k = keep.powi(n);
            let s = m.state();
            assert!(((s.prev_x - tx).abs() - tx.abs() * k).abs() < 1e-6, "x at {}", n);
            assert!(((s.prev_y - ty).abs() - ty.abs() * k).abs() < 1e-6, "y at {}", n);
        }
    }

    #[test]
    fn moves_are_rounded_every_frame() {
        let mut m = mapper();
        let mut input = RecordingInput::new();
        let frame = open_at((365.0, 185.0));
        m.update(&frame, &mut input);
        m.update(&frame, &mut input);
        let moves: Vec<_> = input.commands().into_iter()
            .filter(|c| matches!(c, Command::Move(..)))
            .collect();
        assert_eq!(moves.len(), 2);
        let s = m.state();
        assert_eq!(moves[1], Command::Move(s.prev_x.round() as i32, s.prev_y.round() as i32));
    }

    #[test]
    fn held_latch_presses_once_and_releases_once() {
        let mut m = mapper();
        let mut input = RecordingInput::new();
        let left = pose_at(FingerState([false, true, true, true, true]), (300.0, 200.0));
        for _ in 0..7 {
            m.update(&left, &mut input);
        }
        assert!(m.state().left_latch);
        assert_eq!(input.count(&Command::Down(MouseButton::Left)), 1);

        let open = open_at((300.0, 200.0));
        for _ in 0..3 {
            m.update(&open, &mut input);
        }
        assert!(!m.state().left_latch);
        assert_eq!(input.count(&Command::Up(MouseButton::Left)), 1);
        assert_eq!(input.count(&Command::Down(MouseButton::Right)), 0);
    }

    #[test]
    fn right_latch_follows_bent_index() {
        let mut m = mapper();
        let mut input = RecordingInput::new();
        let right = pose_at(FingerState([true, false, true, true, true]), (300.0, 200.0));
        m.update(&right, &mut input);
        m.update(&right, &mut input);
        assert!(m.state().right_latch);
        assert_eq!(m.release_latches(&mut input), 0);
        assert!(!m.state().any_latch());
        assert_eq!(input.count(&Command::Down(MouseButton::Right)), 1);
        assert_eq!(input.count(&Command::Up(MouseButton::Right)), 1);
    }

    #[test]
    fn rejected_press_is_retried_next_frame() {
        let mut m = mapper();
        let mut input = RecordingInput::new();
        let left = pose_at(FingerState([false, true, true, true, true]), (300.0, 200.0));

        input.reject = true;
        assert_eq!(m.update(&left, &mut input), 2);
        assert!(!m.state().left_latch);

        input.reject = false;
        assert_eq!(m.update(&left, &mut input), 0);
        assert!(m.state().left_latch);
        assert_eq!(input.count(&Command::Down(MouseButton::Left)), 1);
    }

    #[test]
    fn reset_keeps_latches() {
        let mut m = mapper();
        let mut input = RecordingInput::new();
        let left = pose_at(FingerState([false, true, true, true, true]), (300.0, 200.0));
        m.update(&left, &mut input);
        m.reset();
        let s = m.state();
        assert_eq!((s.prev_x, s.prev_y), (0.0, 0.0));
        assert!(s.left_latch);
    }
}
