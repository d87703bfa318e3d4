//! Simulation source: keyboard and mouse stand in for a camera.
//!
//! The preview window reads the mouse and keyboard each tick, turns them into
//! a [`SimInput`] through a [`SimController`], and sends it here over a
//! channel.  [`SimSource`] builds a synthetic 21-point hand from each input.
//! This keeps the window event loop on the main thread and the frame loop on
//! the session worker.
//!
//! | Key      | Pose                                   |
//! |----------|----------------------------------------|
//! | `0`      | Fist                                   |
//! | `1`      | Index up (scroll up)                   |
//! | `2`      | Index + middle up (scroll down)        |
//! | `3`      | Thumb + index (volume)                 |
//! | `5`      | Open hand (cursor)                     |
//! | `L` held | Thumb tucked (left click)              |
//! | `R` held | Index bent (right click)               |
//! | `Up`/`Down` | Widen / narrow the thumb–index spread |

use std::sync::mpsc::Receiver;

use hand_pose::pose::{DEFAULT_SPREAD, MIDDLE_TIP_OFFSET};
use hand_pose::{synthesize, FingerState};

use crate::source::{Detection, LandmarkSource, SourceError, DEFAULT_FRAME_W};

const SPREAD_STEP: f32 = 4.0;
const SPREAD_MIN:  f32 = 10.0;
const SPREAD_MAX:  f32 = 300.0;

// ════════════════════════════════════════════════════════════════════════════
// Poses
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimPose {
    Fist,
    IndexUp,
    TwoUp,
    Pinch,
    Open,
    LeftClick,
    RightClick,
}

impl SimPose {
    pub fn fingers(&self) -> FingerState {
        FingerState(match self {
            SimPose::Fist       => [false, false, false, false, false],
            SimPose::IndexUp    => [false, true,  false, false, false],
            SimPose::TwoUp      => [false, true,  true,  false, false],
            SimPose::Pinch      => [true,  true,  false, false, false],
            SimPose::Open       => [true,  true,  true,  true,  true ],
            SimPose::LeftClick  => [false, true,  true,  true,  true ],
            SimPose::RightClick => [true,  false, true,  true,  true ],
        })
    }

    pub fn from_digit(d: u8) -> Option<Self> {
        match d {
            0 => Some(SimPose::Fist),
            1 => Some(SimPose::IndexUp),
            2 => Some(SimPose::TwoUp),
            3 => Some(SimPose::Pinch),
            5 => Some(SimPose::Open),
            _ => None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimInput / SimController
// ════════════════════════════════════════════════════════════════════════════

/// One simulated camera frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SimInput {
    /// Pointer outside the window.
    NoHand,
    /// `tip` is where the middle fingertip sits, in camera pixels.
    Hand { pose: SimPose, tip: (f32, f32), spread: f32 },
}

/// Key state sampled from the window for one tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimKeys {
    /// Digit key pressed this tick.
    pub digit:    Option<u8>,
    pub left:     bool,
    pub right:    bool,
    pub wider:    bool,
    pub narrower: bool,
}

/// Turns window state into [`SimInput`].  The selected pose is sticky; the
/// click keys override it only while held.
#[derive(Clone, Debug)]
pub struct SimController {
    pose:   SimPose,
    spread: f32,
}

impl Default for SimController {
    fn default() -> Self { SimController { pose: SimPose::Open, spread: DEFAULT_SPREAD } }
}

impl SimController {
    /// `pointer` is in preview coordinates, which mirror the camera the way a
    /// selfie view does.
    pub fn input(&mut self, pointer: Option<(f32, f32)>, keys: &SimKeys) -> SimInput {
        if let Some(pose) = keys.digit.and_then(SimPose::from_digit) {
            self.pose = pose;
        }
        if keys.wider    { self.spread += SPREAD_STEP; }
        if keys.narrower { self.spread -= SPREAD_STEP; }
        self.spread = self.spread.clamp(SPREAD_MIN, SPREAD_MAX);

        let Some((px, py)) = pointer else { return SimInput::NoHand };
        let pose = match (keys.left, keys.right) {
            (true, _) => SimPose::LeftClick,
            (_, true) => SimPose::RightClick,
            _ => self.pose,
        };
        SimInput::Hand { pose, tip: (DEFAULT_FRAME_W - px, py), spread: self.spread }
    }

    pub fn pose(&self) -> SimPose { self.pose }
    pub fn spread(&self) -> f32 { self.spread }
}

// ════════════════════════════════════════════════════════════════════════════
// SimSource
// ════════════════════════════════════════════════════════════════════════════

/// Landmark source fed by the preview window.  Blocks until the window sends
/// the next tick; closing the window disconnects it.
pub struct SimSource {
    pub rx: Receiver<SimInput>,
}

impl SimSource {
    pub fn detection(input: SimInput) -> Detection {
        match input {
            SimInput::NoHand => Detection::empty(),
            SimInput::Hand { pose, tip, spread } => {
                let palm = (tip.0 - MIDDLE_TIP_OFFSET.0, tip.1 - MIDDLE_TIP_OFFSET.1);
                Detection::single(&synthesize(pose.fingers(), palm, spread))
            }
        }
    }
}

impl LandmarkSource for SimSource {
    fn next_frame(&mut self) -> Result<Detection, SourceError> {
        self.rx.recv()
            .map(Self::detection)
            .map_err(|_| SourceError::Disconnected("simulation window closed".to_string()))
    }

    fn name(&self) -> &str { "sim" }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use hand_pose::landmark::MIDDLE_TIP;
    use hand_pose::{classify, GestureLabel};
    use std::sync::mpsc;

    fn label_of(input: SimInput) -> GestureLabel {
        let frame = SimSource::detection(input).primary_frame().unwrap();
        classify(FingerState::from_frame(&frame))
    }

    fn hand(pose: SimPose) -> SimInput {
        SimInput::Hand { pose, tip: (320.0, 200.0), spread: DEFAULT_SPREAD }
    }

    #[test]
    fn poses_classify_as_intended() {
        assert_eq!(label_of(hand(SimPose::Fist)), GestureLabel::None);
        assert_eq!(label_of(hand(SimPose::IndexUp)), GestureLabel::ScrollUp);
        assert_eq!(label_of(hand(SimPose::TwoUp)), GestureLabel::ScrollDown);
        assert_eq!(label_of(hand(SimPose::Pinch)), GestureLabel::Volume);
        assert_eq!(label_of(hand(SimPose::Open)), GestureLabel::Cursor);
        assert_eq!(label_of(hand(SimPose::LeftClick)), GestureLabel::Cursor);
        assert_eq!(label_of(hand(SimPose::RightClick)), GestureLabel::Cursor);
    }

    #[test]
    fn pointer_is_mirrored_onto_the_fingertip() {
        let mut c = SimController::default();
        let input = c.input(Some((100.0, 150.0)), &SimKeys::default());
        assert_eq!(input, SimInput::Hand {
            pose: SimPose::Open, tip: (540.0, 150.0), spread: DEFAULT_SPREAD,
        });
        let frame = SimSource::detection(input).primary_frame().unwrap();
        assert_eq!(frame.point(MIDDLE_TIP), (540.0, 150.0));
    }

    #[test]
    fn digit_selection_sticks_and_click_keys_override() {
        let mut c = SimController::default();
        c.input(Some((0.0, 0.0)), &SimKeys { digit: Some(1), ..SimKeys::default() });
        assert_eq!(c.pose(), SimPose::IndexUp);

        let held = c.input(Some((0.0, 0.0)), &SimKeys { left: true, ..SimKeys::default() });
        assert!(matches!(held, SimInput::Hand { pose: SimPose::LeftClick, .. }));
        assert_eq!(c.pose(), SimPose::IndexUp);

        c.input(Some((0.0, 0.0)), &SimKeys { digit: Some(4), ..SimKeys::default() });
        assert_eq!(c.pose(), SimPose::IndexUp);
    }

    #[test]
    fn spread_is_bounded() {
        let mut c = SimController::default();
        for _ in 0..200 {
            c.input(None, &SimKeys { narrower: true, ..SimKeys::default() });
        }
        assert_eq!(c.spread(), SPREAD_MIN);
        for _ in 0..200 {
            c.input(None, &SimKeys { wider: true, ..SimKeys::default() });
        }
        assert_eq!(c.spread(), SPREAD_MAX);
    }

    #[test]
    fn closed_window_disconnects() {
        let (tx, rx) = mpsc::channel();
        let mut src = SimSource { rx };
        tx.send(SimInput::NoHand).unwrap();
        drop(tx);
        assert!(src.next_frame().unwrap().hands.is_empty());
        assert!(matches!(src.next_frame(), Err(SourceError::Disconnected(_))));
    }
}
