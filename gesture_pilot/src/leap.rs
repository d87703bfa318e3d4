//! LeapMotion hardware source (feature = "leap").
//!
//! Requires the `leap` feature flag and the LeapC shared library installed.
//!
//! # Projection
//!
//! LeapC reports joints in millimetres above the controller: x to the user's
//! right, y up.  Each joint is projected into a virtual 640×480 camera frame
//! facing the user, so x is mirrored and y flipped to grow downwards:
//!
//! ```text
//!   px = 320 − x·1.6          (±200 mm  → 0..640)
//!   py = 480 − (y − 100)·1.2  (100..500 mm → 480..0)
//! ```
//!
//! Joint order per digit follows the 21-point topology: the base of the
//! proximal bone, then the bases of the intermediate and distal bones, then
//! the tip.  The wrist is the base of the middle metacarpal.

use leaprs::*;
use tracing::{debug, info};

use hand_pose::{Landmark, LANDMARK_COUNT};

use crate::source::{Detection, LandmarkSource, RawHand, SourceError};

const POLL_TIMEOUT_MS: u64 = 100;

pub struct LeapSource {
    connection: Connection,
}

impl LeapSource {
    pub fn open() -> Result<Self, SourceError> {
        let mut connection = Connection::create(ConnectionConfig::default())
            .map_err(|e| SourceError::Disconnected(format!("LeapC connection: {:?}", e)))?;
        connection.open()
            .map_err(|e| SourceError::Disconnected(format!("LeapMotion device: {:?}", e)))?;
        info!("LeapMotion connection open");
        Ok(LeapSource { connection })
    }
}

fn project(x: f32, y: f32) -> (f32, f32) {
    (320.0 - x * 1.6, 480.0 - (y - 100.0) * 1.2)
}

fn hand_landmarks(hand: &Hand) -> Option<RawHand> {
    let digits: Vec<_> = hand.digits().collect();
    if digits.len() < 5 { return None; }

    let mut pts = Vec::with_capacity(LANDMARK_COUNT);
    let wrist = digits[2].metacarpal().prev_joint();
    pts.push(project(wrist.x, wrist.y));
    for digit in &digits[..5] {
        for joint in [
            digit.proximal().prev_joint(),
            digit.intermediate().prev_joint(),
            digit.distal().prev_joint(),
            digit.distal().next_joint(),
        ] {
            pts.push(project(joint.x, joint.y));
        }
    }
    Some(RawHand {
        landmarks: pts.into_iter().enumerate()
            .map(|(i, (x, y))| Landmark::new(i as u8, x, y))
            .collect(),
    })
}

impl LandmarkSource for LeapSource {
    fn next_frame(&mut self) -> Result<Detection, SourceError> {
        loop {
            let msg = self.connection.poll(POLL_TIMEOUT_MS)
                .map_err(|e| SourceError::Transient(format!("LeapC poll: {:?}", e)))?;

            if let Event::Tracking(frame) = msg.event() {
                let hands = frame.hands().filter_map(|h| hand_landmarks(&h)).collect();
                return Ok(Detection { hands });
            }
            debug!("skipping non-tracking LeapC event");
        }
    }

    fn name(&self) -> &str { "leap" }
}
