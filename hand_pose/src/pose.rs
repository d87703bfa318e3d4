//! Synthetic hand poses.
//!
//! Builds a complete [`LandmarkFrame`] for any finger-state vector, laid out
//! so that [`FingerState::from_frame`] reads the requested flags back.  Used
//! by the simulation source and by tests that need realistic frames.
//!
//! Layout, palm centre at `(cx, cy)`, image y growing downwards: the thumb
//! sits to the right of the index column, so an extended thumb points right
//! and a tucked thumb crosses the palm to the left of the index knuckle.

use crate::fingers::FingerState;
use crate::landmark::{Landmark, LandmarkFrame, LANDMARK_COUNT};

/// Thumb–index spread used when nobody asks for a specific one.
pub const DEFAULT_SPREAD: f32 = 120.0;

/// Horizontal offset of each finger column from the palm centre.
const COLUMNS: [f32; 4] = [20.0, 0.0, -20.0, -40.0];

/// Offset from the palm centre to an extended middle fingertip.
pub const MIDDLE_TIP_OFFSET: (f32, f32) = (0.0, -100.0);

/// Build a hand at `palm` showing `state`.
///
/// `spread` is the thumb-tip to index-tip distance when the thumb is
/// extended, measured from where an extended index tip would be.
pub fn synthesize(state: FingerState, palm: (f32, f32), spread: f32) -> LandmarkFrame {
    let (cx, cy) = palm;
    let mut pts = [(0.0f32, 0.0f32); LANDMARK_COUNT];

    pts[0] = (cx, cy + 40.0);

    // ── thumb ────────────────────────────────────────────────────────────
    pts[1] = (cx + 25.0, cy + 30.0);
    pts[2] = (cx + 40.0, cy + 15.0);
    if state.thumb() {
        let reach = spread.max(0.0) * std::f32::consts::FRAC_1_SQRT_2;
        let tip = (cx + COLUMNS[0] + reach, cy - 100.0 + reach);
        pts[4] = tip;
        pts[3] = (tip.0 - 12.0, tip.1 + 12.0);
    } else {
        pts[3] = (cx + 35.0, cy);
        pts[4] = (cx + 5.0, cy - 10.0);
    }

    // ── fingers ──────────────────────────────────────────────────────────
    for (f, &dx) in COLUMNS.iter().enumerate() {
        let base = 5 + 4 * f;
        let x = cx + dx;
        pts[base]     = (x, cy - 20.0);
        pts[base + 1] = (x, cy - 50.0);
        if state.0[f + 1] {
            pts[base + 2] = (x, cy - 75.0);
            pts[base + 3] = (x, cy - 100.0);
        } else {
            pts[base + 2] = (x, cy - 40.0);
            pts[base + 3] = (x, cy - 30.0);
        }
    }

    let landmarks: [Landmark; LANDMARK_COUNT] =
        std::array::from_fn(|i| Landmark::new(i as u8, pts[i].0, pts[i].1));
    LandmarkFrame::from_array(landmarks)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{INDEX_PIP, INDEX_TIP, MIDDLE_TIP, THUMB_TIP};

    fn all_states() -> impl Iterator<Item = FingerState> {
        (0u8..32).map(|bits| FingerState(std::array::from_fn(|i| bits & (1 << i) != 0)))
    }

    #[test]
    fn every_state_reads_back() {
        for s in all_states() {
            let frame = synthesize(s, (300.0, 250.0), DEFAULT_SPREAD);
            assert_eq!(FingerState::from_frame(&frame), s, "{}", s);
        }
    }

    #[test]
    fn spread_is_the_thumb_index_distance() {
        let open = FingerState([true, true, false, false, false]);
        for spread in [40.0, 120.0, 250.0] {
            let frame = synthesize(open, (320.0, 240.0), spread);
            assert!((frame.distance(THUMB_TIP, INDEX_TIP) - spread).abs() < 1e-3);
        }
    }

    #[test]
    fn click_poses_trip_their_conditions() {
        let palm = (320.0, 240.0);
        let open = synthesize(FingerState([true; 5]), palm, DEFAULT_SPREAD);
        assert!(open.x(THUMB_TIP) >= open.x(INDEX_TIP));
        assert!(open.y(INDEX_TIP) <= open.y(INDEX_PIP));

        let left = synthesize(FingerState([false, true, true, true, true]), palm, DEFAULT_SPREAD);
        assert!(left.x(THUMB_TIP) < left.x(INDEX_TIP));

        let right = synthesize(FingerState([true, false, true, true, true]), palm, DEFAULT_SPREAD);
        assert!(right.y(INDEX_TIP) > right.y(INDEX_PIP));
    }

    #[test]
    fn middle_tip_offset_matches_layout() {
        let frame = synthesize(FingerState([true; 5]), (200.0, 200.0), DEFAULT_SPREAD);
        assert_eq!(
            frame.point(MIDDLE_TIP),
            (200.0 + MIDDLE_TIP_OFFSET.0, 200.0 + MIDDLE_TIP_OFFSET.1),
        );
    }
}
