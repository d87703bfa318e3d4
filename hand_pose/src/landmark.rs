//! Landmark data model for one detected hand.
//!
//! Ids follow the 21-point hand topology emitted by common landmark
//! detectors: the wrist at 0, then four joints per digit ordered from the
//! knuckle outwards, so every fingertip id is a multiple of four.
//!
//! ```text
//!          8   12  16  20        tips
//!          7   11  15  19
//!      4   6   10  14  18        lower joints used by the "up" test
//!      3   5   9   13  17
//!      2
//!      1
//!              0                 wrist
//! ```

// ════════════════════════════════════════════════════════════════════════════
// Topology
// ════════════════════════════════════════════════════════════════════════════

/// Number of landmarks in a complete hand.
pub const LANDMARK_COUNT: usize = 21;

pub const WRIST:      usize = 0;
pub const THUMB_IP:   usize = 3;
pub const THUMB_TIP:  usize = 4;
pub const INDEX_MCP:  usize = 5;
pub const INDEX_PIP:  usize = 6;
pub const INDEX_TIP:  usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_TIP: usize = 12;
pub const RING_PIP:   usize = 14;
pub const RING_TIP:   usize = 16;
pub const PINKY_MCP:  usize = 17;
pub const PINKY_PIP:  usize = 18;
pub const PINKY_TIP:  usize = 20;

/// Fingertip ids, thumb first.
pub const TIP_IDS: [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

/// Bones as `(from, to)` id pairs, for drawing a skeleton.
pub const BONES: [(usize, usize); 21] = [
    (0, 1), (1, 2), (2, 3), (3, 4),
    (0, 5), (5, 6), (6, 7), (7, 8),
    (5, 9), (9, 10), (10, 11), (11, 12),
    (9, 13), (13, 14), (14, 15), (15, 16),
    (13, 17), (17, 18), (18, 19), (19, 20),
    (0, 17),
];

// ════════════════════════════════════════════════════════════════════════════
// Landmark
// ════════════════════════════════════════════════════════════════════════════

/// One labelled keypoint in image pixel space (y grows downwards).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub id: u8,
    pub x:  f32,
    pub y:  f32,
}

impl Landmark {
    pub fn new(id: u8, x: f32, y: f32) -> Self {
        Landmark { id, x, y }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkFrame
// ════════════════════════════════════════════════════════════════════════════

/// A complete hand: all 21 landmarks, stored by id.
///
/// The only way to build one is through the validating constructors, so a
/// `LandmarkFrame` value always holds every id exactly once.  Anything short
/// of that is rejected and the caller treats the frame as handless.
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkFrame {
    points: [Landmark; LANDMARK_COUNT],
}

impl LandmarkFrame {
    /// Build from labelled landmarks in any order.
    ///
    /// Returns `None` if an id is missing, repeated, or out of range.
    pub fn from_landmarks(landmarks: &[Landmark]) -> Option<Self> {
        if landmarks.len() != LANDMARK_COUNT {
            return None;
        }
        let mut seen = [false; LANDMARK_COUNT];
        let mut points = [Landmark::default(); LANDMARK_COUNT];
        for lm in landmarks {
            let id = lm.id as usize;
            if id >= LANDMARK_COUNT || seen[id] {
                return None;
            }
            seen[id] = true;
            points[id] = *lm;
        }
        Some(LandmarkFrame { points })
    }

    /// Build from positional `(x, y)` pairs where the slice index is the id.
    pub fn from_points(points: &[(f32, f32)]) -> Option<Self> {
        if points.len() != LANDMARK_COUNT {
            return None;
        }
        let mut out = [Landmark::default(); LANDMARK_COUNT];
        for (i, &(x, y)) in points.iter().enumerate() {
            out[i] = Landmark::new(i as u8, x, y);
        }
        Some(LandmarkFrame { points: out })
    }

    /// Ids are taken from the array position.
    pub(crate) fn from_array(mut points: [Landmark; LANDMARK_COUNT]) -> Self {
        for (i, lm) in points.iter_mut().enumerate() {
            lm.id = i as u8;
        }
        LandmarkFrame { points }
    }

    /// Landmark by id.  Panics if `id >= 21`; ids are compile-time constants
    /// everywhere in this workspace.
    pub fn get(&self, id: usize) -> Landmark { self.points[id] }

    pub fn x(&self, id: usize) -> f32 { self.points[id].x }
    pub fn y(&self, id: usize) -> f32 { self.points[id].y }

    /// Position of one landmark as an `(x, y)` pair.
    pub fn point(&self, id: usize) -> (f32, f32) {
        let lm = self.points[id];
        (lm.x, lm.y)
    }

    /// Euclidean pixel distance between two landmarks.
    pub fn distance(&self, a: usize, b: usize) -> f32 {
        let dx = self.x(b) - self.x(a);
        let dy = self.y(b) - self.y(a);
        dx.hypot(dy)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Landmark> {
        self.points.iter()
    }

    pub fn landmarks(&self) -> &[Landmark; LANDMARK_COUNT] { &self.points }

    /// Axis-aligned bounding box `(min_x, min_y, max_x, max_y)`.
    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        self.points.iter().fold(
            (f32::MAX, f32::MAX, f32::MIN, f32::MIN),
            |(x0, y0, x1, y1), lm| (x0.min(lm.x), y0.min(lm.y), x1.max(lm.x), y1.max(lm.y)),
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Vec<(f32, f32)> {
        (0..LANDMARK_COUNT).map(|i| (i as f32 * 10.0, 100.0 - i as f32)).collect()
    }

    #[test]
    fn positional_points_take_their_index_as_id() {
        let frame = LandmarkFrame::from_points(&grid()).unwrap();
        assert_eq!(frame.get(INDEX_TIP), Landmark::new(8, 80.0, 92.0));
        assert_eq!(frame.point(WRIST), (0.0, 100.0));
    }

    #[test]
    fn short_point_list_is_rejected() {
        let mut pts = grid();
        pts.pop();
        assert!(LandmarkFrame::from_points(&pts).is_none());
        assert!(LandmarkFrame::from_points(&[]).is_none());
    }

    #[test]
    fn labelled_landmarks_are_reordered_by_id() {
        let mut lms: Vec<Landmark> = grid().iter().enumerate()
            .map(|(i, &(x, y))| Landmark::new(i as u8, x, y))
            .collect();
        lms.reverse();
        let frame = LandmarkFrame::from_landmarks(&lms).unwrap();
        for (i, lm) in frame.iter().enumerate() {
            assert_eq!(lm.id as usize, i);
        }
    }

    #[test]
    fn duplicated_or_out_of_range_ids_are_rejected() {
        let mut lms: Vec<Landmark> = (0..21).map(|i| Landmark::new(i, 0.0, 0.0)).collect();
        lms[20].id = 3;
        assert!(LandmarkFrame::from_landmarks(&lms).is_none());
        lms[20].id = 21;
        assert!(LandmarkFrame::from_landmarks(&lms).is_none());
    }

    #[test]
    fn distance_is_euclidean() {
        let mut pts = vec![(0.0, 0.0); LANDMARK_COUNT];
        pts[THUMB_TIP] = (100.0, 100.0);
        pts[INDEX_TIP] = (130.0, 140.0);
        let frame = LandmarkFrame::from_points(&pts).unwrap();
        assert!((frame.distance(THUMB_TIP, INDEX_TIP) - 50.0).abs() < 1e-4);
    }

    #[test]
    fn bounds_cover_every_point() {
        let frame = LandmarkFrame::from_points(&grid()).unwrap();
        assert_eq!(frame.bounds(), (0.0, 80.0, 200.0, 100.0));
    }
}
