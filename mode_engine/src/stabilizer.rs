//! Temporal stabilizer: quorum voting over the last K raw labels.
//!
//! A label must appear at least T times in the window before it becomes the
//! stable mode, and the mode falls back to `Idle` as soon as no label holds a
//! quorum.  With the defaults (K = 5, T = 4) a gesture registers on its
//! fourth consecutive frame and releases once two of the last five frames
//! disagree.

use std::collections::VecDeque;

use hand_pose::GestureLabel;

use crate::mode::Mode;

/// Candidates in tie-break order; the first to reach quorum wins.
pub const PRIORITY: [GestureLabel; 4] = [
    GestureLabel::Cursor,
    GestureLabel::Volume,
    GestureLabel::ScrollDown,
    GestureLabel::ScrollUp,
];

#[derive(Debug, Clone)]
pub struct Stabilizer {
    history:  VecDeque<GestureLabel>,
    capacity: usize,
    quorum:   usize,
}

impl Stabilizer {
    /// `capacity` and `quorum` are assumed validated (`1 <= quorum <= capacity`).
    pub fn new(capacity: usize, quorum: usize) -> Self {
        Stabilizer {
            history: VecDeque::with_capacity(capacity),
            capacity,
            quorum,
        }
    }

    /// Record one raw label and return the resulting stable mode.
    pub fn push(&mut self, label: GestureLabel) -> Mode {
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(label);
        self.vote()
    }

    /// Stable mode for the current window without adding a label.
    pub fn vote(&self) -> Mode {
        PRIORITY.iter()
            .find(|&&candidate| self.count(candidate) >= self.quorum)
            .map(|&label| Mode::from(label))
            .unwrap_or(Mode::Idle)
    }

    pub fn count(&self, label: GestureLabel) -> usize {
        self.history.iter().filter(|&&l| l == label).count()
    }

    pub fn clear(&mut self) { self.history.clear(); }

    pub fn history(&self) -> impl Iterator<Item = &GestureLabel> { self.history.iter() }
    pub fn len(&self) -> usize { self.history.len() }
    pub fn is_empty(&self) -> bool { self.history.is_empty() }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use GestureLabel::*;

    fn feed(s: &mut Stabilizer, labels: &[GestureLabel]) -> Vec<Mode> {
        labels.iter().map(|&l| s.push(l)).collect()
    }

    #[test]
    fn registers_on_the_quorum_frame() {
        let mut s = Stabilizer::new(5, 4);
        let modes = feed(&mut s, &[ScrollUp; 5]);
        assert_eq!(modes, vec![
            Mode::Idle, Mode::Idle, Mode::Idle, Mode::ScrollUp, Mode::ScrollUp,
        ]);
    }

    #[test]
    fn single_frame_glitch_is_absorbed() {
        let mut s = Stabilizer::new(5, 4);
        feed(&mut s, &[Cursor; 5]);
        assert_eq!(s.push(None), Mode::Cursor);
        assert_eq!(s.push(Cursor), Mode::Cursor);
    }

    #[test]
    fn two_disagreeing_frames_release_to_idle() {
        let mut s = Stabilizer::new(5, 4);
        feed(&mut s, &[Volume; 5]);
        s.push(None);
        assert_eq!(s.push(None), Mode::Idle);
    }

    #[test]
    fn priority_breaks_ties() {
        // K = 6, T = 3 lets two labels hold quorum at once.
        let pairs = [
            (Cursor, Volume, Mode::Cursor),
            (Volume, ScrollDown, Mode::Volume),
            (ScrollDown, ScrollUp, Mode::ScrollDown),
            (ScrollUp, Cursor, Mode::Cursor),
        ];
        for (a, b, want) in pairs {
            let mut s = Stabilizer::new(6, 3);
            assert_eq!(*feed(&mut s, &[a, b, a, b, a, b]).last().unwrap(), want);
        }
    }

    #[test]
    fn every_quorum_history_resolves_to_its_label() {
        for label in PRIORITY {
            for noise in GestureLabel::ALL {
                if noise == label { continue; }
                let mut s = Stabilizer::new(5, 4);
                let mode = *feed(&mut s, &[label, noise, label, label, label]).last().unwrap();
                assert_eq!(mode, Mode::from(label), "{:?} with {:?}", label, noise);
            }
        }
    }

    #[test]
    fn none_never_wins_a_vote() {
        let mut s = Stabilizer::new(5, 4);
        assert_eq!(*feed(&mut s, &[None; 5]).last().unwrap(), Mode::Idle);
        assert_eq!(s.count(None), 5);
    }

    #[test]
    fn history_is_bounded() {
        let mut s = Stabilizer::new(5, 4);
        feed(&mut s, &[Cursor; 12]);
        assert_eq!(s.len(), 5);
        s.clear();
        assert!(s.is_empty());
        assert_eq!(s.vote(), Mode::Idle);
    }
}
