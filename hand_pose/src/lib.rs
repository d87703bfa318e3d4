//! # hand_pose
//!
//! Per-frame hand geometry: the 21-point landmark model, the finger-state
//! extractor, the fixed gesture table, a moving-average landmark smoother
//! and a synthetic pose builder.  Everything here is pure and stateless
//! except the smoother.
//!
//! ## Pipeline position
//!
//! ```text
//! detector points ─▶ LandmarkFrame ─▶ (LandmarkSmoother) ─▶ FingerState ─▶ GestureLabel
//! ```
//!
//! ## Quick start
//!
//! ```rust
//! use hand_pose::{classify, FingerState, GestureLabel};
//!
//! let v = FingerState([false, true, false, false, false]);
//! assert_eq!(classify(v), GestureLabel::ScrollUp);
//! ```

pub mod landmark;
pub mod fingers;
pub mod classify;
pub mod smooth;
pub mod pose;

pub use landmark::{Landmark, LandmarkFrame, LANDMARK_COUNT};
pub use fingers::FingerState;
pub use classify::{classify, GestureLabel};
pub use smooth::LandmarkSmoother;
pub use pose::synthesize;
