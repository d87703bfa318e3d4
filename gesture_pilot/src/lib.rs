//! # gesture_pilot
//!
//! Drives the desktop from hand gestures: a landmark source feeds the
//! [`mode_engine`] dispatcher on a worker thread, which moves the mouse,
//! clicks, scrolls and sets the volume.
//!
//! ## Gesture → Action mapping
//!
//! | Fingers up (thumb..pinky) | Mode | Action |
//! |---|---|---|
//! | `01000` | Scroll Up | scroll up every frame |
//! | `01100` | Scroll Down | scroll down every frame |
//! | `11000` | Volume | thumb–index distance sets the volume |
//! | `11111` | Cursor | middle fingertip steers the pointer |
//! | thumb tucked in Cursor | | left button held |
//! | index bent in Cursor | | right button held |
//!
//! Anything else, or 30 frames without a hand, returns to Idle and releases
//! held buttons.
//!
//! ## Landmark sources
//!
//! * `sim`: the preview window fakes a hand (see [`sim`] for the keys).
//! * `stdin` / `spawn`: JSON lines from an external detector (see [`source`]).
//! * `leap`: LeapMotion hardware, behind the `leap` feature.
//!
//! ## Feature flags
//!
//! * (default): simulation and detector sidecar input.
//! * `leap`: **Hardware mode**: polls a real LeapMotion controller via LeapC.

pub mod source;
pub mod sim;
#[cfg(feature = "leap")]
pub mod leap;
pub mod backend;
pub mod session;
pub mod settings;
pub mod preview;
pub mod app;
