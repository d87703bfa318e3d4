//! # mode_engine
//!
//! Turns per-frame hand landmarks into debounced OS input.
//!
//! A raw gesture label is noisy from frame to frame.  The [`Stabilizer`]
//! holds a short history and only reports a mode once it has a quorum, and
//! the [`ModeDispatcher`] routes each frame to the mapper for that mode:
//!
//! | Mode         | Mapper           | Output                             |
//! |--------------|------------------|------------------------------------|
//! | `Cursor`     | [`CursorMapper`] | absolute move, left/right latches  |
//! | `Volume`     | [`VolumeMapper`] | absolute volume level              |
//! | `ScrollUp`   | [`ScrollMapper`] | `+scroll_step` per frame           |
//! | `ScrollDown` | [`ScrollMapper`] | `-scroll_step` per frame           |
//! | `Idle`       | none             | held buttons released on entry     |
//!
//! Output goes through the [`InputSurface`] and [`AudioSurface`] traits,
//! which the application crate implements for the real platform.
//!
//! ## Quick start
//!
//! ```rust
//! use mode_engine::{EngineConfig, ModeDispatcher, Mode, ScreenSize, Span};
//!
//! let cfg = EngineConfig::default();
//! let d = ModeDispatcher::new(&cfg, ScreenSize::new(1920, 1080), Span::new(0.0, 100.0)).unwrap();
//! assert_eq!(d.mode(), Mode::Idle);
//! ```

pub mod config;
pub mod mode;
pub mod stabilizer;
pub mod surface;
pub mod cursor;
pub mod volume;
pub mod scroll;
pub mod dispatcher;

pub use config::{ActiveZone, ConfigError, EngineConfig, ScreenSize, Span, ZoneOverflow};
pub use mode::Mode;
pub use stabilizer::Stabilizer;
pub use surface::{AudioSurface, InputSurface, MouseButton, SurfaceError};
pub use cursor::{CursorMapper, CursorState};
pub use volume::VolumeMapper;
pub use scroll::ScrollMapper;
pub use dispatcher::{FrameOutcome, ModeDispatcher};
