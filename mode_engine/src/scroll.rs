//! Scroll mapper: one fixed-size delta per frame while a scroll mode holds.

use tracing::warn;

use crate::mode::Mode;
use crate::surface::InputSurface;

#[derive(Clone, Copy, Debug)]
pub struct ScrollMapper {
    step: i32,
}

impl ScrollMapper {
    pub fn new(step: i32) -> Self { ScrollMapper { step } }

    /// Positive scrolls up.  `None` outside the scroll modes.
    pub fn delta_for(&self, mode: Mode) -> Option<i32> {
        match mode {
            Mode::ScrollUp   => Some(self.step),
            Mode::ScrollDown => Some(-self.step),
            _ => None,
        }
    }

    pub fn update(&self, mode: Mode, input: &mut dyn InputSurface) -> u32 {
        let Some(delta) = self.delta_for(mode) else { return 0 };
        match input.scroll(delta) {
            Ok(()) => 0,
            Err(e) => {
                warn!(delta, "scroll command failed: {}", e);
                1
            }
        }
    }
}
