//! Software-rendered preview window using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │   camera space, mirrored like a selfie view  │
//! │     ┌──────────────────────────┐             │
//! │     │ active zone   ╲│╱        │             │
//! │     │               hand       │             │
//! │     └──────────────────────────┘             │
//! ├──────────────────────────────────────────────┤
//! │ MODE  fingers  [L] [R]                       │
//! │ frame / hands / idle / failed                │
//! │ key legend (simulation only)                 │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! In simulation mode the same window is the input device: each tick the
//! mouse and keyboard go through a [`SimController`] and out to the
//! [`SimSource`](crate::sim::SimSource) on the session worker.

use std::sync::mpsc::Sender;

use minifb::{Key, KeyRepeat, MouseMode, Window, WindowOptions};

use hand_pose::landmark::{BONES, TIP_IDS};
use hand_pose::LandmarkFrame;
use mode_engine::{ActiveZone, Mode};

use crate::session::FrameReport;
use crate::sim::{SimController, SimInput, SimKeys};

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const FRAME_W: usize = 640;
pub const FRAME_H: usize = 480;
const BAR_H:       usize = 64;
pub const WIN_W:   usize = FRAME_W;
pub const WIN_H:   usize = FRAME_H + BAR_H;
const TEXT_SCALE:  usize = 2;
const TARGET_FPS:  usize = 60;

const BG:          u32 = 0xFF101418;
const BAR_BG:      u32 = 0xFF1C2430;
const ZONE:        u32 = 0xFF3A6EA5;
const BONE:        u32 = 0xFFB8C4D0;
const JOINT:       u32 = 0xFFFFFFFF;
const TIP:         u32 = 0xFFFF4F6E;
const DIM:         u32 = 0xFF7A8594;
const LATCH_ON:    u32 = 0xFF39D353;
const LATCH_OFF:   u32 = 0xFF3A3F47;

const SIM_LEGEND: &str = "0 1 2 3 5 POSE  L/R CLICK  UP/DOWN SPREAD  ESC QUIT";

fn mode_color(mode: Mode) -> u32 {
    match mode {
        Mode::Idle       => DIM,
        Mode::Cursor     => 0xFF4FC3F7,
        Mode::Volume     => 0xFFFFB74D,
        Mode::ScrollUp   => 0xFF81C784,
        Mode::ScrollDown => 0xFFBA68C8,
    }
}

/// Camera x to window x.
fn mirror_x(x: f32) -> f32 { FRAME_W as f32 - x }

// ════════════════════════════════════════════════════════════════════════════
// Status text
// ════════════════════════════════════════════════════════════════════════════

/// First status line: mode and finger vector.
pub fn mode_line(report: Option<&FrameReport>) -> String {
    match report {
        None => "WAITING FOR FRAMES".to_string(),
        Some(r) => {
            let fingers = r.outcome.fingers
                .map(|f| f.to_string())
                .unwrap_or_else(|| "-----".to_string());
            format!("{}  {}", r.outcome.mode.label().to_uppercase(), fingers)
        }
    }
}

/// Second status line: counters.
pub fn counter_line(report: Option<&FrameReport>) -> String {
    match report {
        None => String::new(),
        Some(r) => format!(
            "FRAME {}  HANDS {}  IDLE {}  FAILED {}",
            r.seq, r.hands, r.outcome.idle_frames, r.outcome.failures,
        ),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Preview
// ════════════════════════════════════════════════════════════════════════════

pub struct Preview {
    window: Window,
    buf:    Vec<u32>,
    zone:   ActiveZone,
    sim:    Option<(SimController, Sender<SimInput>)>,
}

impl Preview {
    /// Open the window.  With `sim_tx` set the window also drives the
    /// simulation source.
    pub fn new(zone: ActiveZone, sim_tx: Option<Sender<SimInput>>) -> Result<Self, minifb::Error> {
        let mut window = Window::new(
            "gesture_pilot",
            WIN_W, WIN_H,
            WindowOptions { resize: false, ..WindowOptions::default() },
        )?;
        window.set_target_fps(TARGET_FPS);

        Ok(Preview {
            window,
            buf: vec![BG; WIN_W * WIN_H],
            zone,
            sim: sim_tx.map(|tx| (SimController::default(), tx)),
        })
    }

    /// Poll the window.  Returns false when the user wants to quit.
    pub fn poll_input(&mut self) -> bool {
        if !self.window.is_open()
            || self.window.is_key_down(Key::Escape)
            || self.window.is_key_pressed(Key::Q, KeyRepeat::No)
        {
            return false;
        }

        let Some((ctrl, tx)) = self.sim.as_mut() else { return true };

        let w = &self.window;
        let digit = [
            (Key::Key0, 0), (Key::Key1, 1), (Key::Key2, 2), (Key::Key3, 3), (Key::Key5, 5),
        ].into_iter()
            .find(|&(k, _)| w.is_key_pressed(k, KeyRepeat::No))
            .map(|(_, d)| d);
        let keys = SimKeys {
            digit,
            left:     w.is_key_down(Key::L),
            right:    w.is_key_down(Key::R),
            wider:    w.is_key_down(Key::Up),
            narrower: w.is_key_down(Key::Down),
        };
        let pointer = w.get_mouse_pos(MouseMode::Discard)
            .filter(|&(_, y)| y < FRAME_H as f32);

        // The session hanging up is reported through its own events.
        let _ = tx.send(ctrl.input(pointer, &keys));
        true
    }

    /// Render one frame from the latest report.
    pub fn render(&mut self, report: Option<&FrameReport>) {
        self.buf.fill(BG);
        self.draw_zone();

        if let Some(frame) = report.and_then(|r| r.outcome.frame.as_ref()) {
            self.draw_hand(frame);
        }

        // ── status bar ───────────────────────────────────────────────────
        self.fill_rect(0, FRAME_H, WIN_W, BAR_H, BAR_BG);
        let mode = report.map_or(Mode::Idle, |r| r.outcome.mode);
        self.draw_text(&mode_line(report), 8, FRAME_H + 6, mode_color(mode));
        self.draw_text(&counter_line(report), 8, FRAME_H + 24, DIM);

        let cursor = report.map(|r| r.outcome.cursor).unwrap_or_default();
        self.draw_latch("L", WIN_W - 64, FRAME_H + 6, cursor.left_latch);
        self.draw_latch("R", WIN_W - 32, FRAME_H + 6, cursor.right_latch);

        if self.sim.is_some() {
            self.draw_text(SIM_LEGEND, 8, FRAME_H + 44, DIM);
        }

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    // ── scene ─────────────────────────────────────────────────────────────

    fn draw_zone(&mut self) {
        let (x0, x1) = (mirror_x(self.zone.x.high()), mirror_x(self.zone.x.low()));
        let (y0, y1) = (self.zone.y.low(), self.zone.y.high());
        let (x0, y0) = (x0.max(0.0) as usize, y0.max(0.0) as usize);
        let (x1, y1) = (x1.max(0.0) as usize, y1.max(0.0) as usize);
        self.draw_border(x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0), ZONE);
    }

    fn draw_hand(&mut self, frame: &LandmarkFrame) {
        let at = |id: usize| {
            let (x, y) = frame.point(id);
            (mirror_x(x) as isize, y as isize)
        };
        for &(a, b) in BONES.iter() {
            let (p, q) = (at(a), at(b));
            self.draw_line(p, q, BONE);
        }
        for lm in frame.iter() {
            let p = at(lm.id as usize);
            self.fill_circle(p, 3, JOINT);
        }
        for &tip in TIP_IDS.iter() {
            self.fill_circle(at(tip), 5, TIP);
        }
    }

    fn draw_latch(&mut self, label: &str, x: usize, y: usize, on: bool) {
        self.fill_rect(x, y, 24, 16, if on { LATCH_ON } else { LATCH_OFF });
        self.draw_text(label, x + 9, y + 3, if on { BG } else { DIM });
    }

    // ── primitives ────────────────────────────────────────────────────────

    fn set_pixel(&mut self, x: isize, y: isize, color: u32) {
        if x >= 0 && y >= 0 && (x as usize) < WIN_W && (y as usize) < WIN_H {
            self.buf[y as usize * WIN_W + x as usize] = color;
        }
    }

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(WIN_H) {
            let start = row * WIN_W;
            for px in &mut self.buf[start + x.min(WIN_W)..start + (x + w).min(WIN_W)] {
                *px = color;
            }
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        if w == 0 || h == 0 { return; }
        let (x0, y0) = (x as isize, y as isize);
        let (x1, y1) = (x0 + w as isize - 1, y0 + h as isize - 1);
        self.draw_line((x0, y0), (x1, y0), color);
        self.draw_line((x0, y1), (x1, y1), color);
        self.draw_line((x0, y0), (x0, y1), color);
        self.draw_line((x1, y0), (x1, y1), color);
    }

    /// Bresenham.
    fn draw_line(&mut self, from: (isize, isize), to: (isize, isize), color: u32) {
        let (mut x, mut y) = from;
        let dx = (to.0 - x).abs();
        let dy = -(to.1 - y).abs();
        let sx = if x < to.0 { 1 } else { -1 };
        let sy = if y < to.1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.set_pixel(x, y, color);
            if (x, y) == to { break; }
            let e2 = 2 * err;
            if e2 >= dy { err += dy; x += sx; }
            if e2 <= dx { err += dx; y += sy; }
        }
    }

    fn fill_circle(&mut self, c: (isize, isize), r: isize, color: u32) {
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy <= r * r {
                    self.set_pixel(c.0 + dx, c.1 + dy, color);
                }
            }
        }
    }

    fn draw_text(&mut self, text: &str, x: usize, y: usize, color: u32) {
        let advance = (GLYPH_W + 1) * TEXT_SCALE;
        for (i, ch) in text.chars().enumerate() {
            let gx = x + i * advance;
            if gx + advance > WIN_W { break; }
            let g = glyph(ch);
            for row in 0..GLYPH_H {
                for col in 0..GLYPH_W {
                    if glyph_bit(g, row, col) {
                        self.fill_rect(
                            gx + col * TEXT_SCALE, y + row * TEXT_SCALE,
                            TEXT_SCALE, TEXT_SCALE, color,
                        );
                    }
                }
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// 3×5 font, one glyph per u16: rows top to bottom, 3 bits each, row 0 in the
// high bits.  Lowercase renders as uppercase.
// ────────────────────────────────────────────────────────────────────────────

const GLYPH_W: usize = 3;
const GLYPH_H: usize = 5;
const UNKNOWN: u16 = 0b110_001_010_000_010;

fn glyph_bit(g: u16, row: usize, col: usize) -> bool {
    (g >> (14 - (row * GLYPH_W + col))) & 1 == 1
}

fn glyph(c: char) -> u16 {
    match c.to_ascii_uppercase() {
        'A' => 0b010_101_111_101_101, 'B' => 0b110_101_110_101_110,
        'C' => 0b011_100_100_100_011, 'D' => 0b110_101_101_101_110,
        'E' => 0b111_100_110_100_111, 'F' => 0b111_100_110_100_100,
        'G' => 0b011_100_101_101_011, 'H' => 0b101_101_111_101_101,
        'I' => 0b111_010_010_010_111, 'J' => 0b001_001_001_101_010,
        'K' => 0b101_101_110_101_101, 'L' => 0b100_100_100_100_111,
        'M' => 0b101_111_111_101_101, 'N' => 0b110_101_101_101_101,
        'O' => 0b010_101_101_101_010, 'P' => 0b110_101_110_100_100,
        'Q' => 0b010_101_101_110_011, 'R' => 0b110_101_110_101_101,
        'S' => 0b011_100_010_001_110, 'T' => 0b111_010_010_010_010,
        'U' => 0b101_101_101_101_111, 'V' => 0b101_101_101_101_010,
        'W' => 0b101_101_111_111_101, 'X' => 0b101_101_010_101_101,
        'Y' => 0b101_101_010_010_010, 'Z' => 0b111_001_010_100_111,
        '0' => 0b111_101_101_101_111, '1' => 0b010_110_010_010_111,
        '2' => 0b110_001_010_100_111, '3' => 0b110_001_010_001_110,
        '4' => 0b101_101_111_001_001, '5' => 0b111_100_110_001_110,
        '6' => 0b011_100_111_101_111, '7' => 0b111_001_010_010_010,
        '8' => 0b111_101_111_101_111, '9' => 0b111_101_111_001_110,
        ' ' => 0,
        '-' => 0b000_000_111_000_000, ':' => 0b000_010_000_010_000,
        '.' => 0b000_000_000_000_010, '/' => 0b001_001_010_100_100,
        '=' => 0b000_111_000_111_000, '%' => 0b101_001_010_100_101,
        '+' => 0b000_010_111_010_000, '_' => 0b000_000_000_000_111,
        '(' => 0b010_100_100_100_010, ')' => 0b010_001_001_001_010,
        _   => UNKNOWN,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
