//! Landmark sources: where hand keypoints come from.
//!
//! The public interface is the [`LandmarkSource`] trait.  The session worker
//! calls `next_frame` in a loop and does not care whether the hands came from
//! the simulation window, a detector sidecar process, or LeapMotion hardware.

use std::io::{self, BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use hand_pose::{Landmark, LandmarkFrame};

// ════════════════════════════════════════════════════════════════════════════
// Detection
// ════════════════════════════════════════════════════════════════════════════

/// Raw keypoints for one hand, as the detector reported them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawHand {
    pub landmarks: Vec<Landmark>,
}

impl RawHand {
    pub fn to_frame(&self) -> Option<LandmarkFrame> {
        LandmarkFrame::from_landmarks(&self.landmarks)
    }
}

impl From<&LandmarkFrame> for RawHand {
    fn from(frame: &LandmarkFrame) -> Self {
        RawHand { landmarks: frame.landmarks().to_vec() }
    }
}

/// Everything detected in one captured frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Detection {
    pub hands: Vec<RawHand>,
}

impl Detection {
    pub fn empty() -> Self { Detection::default() }

    pub fn single(frame: &LandmarkFrame) -> Self {
        Detection { hands: vec![RawHand::from(frame)] }
    }

    /// The first hand that forms a complete frame.
    pub fn primary_frame(&self) -> Option<LandmarkFrame> {
        self.hands.iter().find_map(RawHand::to_frame)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSource trait
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum SourceError {
    /// One frame was lost; the next read may succeed.
    #[error("transient read failure: {0}")]
    Transient(String),
    /// The source is gone for good.
    #[error("source disconnected: {0}")]
    Disconnected(String),
    /// Nothing arrived within the poll interval.  Not a frame; the caller
    /// checks for a stop request and asks again.
    #[error("no frame within the poll interval")]
    Timeout,
    #[error("source i/o error")]
    Io(#[from] io::Error),
}

impl SourceError {
    pub fn is_transient(&self) -> bool { matches!(self, SourceError::Transient(_)) }
}

/// Anything that can deliver detected hands, one captured frame per call.
///
/// `next_frame` may block, but a source that can stall indefinitely should
/// give up after a bounded wait with [`SourceError::Timeout`] so a stop
/// request can reach the worker.  Sources are opened on the session worker
/// thread and dropped there, which releases the device.
pub trait LandmarkSource {
    fn next_frame(&mut self) -> Result<Detection, SourceError>;

    fn name(&self) -> &str { "source" }
}

// ════════════════════════════════════════════════════════════════════════════
// JSON-lines wire format
// ════════════════════════════════════════════════════════════════════════════

/// Virtual frame size assumed when a message omits `width` / `height`.
pub const DEFAULT_FRAME_W: f32 = 640.0;
pub const DEFAULT_FRAME_H: f32 = 480.0;

/// Handshake a detector sidecar may print before its first frame.
pub const READY_LINE: &str = "READY";

#[derive(Debug, Deserialize)]
struct WireFrame {
    #[serde(default)]
    hands:      Vec<WireHand>,
    width:      Option<f32>,
    height:     Option<f32>,
    #[serde(default)]
    normalized: bool,
    error:      Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireHand {
    landmarks: Vec<WirePoint>,
}

#[derive(Debug, Deserialize)]
struct WirePoint {
    /// Defaults to the position in the list.
    id: Option<u8>,
    x:  f32,
    y:  f32,
}

/// Parse one detector line.
///
/// A message carrying `error` is logged and yields no hands; malformed JSON
/// is a transient failure.
pub fn parse_line(line: &str) -> Result<Detection, SourceError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Detection::empty());
    }
    let wire: WireFrame = serde_json::from_str(line)
        .map_err(|e| SourceError::Transient(format!("bad detector line: {}", e)))?;

    if let Some(err) = wire.error {
        warn!("detector reported: {}", err);
        return Ok(Detection::empty());
    }

    let (sx, sy) = if wire.normalized {
        (wire.width.unwrap_or(DEFAULT_FRAME_W), wire.height.unwrap_or(DEFAULT_FRAME_H))
    } else {
        (1.0, 1.0)
    };
    let hands = wire.hands.into_iter().map(|h| RawHand {
        landmarks: h.landmarks.into_iter().enumerate().map(|(i, p)| {
            let id = p.id.unwrap_or(i.min(u8::MAX as usize) as u8);
            Landmark::new(id, p.x * sx, p.y * sy)
        }).collect(),
    }).collect();
    Ok(Detection { hands })
}

// ════════════════════════════════════════════════════════════════════════════
// JsonLinesSource — stdin or a detector sidecar process
// ════════════════════════════════════════════════════════════════════════════

/// How long `next_frame` waits for a detector line before reporting
/// [`SourceError::Timeout`].
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Reads one JSON detection per line.
///
/// Lines are read on a helper thread and handed over through a channel, so
/// `next_frame` never blocks longer than [`POLL_INTERVAL`] even when the
/// detector goes quiet.  Bytes that are not UTF-8 are replaced before
/// parsing, which makes such a line a transient failure like any other
/// malformed line.
///
/// When built with [`JsonLinesSource::spawn`] the sidecar process is owned by
/// the source and killed when it is dropped; its stdout then closes and the
/// reader thread exits.
pub struct JsonLinesSource {
    lines: Receiver<io::Result<Vec<u8>>>,
    child: Option<Child>,
    label: String,
}

impl JsonLinesSource {
    pub fn from_reader<R: BufRead + Send + 'static>(reader: R) -> Self {
        Self::with_label(reader, "json-lines")
    }

    fn with_label<R: BufRead + Send + 'static>(reader: R, label: &str) -> Self {
        JsonLinesSource {
            lines: spawn_line_reader(reader, label),
            child: None,
            label: label.to_string(),
        }
    }

    pub fn stdin() -> Self {
        Self::with_label(BufReader::new(io::stdin()), "stdin")
    }

    /// Start `command` (split on whitespace) and read its stdout.
    pub fn spawn(command: &str) -> Result<Self, SourceError> {
        let mut parts = command.split_whitespace();
        let program = parts.next()
            .ok_or_else(|| SourceError::Disconnected("empty detector command".to_string()))?;
        let mut child = Command::new(program)
            .args(parts)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;
        let stdout = child.stdout.take()
            .ok_or_else(|| SourceError::Disconnected("detector has no stdout".to_string()))?;
        info!(pid = child.id(), "started detector: {}", command);

        let mut src = Self::with_label(BufReader::new(stdout), program);
        src.child = Some(child);
        Ok(src)
    }
}

/// Forward raw lines from `reader` until end of stream, a read error or the
/// receiving source being dropped.
fn spawn_line_reader<R: BufRead + Send + 'static>(mut reader: R, label: &str) -> Receiver<io::Result<Vec<u8>>> {
    let (tx, rx) = mpsc::channel();
    let spawned = thread::Builder::new()
        .name(format!("{}-reader", label))
        .spawn(move || loop {
            let mut buf = Vec::new();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    if tx.send(Ok(buf)).is_err() { break; }
                }
                Err(e) => {
                    let _ = tx.send(Err(e));
                    break;
                }
            }
        });
    // Without a reader thread the sender is gone and the first read reports
    // end of stream.
    if let Err(e) = spawned {
        warn!("{}: cannot start reader thread: {}", label, e);
    }
    rx
}

impl LandmarkSource for JsonLinesSource {
    fn next_frame(&mut self) -> Result<Detection, SourceError> {
        loop {
            let bytes = match self.lines.recv_timeout(POLL_INTERVAL) {
                Ok(line) => line?,
                Err(RecvTimeoutError::Timeout) => return Err(SourceError::Timeout),
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(SourceError::Disconnected(format!("{}: end of stream", self.label)));
                }
            };
            let line = String::from_utf8_lossy(&bytes);
            if line.trim() == READY_LINE {
                info!("{}: detector ready", self.label);
                continue;
            }
            return parse_line(&line);
        }
    }

    fn name(&self) -> &str { &self.label }
}

impl Drop for JsonLinesSource {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            debug!(pid = child.id(), "stopping detector");
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ScriptedSource — canned detections for tests
// ════════════════════════════════════════════════════════════════════════════


// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
