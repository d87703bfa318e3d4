//! Capture session: the worker thread that runs the frame loop.
//!
//! The worker owns the landmark source, the mode dispatcher and the output
//! surfaces.  It opens the source and the surfaces itself, so neither has to
//! be `Send`.  The consumer talks to it through two channels:
//!
//! ```text
//!   Session::stop ── stop_tx ──▶ worker ── SessionEvent ──▶ Session::drain / wait
//! ```
//!
//! Dropping the [`Session`] closes the stop channel, which the worker treats
//! as a stop request.  A [`StopHandle`] carries the same request from other
//! threads, such as a Ctrl-C handler.  The worker checks for a stop between
//! frames and whenever the source reports [`SourceError::Timeout`].  On the
//! way out it releases held buttons, drops the source, then reports
//! [`SessionEvent::Ended`].

use std::io;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use mode_engine::{ConfigError, EngineConfig, FrameOutcome, ModeDispatcher, SurfaceError};

use crate::backend::Surfaces;
use crate::source::{LandmarkSource, SourceError};

/// Pause after a transient read failure before trying again.
pub const TRANSIENT_BACKOFF: Duration = Duration::from_millis(20);

// ════════════════════════════════════════════════════════════════════════════
// Events
// ════════════════════════════════════════════════════════════════════════════

/// Snapshot sent to the consumer after every frame.
#[derive(Clone, Debug)]
pub struct FrameReport {
    /// Frame number within this session, starting at 1.
    pub seq:     u64,
    /// Hands the source reported, complete or not.
    pub hands:   usize,
    pub outcome: FrameOutcome,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid engine configuration")]
    Config(#[from] ConfigError),
    #[error("output surface failed at session start")]
    Surface(#[from] SurfaceError),
    #[error("landmark source lost")]
    SourceLost(#[source] SourceError),
    #[error("no screen size: none configured and the input backend reported none")]
    NoScreen,
    #[error("session worker exited without reporting")]
    WorkerDied,
}

#[derive(Debug)]
pub enum SessionEvent {
    Frame(FrameReport),
    /// Last event of a session.
    Ended(Result<(), SessionError>),
}

// ════════════════════════════════════════════════════════════════════════════
// Session handle
// ════════════════════════════════════════════════════════════════════════════

pub struct Session {
    stop_tx:  Sender<()>,
    event_rx: Receiver<SessionEvent>,
    handle:   Option<JoinHandle<()>>,
}

impl Session {
    /// Spawn the worker.
    ///
    /// `open_source` and `open_surfaces` run on the worker thread.  The
    /// volume range is read once at startup and stays fixed for the session.
    pub fn start<S, F>(cfg: EngineConfig, open_source: S, open_surfaces: F) -> io::Result<Self>
    where
        S: FnOnce() -> Result<Box<dyn LandmarkSource>, SourceError> + Send + 'static,
        F: FnOnce() -> Surfaces + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let (event_tx, event_rx) = mpsc::channel::<SessionEvent>();

        let handle = thread::Builder::new()
            .name("gesture-session".to_string())
            .spawn(move || {
                let result = session_thread(cfg, open_source, open_surfaces, &stop_rx, &event_tx);
                match &result {
                    Ok(())  => info!("session ended"),
                    Err(e)  => warn!("session ended: {}", error_chain(e)),
                }
                let _ = event_tx.send(SessionEvent::Ended(result));
            })?;

        Ok(Session { stop_tx, event_rx, handle: Some(handle) })
    }

    /// Ask the worker to finish after the current frame.
    pub fn stop(&self) { let _ = self.stop_tx.send(()); }

    /// A stop request that can be sent from another thread.
    pub fn stop_handle(&self) -> StopHandle { StopHandle(self.stop_tx.clone()) }

    /// Drain pending events (non-blocking).
    pub fn drain(&self) -> Vec<SessionEvent> {
        let mut out = Vec::new();
        while let Ok(ev) = self.event_rx.try_recv() { out.push(ev); }
        out
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<SessionEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Block until the session ends, discarding frame reports.
    pub fn wait(mut self) -> Result<(), SessionError> {
        let result = loop {
            match self.event_rx.recv() {
                Ok(SessionEvent::Ended(r)) => break r,
                Ok(SessionEvent::Frame(_)) => continue,
                // The worker panicked before sending `Ended`.
                Err(_) => break Err(SessionError::WorkerDied),
            }
        };
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
        result
    }
}

/// Cloneable stop request for a running [`Session`].  Stopping a session
/// that already ended does nothing.
#[derive(Clone, Debug)]
pub struct StopHandle(Sender<()>);

impl StopHandle {
    pub fn stop(&self) { let _ = self.0.send(()); }
}

// ════════════════════════════════════════════════════════════════════════════
// session_thread — the frame loop
// ════════════════════════════════════════════════════════════════════════════

fn stop_requested(stop_rx: &Receiver<()>) -> bool {
    !matches!(stop_rx.try_recv(), Err(TryRecvError::Empty))
}

fn session_thread<S, F>(
    cfg:           EngineConfig,
    open_source:   S,
    open_surfaces: F,
    stop_rx:       &Receiver<()>,
    event_tx:      &Sender<SessionEvent>,
) -> Result<(), SessionError>
where
    S: FnOnce() -> Result<Box<dyn LandmarkSource>, SourceError>,
    F: FnOnce() -> Surfaces,
{
    cfg.validate()?;
    let mut surfaces = open_surfaces();
    let screen = cfg.screen.or(surfaces.screen).ok_or(SessionError::NoScreen)?;
    let range = surfaces.audio.volume_range()?;
    let mut dispatcher = ModeDispatcher::new(&cfg, screen, range)?;

    let mut source = open_source().map_err(SessionError::SourceLost)?;
    info!(
        source = source.name(),
        screen = %format_args!("{}x{}", screen.width, screen.height),
        volume = %format_args!("{}..{}", range.min, range.max),
        "session started"
    );

    let mut seq = 0u64;
    let result = loop {
        if stop_requested(stop_rx) {
            break Ok(());
        }

        let detection = match source.next_frame() {
            Ok(d) => Some(d),
            Err(SourceError::Timeout) => continue,
            Err(e) if e.is_transient() => {
                debug!("{}", e);
                thread::sleep(TRANSIENT_BACKOFF);
                None
            }
            Err(e) => {
                // A source that closes because we are shutting down is not a loss.
                if stop_requested(stop_rx) { break Ok(()); }
                break Err(SessionError::SourceLost(e));
            }
        };

        let hands = detection.as_ref().map_or(0, |d| d.hands.len());
        let frame = detection.and_then(|d| d.primary_frame());
        let outcome = dispatcher.process(frame, &mut *surfaces.input, &mut *surfaces.audio);
        seq += 1;
        // A consumer that went away does not stop the session.
        let _ = event_tx.send(SessionEvent::Frame(FrameReport { seq, hands, outcome }));
    };

    let failed = dispatcher.shutdown(&mut *surfaces.input);
    if failed > 0 {
        warn!(failed, "could not release every held button");
    }
    drop(source);
    result
}

/// `err: cause: cause` on one line.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut msg = err.to_string();
    let mut cur = err.source();
    while let Some(cause) = cur {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        cur = cause.source();
    }
    msg
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor, Read};

    use crate::source::testing::{ScriptedSource, Stalled};
    use crate::source::{Detection, JsonLinesSource};
    use hand_pose::pose::DEFAULT_SPREAD;
    use hand_pose::{synthesize, FingerState};
    use mode_engine::surface::testing::{Command, RecordingAudio, RecordingInput};
    use mode_engine::{Mode, MouseButton, ScreenSize, Span};

    const WAIT: Duration = Duration::from_secs(5);

    fn left_click() -> Detection {
        let frame = synthesize(FingerState([false, true, true, true, true]), (360.0, 280.0), DEFAULT_SPREAD);
        Detection::single(&frame)
    }

    fn detector_line(d: &Detection) -> String {
        let hands: Vec<String> = d.hands.iter().map(|h| {
            let pts: Vec<String> = h.landmarks.iter()
                .map(|l| format!(r#"{{"id":{},"x":{},"y":{}}}"#, l.id, l.x, l.y))
                .collect();
            format!(r#"{{"landmarks":[{}]}}"#, pts.join(","))
        }).collect();
        format!("{{\"hands\":[{}]}}\n", hands.join(","))
    }

    fn wait_for_left_latch(session: &Session) {
        loop {
            match session.recv_timeout(WAIT) {
                Some(SessionEvent::Frame(r)) if r.outcome.cursor.left_latch => return,
                Some(SessionEvent::Frame(_)) => continue,
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    fn config() -> EngineConfig {
        EngineConfig {
            screen: Some(ScreenSize::new(1280, 720)),
            landmark_window: 1,
            ..EngineConfig::default()
        }
    }

    fn recording(input: &RecordingInput) -> impl FnOnce() -> Surfaces + Send + 'static {
        let input = input.clone();
        move || Surfaces {
            input:  Box::new(input),
            audio:  Box::new(RecordingAudio::new(Span::new(0.0, 100.0))),
            screen: None,
        }
    }

    fn scripted(
        src: ScriptedSource,
    ) -> impl FnOnce() -> Result<Box<dyn LandmarkSource>, SourceError> + Send + 'static {
        move || Ok(Box::new(src) as Box<dyn LandmarkSource>)
    }

    fn collect(session: &Session) -> (Vec<FrameReport>, Result<(), SessionError>) {
        let mut frames = Vec::new();
        loop {
            match session.recv_timeout(WAIT) {
                Some(SessionEvent::Frame(r)) => frames.push(r),
                Some(SessionEvent::Ended(r)) => return (frames, r),
                None => panic!("session did not end"),
            }
        }
    }

    #[test]
    fn source_loss_releases_latches_and_ends_with_error() {
        let input = RecordingInput::new();
        let script = ScriptedSource::new((0..6).map(|_| Ok(left_click())).collect());
        let session = Session::start(config(), scripted(script), recording(&input)).unwrap();

        let (frames, result) = collect(&session);
        assert_eq!(frames.len(), 6);
        assert_eq!(frames[5].outcome.mode, Mode::Cursor);
        assert!(frames[5].outcome.cursor.left_latch);
        assert!(matches!(result, Err(SessionError::SourceLost(SourceError::Disconnected(_)))));

        let cmds = input.commands();
        assert_eq!(input.count(&Command::Down(MouseButton::Left)), 1);
        assert_eq!(cmds.last(), Some(&Command::Up(MouseButton::Left)));
    }

    #[test]
    fn stop_releases_latches_and_ends_cleanly() {
        let input = RecordingInput::new();
        let session = Session::start(
            config(),
            scripted(ScriptedSource::repeating(left_click())),
            recording(&input),
        ).unwrap();

        wait_for_left_latch(&session);
        session.stop();
        assert!(session.wait().is_ok());
        assert_eq!(input.count(&Command::Up(MouseButton::Left)), 1);
        assert_eq!(input.commands().last(), Some(&Command::Up(MouseButton::Left)));
    }

    #[test]
    fn dropped_handle_counts_as_stop() {
        let input = RecordingInput::new();
        let log = input.log();
        let session = Session::start(
            config(),
            scripted(ScriptedSource::repeating(left_click())),
            recording(&input),
        ).unwrap();
        let latched = (0..1000).any(|_| matches!(
            session.recv_timeout(WAIT),
            Some(SessionEvent::Frame(ref r)) if r.outcome.cursor.left_latch
        ));
        assert!(latched);
        drop(session);

        let released = (0..500).any(|_| {
            thread::sleep(Duration::from_millis(10));
            log.lock().map(|l| l.last() == Some(&Command::Up(MouseButton::Left))).unwrap_or(false)
        });
        assert!(released);
    }

    #[test]
    fn stop_reaches_a_worker_waiting_on_a_quiet_detector() {
        let input = RecordingInput::new();
        let lines: String = (0..6).map(|_| detector_line(&left_click())).collect();
        let reader = BufReader::new(Cursor::new(lines.into_bytes()).chain(Stalled));
        let open = move || Ok::<_, SourceError>(Box::new(JsonLinesSource::from_reader(reader)) as Box<dyn LandmarkSource>);
        let session = Session::start(config(), open, recording(&input)).unwrap();

        wait_for_left_latch(&session);
        session.stop();
        let (_, result) = collect(&session);
        assert!(result.is_ok());
        assert_eq!(input.commands().last(), Some(&Command::Up(MouseButton::Left)));
    }

    #[test]
    fn stop_handle_works_from_another_thread() {
        let input = RecordingInput::new();
        let session = Session::start(
            config(),
            scripted(ScriptedSource::repeating(left_click())),
            recording(&input),
        ).unwrap();

        wait_for_left_latch(&session);
        let handle = session.stop_handle();
        thread::spawn(move || handle.stop()).join().unwrap();
        assert!(session.wait().is_ok());
        assert_eq!(input.commands().last(), Some(&Command::Up(MouseButton::Left)));
    }

    #[test]
    fn worker_that_dies_without_reporting_is_an_error() {
        let open = || -> Surfaces { panic!("surface backend crashed") };
        let session = Session::start(config(), scripted(ScriptedSource::new(vec![])), open).unwrap();
        assert!(matches!(session.wait(), Err(SessionError::WorkerDied)));
    }

    #[test]
    fn transient_errors_count_as_handless_frames() {
        let input = RecordingInput::new();
        let script = ScriptedSource::new(vec![
            Err(SourceError::Transient("glitch".into())),
            Err(SourceError::Transient("glitch".into())),
            Ok(left_click()),
        ]);
        let session = Session::start(config(), scripted(script), recording(&input)).unwrap();
        let (frames, _) = collect(&session);
        let idle: Vec<u32> = frames.iter().map(|r| r.outcome.idle_frames).collect();
        assert_eq!(idle, vec![1, 2, 0]);
        assert_eq!(frames.iter().map(|r| r.seq).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(frames[2].hands, 1);
    }

    #[test]
    fn invalid_config_ends_before_any_frame() {
        let input = RecordingInput::new();
        let cfg = EngineConfig { quorum: 9, ..config() };
        let session = Session::start(cfg, scripted(ScriptedSource::new(vec![])), recording(&input)).unwrap();
        let (frames, result) = collect(&session);
        assert!(frames.is_empty());
        assert!(matches!(result, Err(SessionError::Config(ConfigError::Quorum { .. }))));
    }

    #[test]
    fn unavailable_audio_ends_the_session() {
        let open = || {
            let mut audio = RecordingAudio::new(Span::new(0.0, 1.0));
            audio.reject = true;
            Surfaces { input: Box::new(RecordingInput::new()), audio: Box::new(audio), screen: None }
        };
        let session = Session::start(config(), scripted(ScriptedSource::new(vec![])), open).unwrap();
        let (_, result) = collect(&session);
        assert!(matches!(result, Err(SessionError::Surface(SurfaceError::Unavailable))));
    }

    #[test]
    fn missing_screen_size_is_reported() {
        let input = RecordingInput::new();
        let cfg = EngineConfig { screen: None, ..config() };
        let session = Session::start(cfg, scripted(ScriptedSource::new(vec![])), recording(&input)).unwrap();
        let (_, result) = collect(&session);
        assert!(matches!(result, Err(SessionError::NoScreen)));
    }

    #[test]
    fn error_chain_joins_causes() {
        let err = SessionError::SourceLost(SourceError::Disconnected("eof".into()));
        assert_eq!(error_chain(&err), "landmark source lost: source disconnected: eof");
    }
}
