//! The playback controller.

use crate::events::PlayerEvent;
use crate::worker::{self, WorkerContext, WorkerMessage};
use narrator_core::{AudioSettings, Error, PlaybackStatus, Result, SessionState};
use narrator_speech::{Narrator, PiperSynthesizer};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Lifecycle phase of the controller.
///
/// Richer than [`PlaybackStatus`]: the status is what shells display,
/// the phase is what drives decisions. `Paused` keeps the session warm
/// while no operation runs on its behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Extracting,
    Speaking,
    Paused,
    Exporting,
}

impl Phase {
    /// Whether a background operation currently owns the controller.
    fn is_active(self) -> bool {
        matches!(self, Phase::Extracting | Phase::Speaking | Phase::Exporting)
    }
}

/// Narration session driver: one selected document, one narrator, and
/// at most one background operation at a time.
///
/// All methods run on the caller's thread and return quickly; blocking
/// work happens on a worker thread that reports back over a channel.
/// Hosts call [`Player::pump`] regularly (each UI tick, or in a small
/// polling loop) to apply worker messages and collect the resulting
/// [`PlayerEvent`]s.
///
/// `Player` is not `Sync`; shells that share it across threads wrap it
/// in a mutex, which also serializes `pump` with the command methods.
pub struct Player {
    session: SessionState,
    narrator: Arc<dyn Narrator>,
    exporter: Option<Arc<PiperSynthesizer>>,
    phase: Phase,
    status: PlaybackStatus,
    progress: u8,
    pending: Vec<PlayerEvent>,
    tx: Sender<WorkerMessage>,
    rx: Receiver<WorkerMessage>,
    worker: Option<JoinHandle<()>>,
    cancel: Arc<AtomicBool>,
    /// Id of the most recently started operation. Messages stamped with
    /// any other id are leftovers and are dropped (except [`WorkerMessage::Extracted`],
    /// which is guarded by document path instead).
    op: u64,
}

impl Player {
    /// Controller with nothing selected, narrating through `narrator`.
    pub fn new(narrator: Arc<dyn Narrator>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            session: SessionState::new(),
            narrator,
            exporter: None,
            phase: Phase::Idle,
            status: PlaybackStatus::Ready,
            progress: 0,
            pending: Vec::new(),
            tx,
            rx,
            worker: None,
            cancel: Arc::new(AtomicBool::new(false)),
            op: 0,
        }
    }

    /// Attach the synthesizer [`Player::export_wav`] renders with.
    pub fn set_exporter(&mut self, synthesizer: PiperSynthesizer) {
        self.exporter = Some(Arc::new(synthesizer));
    }

    /// Current user-visible status.
    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    /// Extraction progress of the current operation, 0..=100.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// Whether narration is currently audible.
    pub fn is_playing(&self) -> bool {
        self.session.is_playing
    }

    /// Whether a background operation is running or winding down.
    pub fn is_active(&self) -> bool {
        self.worker.is_some() || self.phase.is_active()
    }

    /// The session this controller drives.
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Select the document to narrate, halting anything in flight.
    ///
    /// Always drops the previous document's cached text, even when the
    /// same path is selected again; the file may have changed on disk.
    pub fn select_document(&mut self, path: impl Into<PathBuf>) {
        self.halt();
        self.session.select_path(path);
        self.progress = 0;
        self.set_status(PlaybackStatus::Ready);
    }

    /// Start narration, or pause it if it is already running.
    ///
    /// Starting extracts the document first unless its text is cached.
    /// Pausing interrupts speech but keeps the cache and progress; a
    /// later toggle narrates again from the beginning. Rejected while
    /// an export runs; stop the export first.
    pub fn toggle(&mut self) -> Result<()> {
        match self.phase {
            Phase::Extracting | Phase::Speaking => {
                self.pause();
                Ok(())
            }
            Phase::Exporting => Err(Error::configuration(
                "an export is in progress; stop it before starting playback",
            )),
            Phase::Idle | Phase::Paused => self.start_playback(),
        }
    }

    /// Halt everything and reset progress.
    ///
    /// Safe to call at any time, including when nothing is running.
    pub fn stop(&mut self) {
        self.halt();
        self.progress = 0;
        self.set_status(PlaybackStatus::Stopped);
    }

    /// Replace the speech parameters used by subsequent operations.
    ///
    /// An operation already running keeps the snapshot it started with.
    pub fn set_settings(&mut self, settings: AudioSettings) -> Result<()> {
        settings.validate()?;
        self.session.settings = settings;
        Ok(())
    }

    /// Render the selected document to a WAV file in the background.
    ///
    /// Reuses cached text when available, otherwise extracts first,
    /// reporting progress like playback does. Rejected while another
    /// operation is running.
    pub fn export_wav(&mut self, out: impl Into<PathBuf>) -> Result<()> {
        let exporter = self
            .exporter
            .clone()
            .ok_or_else(|| Error::configuration("no export voice model configured"))?;
        if self.phase.is_active() {
            return Err(Error::configuration(
                "another operation is in progress; stop it before exporting",
            ));
        }
        let path = self
            .session
            .path
            .clone()
            .ok_or_else(|| Error::configuration("no document selected"))?;
        self.ensure_worker_free()?;

        let ctx = self.new_operation();
        let cached = self.session.cached_text.clone();
        if cached.is_none() {
            self.progress = 0;
        }
        let out = out.into();
        self.phase = Phase::Exporting;
        self.set_status(PlaybackStatus::Exporting);
        log::info!("exporting {} -> {}", path.display(), out.display());
        self.worker = Some(std::thread::spawn(move || {
            worker::run_export(ctx, exporter, path, cached, out);
        }));
        Ok(())
    }

    /// Apply queued worker messages and return the events they caused.
    ///
    /// Returns an empty vector when nothing happened since the last call.
    pub fn pump(&mut self) -> Vec<PlayerEvent> {
        while let Ok(message) = self.rx.try_recv() {
            self.apply(message);
        }
        std::mem::take(&mut self.pending)
    }

    fn start_playback(&mut self) -> Result<()> {
        let path = self
            .session
            .path
            .clone()
            .ok_or_else(|| Error::configuration("no document selected"))?;
        self.ensure_worker_free()?;

        let ctx = self.new_operation();
        let narrator = Arc::clone(&self.narrator);
        match self.session.cached_text.clone() {
            Some(text) => {
                self.phase = Phase::Speaking;
                self.set_status(PlaybackStatus::Playing);
                log::debug!("narrating cached text for {}", path.display());
                self.worker = Some(std::thread::spawn(move || {
                    worker::run_speak(ctx, narrator, text);
                }));
            }
            None => {
                self.phase = Phase::Extracting;
                self.progress = 0;
                self.set_status(PlaybackStatus::Loading);
                log::debug!("extracting {}", path.display());
                self.worker = Some(std::thread::spawn(move || {
                    worker::run_extract_and_speak(ctx, narrator, path);
                }));
            }
        }
        Ok(())
    }

    fn pause(&mut self) {
        // Speech is interrupted; an extraction under way keeps running in
        // the background and still lands in the cache when it finishes.
        if let Err(e) = self.narrator.stop() {
            log::warn!("narrator stop failed: {}", e);
        }
        self.cancel.store(true, Ordering::SeqCst);
        self.phase = Phase::Paused;
        self.session.is_playing = false;
        self.set_status(PlaybackStatus::Paused);
    }

    /// Interrupt whatever runs and leave the controller idle.
    fn halt(&mut self) {
        if let Err(e) = self.narrator.stop() {
            log::warn!("narrator stop failed: {}", e);
        }
        if let Some(ref exporter) = self.exporter {
            exporter.kill();
        }
        self.cancel.store(true, Ordering::SeqCst);
        self.phase = Phase::Idle;
        self.session.is_playing = false;
    }

    /// Stamp out the context for a fresh operation.
    fn new_operation(&mut self) -> WorkerContext {
        self.op += 1;
        self.cancel = Arc::new(AtomicBool::new(false));
        WorkerContext {
            op: self.op,
            tx: self.tx.clone(),
            cancel: Arc::clone(&self.cancel),
            settings: self.session.settings,
        }
    }

    /// Reclaim the worker slot, or refuse if the previous worker has not
    /// exited yet.
    ///
    /// The window is narrow: an interrupted worker only has to post its
    /// final message and return. Refusing beats blocking an interactive
    /// thread on a join.
    fn ensure_worker_free(&mut self) -> Result<()> {
        if let Some(handle) = self.worker.take() {
            if handle.is_finished() {
                let _ = handle.join();
            } else {
                self.worker = Some(handle);
                return Err(Error::configuration(
                    "the previous operation is still winding down; try again",
                ));
            }
        }
        Ok(())
    }

    fn set_status(&mut self, status: PlaybackStatus) {
        if self.status != status {
            self.status = status;
            self.pending.push(PlayerEvent::StatusChanged { status });
        }
    }

    fn apply(&mut self, message: WorkerMessage) {
        match message {
            WorkerMessage::Progress { op, percent } => {
                if op == self.op && matches!(self.phase, Phase::Extracting | Phase::Exporting) {
                    self.progress = percent;
                    self.pending.push(PlayerEvent::Progress { percent });
                }
            }
            WorkerMessage::Extracted { path, text, .. } => {
                // Guarded by path rather than operation id: text from an
                // extraction that outlived a pause is still valid as long
                // as its document stays selected.
                if self.session.is_current(&path) {
                    self.session.cache_text(text);
                } else {
                    log::debug!("discarding extraction for {}", path.display());
                }
            }
            WorkerMessage::SpeechStarted { op } => {
                if op != self.op {
                    return;
                }
                match self.phase {
                    Phase::Extracting | Phase::Speaking => {
                        self.phase = Phase::Speaking;
                        self.session.is_playing = true;
                        self.set_status(PlaybackStatus::Playing);
                    }
                    // A pause or stop raced ahead of the worker; make sure
                    // the utterance it just started is interrupted too.
                    _ => {
                        if let Err(e) = self.narrator.stop() {
                            log::warn!("narrator stop failed: {}", e);
                        }
                    }
                }
            }
            WorkerMessage::Finished { op, result } => {
                if op != self.op {
                    return;
                }
                if let Some(handle) = self.worker.take() {
                    // The worker posts this message and returns; the join
                    // is immediate.
                    let _ = handle.join();
                }
                if self.phase.is_active() {
                    self.phase = Phase::Idle;
                    self.session.is_playing = false;
                    match result {
                        Ok(()) => self.set_status(PlaybackStatus::Ready),
                        Err(e) => {
                            log::error!("operation failed: {}", e);
                            self.pending.push(PlayerEvent::Error {
                                message: e.to_string(),
                            });
                            self.set_status(PlaybackStatus::Error);
                        }
                    }
                } else if let Err(e) = result {
                    // Interrupted operations are allowed to fail quietly.
                    log::debug!("halted operation finished with: {}", e);
                }
            }
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.halt();
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}
