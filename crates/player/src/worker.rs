//! Background operation bodies.
//!
//! Extraction, narration, and export all block, so the controller runs
//! them on a worker thread and listens on a channel. Workers never touch
//! [`narrator_core::SessionState`]; everything they learn travels back as
//! a [`WorkerMessage`] and is applied on the foreground.

use narrator_core::{AudioSettings, Error, Result};
use narrator_pdf::PdfExtractor;
use narrator_speech::{Narrator, PiperSynthesizer};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;

/// One message from a background worker to the controller.
///
/// Each message carries the id of the operation that produced it, so the
/// controller can discard leftovers from a superseded operation.
#[derive(Debug)]
pub(crate) enum WorkerMessage {
    /// Whole-document extraction progress, 0..=100.
    Progress { op: u64, percent: u8 },
    /// A whole-document extraction completed. Cached by the controller
    /// if `path` is still the selected document.
    Extracted {
        op: u64,
        path: PathBuf,
        text: String,
    },
    /// The narrator accepted the utterance and speech is under way.
    SpeechStarted { op: u64 },
    /// The operation is over; the worker thread exits right after this.
    Finished { op: u64, result: Result<()> },
}

/// Everything a worker needs besides its own inputs.
pub(crate) struct WorkerContext {
    /// Operation id stamped on every outgoing message.
    pub op: u64,
    pub tx: Sender<WorkerMessage>,
    /// Set by the controller when the user pauses or stops.
    pub cancel: Arc<AtomicBool>,
    /// Settings snapshot taken when the operation started.
    pub settings: AudioSettings,
}

impl WorkerContext {
    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    fn send(&self, message: WorkerMessage) {
        // A send only fails once the controller is gone, and then nobody
        // is left to care about the message.
        let _ = self.tx.send(message);
    }

    fn progress(&self, percent: u8) {
        self.send(WorkerMessage::Progress {
            op: self.op,
            percent,
        });
    }

    fn finish(&self, result: Result<()>) {
        self.send(WorkerMessage::Finished {
            op: self.op,
            result,
        });
    }
}

/// Extract the whole document, then narrate it.
pub(crate) fn run_extract_and_speak(
    ctx: WorkerContext,
    narrator: Arc<dyn Narrator>,
    path: PathBuf,
) {
    let result = extract_and_speak(&ctx, narrator.as_ref(), &path);
    ctx.finish(result);
}

fn extract_and_speak(ctx: &WorkerContext, narrator: &dyn Narrator, path: &Path) -> Result<()> {
    let text = extract(ctx, path)?;
    if ctx.cancelled() {
        // Paused during extraction. The text is already on its way to the
        // cache, so the next start skips straight to speech.
        log::debug!("extraction of {} finished after pause", path.display());
        return Ok(());
    }
    if text.is_empty() {
        log::warn!("{} has no extractable text", path.display());
        return Ok(());
    }
    speak(ctx, narrator, &text)
}

/// Narrate text that is already cached.
pub(crate) fn run_speak(ctx: WorkerContext, narrator: Arc<dyn Narrator>, text: String) {
    let result = speak(&ctx, narrator.as_ref(), &text);
    ctx.finish(result);
}

/// Render the document to a WAV file, extracting first unless cached.
pub(crate) fn run_export(
    ctx: WorkerContext,
    synthesizer: Arc<PiperSynthesizer>,
    path: PathBuf,
    cached: Option<String>,
    out: PathBuf,
) {
    let result = export(&ctx, &synthesizer, &path, cached, &out);
    ctx.finish(result);
}

fn extract(ctx: &WorkerContext, path: &Path) -> Result<String> {
    let extractor = PdfExtractor::new();
    let text = extractor.extract_all(path, |percent| ctx.progress(percent))?;
    ctx.send(WorkerMessage::Extracted {
        op: ctx.op,
        path: path.to_path_buf(),
        text: text.clone(),
    });
    Ok(text)
}

fn speak(ctx: &WorkerContext, narrator: &dyn Narrator, text: &str) -> Result<()> {
    narrator.configure(&ctx.settings)?;
    ctx.send(WorkerMessage::SpeechStarted { op: ctx.op });
    narrator.speak(text)
}

fn export(
    ctx: &WorkerContext,
    synthesizer: &PiperSynthesizer,
    path: &Path,
    cached: Option<String>,
    out: &Path,
) -> Result<()> {
    let text = match cached {
        Some(text) => text,
        None => extract(ctx, path)?,
    };
    if ctx.cancelled() {
        return Ok(());
    }
    if text.is_empty() {
        return Err(Error::document(format!(
            "{} has no extractable text to export",
            path.display()
        )));
    }
    synthesizer.synthesize_to_wav(&text, &ctx.settings, out)
}
