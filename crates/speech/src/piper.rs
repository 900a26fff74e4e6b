//! WAV export through a Piper subprocess.
//!
//! Piper (`piper-tts`) reads text on stdin and writes an uncompressed
//! WAV file, which is exactly the shape the export path needs: no audio
//! device, no encoder, one child process per export.

use narrator_core::{AudioSettings, Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// How often a running export checks whether piper has exited.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Synthesizer that renders text to a WAV file with Piper.
///
/// The voice is fixed by the model file; speech rate maps onto piper's
/// length scale. Piper has no volume control, so volume is skipped.
#[derive(Debug)]
pub struct PiperSynthesizer {
    program: PathBuf,
    model: PathBuf,
    child: Mutex<Option<Child>>,
    cancelled: AtomicBool,
}

impl PiperSynthesizer {
    /// Synthesizer using the `piper` executable on PATH.
    ///
    /// Fails with a configuration error when the model file does not
    /// exist; a missing executable only shows up when synthesizing.
    pub fn new(model: impl Into<PathBuf>) -> Result<Self> {
        Self::with_program("piper", model)
    }

    /// Synthesizer using a specific piper executable.
    pub fn with_program(program: impl Into<PathBuf>, model: impl Into<PathBuf>) -> Result<Self> {
        let model = model.into();
        if !model.is_file() {
            return Err(Error::configuration(format!(
                "piper model not found: {}",
                model.display()
            )));
        }
        Ok(Self {
            program: program.into(),
            model,
            child: Mutex::new(None),
            cancelled: AtomicBool::new(false),
        })
    }

    /// The model file this synthesizer renders with.
    pub fn model(&self) -> &Path {
        &self.model
    }

    /// Render `text` to an uncompressed WAV file at `out`.
    ///
    /// Blocks until piper exits or [`PiperSynthesizer::kill`] interrupts
    /// it. A killed or failed run removes any partial output file.
    pub fn synthesize_to_wav(
        &self,
        text: &str,
        settings: &AudioSettings,
        out: &Path,
    ) -> Result<()> {
        settings.validate()?;
        if text.trim().is_empty() {
            return Err(Error::synthesis("no text to synthesize"));
        }
        self.cancelled.store(false, Ordering::SeqCst);

        log::debug!(
            "piper: model {}, {} chars -> {}",
            self.model.display(),
            text.len(),
            out.display()
        );

        let mut child = Command::new(&self.program)
            .arg("--model")
            .arg(&self.model)
            .arg("--output_file")
            .arg(out)
            .arg("--length_scale")
            .arg(length_scale(settings.rate).to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                Error::synthesis(format!("failed to start {}: {}", self.program.display(), e))
            })?;

        // Piper starts synthesizing as soon as stdin closes.
        let mut stdin = child.stdin.take().ok_or_else(|| {
            Error::synthesis("failed to open piper stdin")
        })?;
        *self.child.lock().unwrap() = Some(child);

        let write_result = stdin.write_all(text.as_bytes());
        drop(stdin);
        if let Err(e) = write_result {
            // A concurrent kill() closes the pipe; that is not a failure.
            if !self.cancelled.load(Ordering::SeqCst) {
                self.kill();
                let _ = std::fs::remove_file(out);
                return Err(Error::synthesis(format!(
                    "failed to send text to piper: {}",
                    e
                )));
            }
        }

        loop {
            std::thread::sleep(POLL_INTERVAL);
            let mut slot = self.child.lock().unwrap();
            match slot.as_mut() {
                None => {
                    // kill() reaped the child; partial output is not kept.
                    let _ = std::fs::remove_file(out);
                    return Ok(());
                }
                Some(child) => match child.try_wait() {
                    Ok(Some(status)) => {
                        *slot = None;
                        if self.cancelled.load(Ordering::SeqCst) {
                            let _ = std::fs::remove_file(out);
                            return Ok(());
                        }
                        if status.success() {
                            return Ok(());
                        }
                        let _ = std::fs::remove_file(out);
                        return Err(Error::synthesis(format!(
                            "piper exited with {}",
                            status
                        )));
                    }
                    Ok(None) => {}
                    Err(e) => {
                        *slot = None;
                        let _ = std::fs::remove_file(out);
                        return Err(Error::synthesis(format!(
                            "failed to wait for piper: {}",
                            e
                        )));
                    }
                },
            }
        }
    }

    /// Interrupt an in-flight synthesis. A no-op when none is running.
    pub fn kill(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        let mut slot = self.child.lock().unwrap();
        if let Some(child) = slot.as_mut() {
            let _ = child.kill();
            let _ = child.wait();
            *slot = None;
        }
    }
}

/// Map words-per-minute onto piper's inverse length scale.
///
/// 150 wpm is piper's native pace (scale 1.0); slower rates stretch
/// the utterance, faster rates compress it.
fn length_scale(rate: u16) -> f32 {
    (150.0 / f32::from(rate)).clamp(0.5, 2.0)
}
