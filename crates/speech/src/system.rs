//! Narration through the OS speech API via the `tts` crate.
//!
//! Off by default: the Linux backend links speech-dispatcher at build
//! time. Enable the `system-tts` feature to build this module.

use crate::Narrator;
use narrator_core::{AudioSettings, Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tts::Tts;

/// How often a blocking speak polls the backend's speaking state.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Grace period before polling; some backends report not-speaking
/// until the utterance has actually been queued.
const START_GRACE: Duration = Duration::from_millis(100);

/// Narrator over the platform speech synthesis API.
///
/// Voices are selected by backend index (male 0, female 1); when the
/// index exceeds what the backend offers the previously configured
/// voice stays in place. Parameters the backend does not support are
/// skipped. Backends that cannot report speaking state make `speak`
/// return as soon as the utterance is queued.
pub struct SystemNarrator {
    tts: Mutex<Tts>,
    stopping: AtomicBool,
}

impl SystemNarrator {
    /// Open the platform's default speech backend.
    pub fn new() -> Result<Self> {
        let tts = Tts::default().map_err(|e| {
            Error::synthesis(format!("failed to initialize system speech: {}", e))
        })?;
        Ok(Self {
            tts: Mutex::new(tts),
            stopping: AtomicBool::new(false),
        })
    }

    /// Names of the voices the backend offers, in index order.
    pub fn voice_names(&self) -> Result<Vec<String>> {
        let tts = self.tts.lock().unwrap();
        let voices = tts
            .voices()
            .map_err(|e| Error::synthesis(format!("failed to list voices: {}", e)))?;
        Ok(voices
            .iter()
            .map(|v| format!("{} ({})", v.name(), v.language()))
            .collect())
    }
}

impl Narrator for SystemNarrator {
    fn name(&self) -> &str {
        "system"
    }

    fn configure(&self, settings: &AudioSettings) -> Result<()> {
        settings.validate()?;
        let mut tts = self.tts.lock().unwrap();
        let features = tts.supported_features();

        if features.voice {
            match tts.voices() {
                Ok(voices) => {
                    let index = settings.voice.voice_index();
                    match voices.get(index).cloned() {
                        Some(voice) => {
                            tts.set_voice(&voice).map_err(|e| {
                                Error::synthesis(format!("failed to set voice: {}", e))
                            })?;
                        }
                        None => log::warn!(
                            "voice index {} exceeds the {} available; keeping previous voice",
                            index,
                            voices.len()
                        ),
                    }
                }
                Err(e) => log::warn!("could not list backend voices: {}", e),
            }
        }

        if features.rate {
            let rate = map_rate(
                tts.min_rate(),
                tts.normal_rate(),
                tts.max_rate(),
                settings.rate,
            );
            tts.set_rate(rate)
                .map_err(|e| Error::synthesis(format!("failed to set rate: {}", e)))?;
        }

        if features.volume {
            let volume = map_volume(tts.min_volume(), tts.max_volume(), settings.volume);
            tts.set_volume(volume)
                .map_err(|e| Error::synthesis(format!("failed to set volume: {}", e)))?;
        }

        Ok(())
    }

    fn speak(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }
        self.stopping.store(false, Ordering::SeqCst);

        let can_poll = {
            let mut tts = self.tts.lock().unwrap();
            tts.speak(text, true)
                .map_err(|e| Error::synthesis(format!("failed to speak: {}", e)))?;
            tts.supported_features().is_speaking
        };
        if !can_poll {
            log::warn!("backend cannot report speaking state; returning immediately");
            return Ok(());
        }

        std::thread::sleep(START_GRACE);
        loop {
            if self.stopping.load(Ordering::SeqCst) {
                return Ok(());
            }
            let speaking = self
                .tts
                .lock()
                .unwrap()
                .is_speaking()
                .map_err(|e| Error::synthesis(format!("failed to query backend: {}", e)))?;
            if !speaking {
                return Ok(());
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    fn stop(&self) -> Result<()> {
        self.stopping.store(true, Ordering::SeqCst);
        let mut tts = self.tts.lock().unwrap();
        if tts.supported_features().stop {
            tts.stop()
                .map_err(|e| Error::synthesis(format!("failed to stop: {}", e)))?;
        }
        Ok(())
    }
}

/// Map words-per-minute onto the backend's rate range, with 150 wpm
/// landing on the backend's normal rate.
fn map_rate(min: f32, normal: f32, max: f32, wpm: u16) -> f32 {
    let wpm = f32::from(wpm.clamp(100, 200));
    if wpm <= 150.0 {
        min + (normal - min) * ((wpm - 100.0) / 50.0)
    } else {
        normal + (max - normal) * ((wpm - 150.0) / 50.0)
    }
}

/// Map linear volume onto the backend's volume range.
fn map_volume(min: f32, max: f32, volume: f32) -> f32 {
    min + (max - min) * volume.clamp(0.0, 1.0)
}
