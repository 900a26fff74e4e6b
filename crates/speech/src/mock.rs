//! Recording narrator for tests and headless smoke runs.
//!
//! Part of the public API rather than test-only code so that downstream
//! crates (the playback controller, the desktop shell) can drive their
//! own tests against it without audio hardware.

use crate::Narrator;
use narrator_core::{AudioSettings, Error, Result};
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct MockState {
    configured: Vec<AudioSettings>,
    spoken: Vec<String>,
    stop_requested: bool,
    stop_calls: usize,
}

/// Narrator that records every call instead of producing audio.
///
/// `speak` returns immediately unless a per-utterance delay is set, in
/// which case it blocks for the delay or until [`Narrator::stop`] wakes
/// it, whichever comes first.
pub struct MockNarrator {
    state: Mutex<MockState>,
    stopped: Condvar,
    delay: Option<Duration>,
    speak_failure: Option<String>,
}

impl MockNarrator {
    /// Narrator whose utterances complete instantly.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            stopped: Condvar::new(),
            delay: None,
            speak_failure: None,
        }
    }

    /// Block each utterance for `delay`, as a real backend would.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make every `speak` call fail with a synthesis error.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.speak_failure = Some(message.into());
        self
    }

    /// Every text passed to `speak`, in call order.
    pub fn spoken(&self) -> Vec<String> {
        self.state.lock().unwrap().spoken.clone()
    }

    /// Every settings value passed to `configure`, in call order.
    pub fn configured(&self) -> Vec<AudioSettings> {
        self.state.lock().unwrap().configured.clone()
    }

    /// How many times `stop` has been called.
    pub fn stop_calls(&self) -> usize {
        self.state.lock().unwrap().stop_calls
    }
}

impl Default for MockNarrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Narrator for MockNarrator {
    fn name(&self) -> &str {
        "mock"
    }

    fn configure(&self, settings: &AudioSettings) -> Result<()> {
        settings.validate()?;
        self.state.lock().unwrap().configured.push(*settings);
        Ok(())
    }

    fn speak(&self, text: &str) -> Result<()> {
        if let Some(ref message) = self.speak_failure {
            return Err(Error::synthesis(message.clone()));
        }

        let mut state = self.state.lock().unwrap();
        state.stop_requested = false;
        state.spoken.push(text.to_string());

        if let Some(delay) = self.delay {
            let deadline = Instant::now() + delay;
            while !state.stop_requested {
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                let (next, _) = self
                    .stopped
                    .wait_timeout(state, deadline - now)
                    .unwrap();
                state = next;
            }
        }
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.stop_requested = true;
        state.stop_calls += 1;
        self.stopped.notify_all();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    #[test]
    fn test_records_configure_and_speak() {
        let narrator = MockNarrator::new();
        let settings = AudioSettings::default();

        narrator.configure(&settings).unwrap();
        narrator.speak("first").unwrap();
        narrator.speak("second").unwrap();

        assert_eq!(narrator.configured(), vec![settings]);
        assert_eq!(narrator.spoken(), vec!["first", "second"]);
    }

    #[test]
    fn test_stop_when_idle_is_a_no_op() {
        let narrator = MockNarrator::new();
        assert!(narrator.stop().is_ok());
        assert!(narrator.stop().is_ok());
        assert_eq!(narrator.stop_calls(), 2);
    }

    #[test]
    fn test_stop_interrupts_a_delayed_utterance() {
        let narrator = Arc::new(MockNarrator::new().with_delay(Duration::from_secs(10)));

        let speaker = Arc::clone(&narrator);
        let handle = std::thread::spawn(move || {
            let started = Instant::now();
            speaker.speak("long utterance").unwrap();
            started.elapsed()
        });

        // Give the speaking thread a moment to enter its wait.
        std::thread::sleep(Duration::from_millis(50));
        narrator.stop().unwrap();

        let elapsed = handle.join().unwrap();
        assert!(elapsed < Duration::from_secs(5), "speak did not return promptly");
        assert_eq!(narrator.spoken(), vec!["long utterance"]);
    }

    #[test]
    fn test_failing_narrator_reports_synthesis_error() {
        let narrator = MockNarrator::new().failing("backend unavailable");
        let err = narrator.speak("text").unwrap_err();
        assert!(matches!(err, Error::Synthesis(_)));
        assert!(narrator.spoken().is_empty());
    }

    #[test]
    fn test_configure_still_validates() {
        let narrator = MockNarrator::new();
        let settings = AudioSettings {
            rate: 999,
            ..Default::default()
        };
        assert!(narrator.configure(&settings).is_err());
        assert!(narrator.configured().is_empty());
    }
}
