//! Speech synthesis backends for PDF narration.
//!
//! The [`Narrator`] trait is the seam between the playback controller and
//! whatever actually produces audio. Subprocess narration (`espeak-ng`,
//! `say`, `spd-say`), the piper WAV exporter, and the mock are always
//! available; the OS speech API backend requires the `system-tts` feature.

pub mod command;
pub mod mock;
pub mod piper;

#[cfg(feature = "system-tts")]
pub mod system;

pub use command::{CommandNarrator, SpeechProgram};
pub use mock::MockNarrator;
pub use piper::PiperSynthesizer;

#[cfg(feature = "system-tts")]
pub use system::SystemNarrator;

use narrator_core::{AudioSettings, Result};

/// A speech backend that narrates text aloud.
///
/// Implementations use interior mutability: `speak` blocks the calling
/// thread for the whole utterance, and `stop` must be callable from
/// another thread while a `speak` is in flight.
pub trait Narrator: Send + Sync {
    /// Short backend identifier for logs and diagnostics.
    fn name(&self) -> &str;

    /// Apply speech parameters to the backend.
    ///
    /// Idempotent; called before every utterance. Settings changed during
    /// an utterance take effect on the next one.
    fn configure(&self, settings: &AudioSettings) -> Result<()>;

    /// Narrate `text`, blocking until it finishes or [`Narrator::stop`]
    /// interrupts it. Never call this on an interactive thread.
    fn speak(&self, text: &str) -> Result<()>;

    /// Interrupt the current utterance promptly. A no-op when nothing is
    /// speaking.
    fn stop(&self) -> Result<()>;
}
