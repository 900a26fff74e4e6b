//! Playback controller for PDF narration.
//!
//! [`Player`] ties the pipeline together: it owns the narration session
//! (selected document, cached text, speech settings), drives extraction
//! and speech on a background worker, and reports what happened as
//! [`PlayerEvent`]s. Shells stay thin: the CLI polls [`Player::pump`] in
//! a loop, the desktop app pumps from a bridge thread and forwards the
//! events to its frontend.

pub mod events;
pub mod player;

mod worker;

pub use events::PlayerEvent;
pub use player::Player;
