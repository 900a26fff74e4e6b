//! Narration through system speech commands.
//!
//! Drives one of the common command-line synthesizers as a subprocess:
//! `espeak-ng` / `espeak` on Linux, `say` on macOS, `spd-say` where
//! speech-dispatcher is installed. The child process plays audio itself;
//! speaking blocks on its exit and stopping kills it.

use crate::Narrator;
use narrator_core::{AudioSettings, Error, Result, VoiceKind};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// How often a blocking speak checks whether the child has exited.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A speech command this narrator knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechProgram {
    /// `espeak-ng`, the maintained espeak fork.
    EspeakNg,
    /// Classic `espeak`.
    Espeak,
    /// macOS `say`.
    Say,
    /// speech-dispatcher's `spd-say`.
    SpdSay,
}

impl SpeechProgram {
    /// All programs in detection preference order.
    pub const ALL: [SpeechProgram; 4] = [
        SpeechProgram::EspeakNg,
        SpeechProgram::Espeak,
        SpeechProgram::Say,
        SpeechProgram::SpdSay,
    ];

    /// The executable name on PATH.
    pub fn command_name(self) -> &'static str {
        match self {
            Self::EspeakNg => "espeak-ng",
            Self::Espeak => "espeak",
            Self::Say => "say",
            Self::SpdSay => "spd-say",
        }
    }

    /// Whether the executable responds on this machine.
    pub fn is_available(self) -> bool {
        let mut cmd = Command::new(self.command_name());
        match self {
            Self::EspeakNg | Self::Espeak | Self::SpdSay => {
                cmd.arg("--version");
            }
            // `say` has no version flag; listing voices is the probe.
            Self::Say => {
                cmd.args(["-v", "?"]);
            }
        }
        cmd.stdout(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .is_ok()
    }

    /// The voice name this program uses for a voice kind, when it has
    /// a matching flag at all (`say` follows the system voice).
    pub fn voice_label(self, voice: VoiceKind) -> Option<&'static str> {
        match (self, voice) {
            (Self::EspeakNg | Self::Espeak, VoiceKind::Male) => Some("en+m3"),
            (Self::EspeakNg | Self::Espeak, VoiceKind::Female) => Some("en+f3"),
            (Self::SpdSay, VoiceKind::Male) => Some("male1"),
            (Self::SpdSay, VoiceKind::Female) => Some("female1"),
            (Self::Say, _) => None,
        }
    }

    /// Arguments that apply `settings`, without the text itself.
    ///
    /// Programs that lack a flag for some parameter silently skip it:
    /// `say` has no volume or voice-kind control, so only rate is mapped.
    fn speak_args(self, settings: &AudioSettings) -> Vec<String> {
        match self {
            Self::EspeakNg | Self::Espeak => {
                // Amplitude scale is 0-200 with 100 as normal.
                let amplitude = ((settings.volume * 200.0).round() as u32).min(200);
                let variant = self
                    .voice_label(settings.voice)
                    .unwrap_or("en");
                vec![
                    "-s".into(),
                    settings.rate.to_string(),
                    "-a".into(),
                    amplitude.to_string(),
                    "-v".into(),
                    variant.into(),
                ]
            }
            Self::Say => {
                vec!["-r".into(), settings.rate.to_string()]
            }
            Self::SpdSay => {
                // spd-say rate and volume are both on a -100..100 scale;
                // 150 wpm maps to 0 and the 100..200 range spans it fully.
                let rate = (i32::from(settings.rate) - 150) * 2;
                let volume = ((settings.volume * 200.0).round() as i32 - 100).clamp(-100, 100);
                let voice_type = self
                    .voice_label(settings.voice)
                    .unwrap_or("male1");
                vec![
                    "-w".into(),
                    "-r".into(),
                    rate.to_string(),
                    "-i".into(),
                    volume.to_string(),
                    "-t".into(),
                    voice_type.into(),
                ]
            }
        }
    }
}

/// Narrator that speaks through a system speech command.
pub struct CommandNarrator {
    program: SpeechProgram,
    settings: Mutex<AudioSettings>,
    child: Mutex<Option<Child>>,
    stopping: AtomicBool,
}

impl CommandNarrator {
    /// Use the first speech program that responds on this machine.
    pub fn detect() -> Result<Self> {
        let program = SpeechProgram::ALL
            .into_iter()
            .find(|p| p.is_available())
            .ok_or_else(|| {
                Error::configuration(
                    "no speech command found; install espeak-ng, say, or spd-say",
                )
            })?;
        log::debug!("using speech command {}", program.command_name());
        Ok(Self::with_program(program))
    }

    /// Use a specific program without probing for it. If the executable
    /// is missing, speaking fails with a synthesis error.
    pub fn with_program(program: SpeechProgram) -> Self {
        Self {
            program,
            settings: Mutex::new(AudioSettings::default()),
            child: Mutex::new(None),
            stopping: AtomicBool::new(false),
        }
    }

    /// The program this narrator drives.
    pub fn program(&self) -> SpeechProgram {
        self.program
    }
}

impl Narrator for CommandNarrator {
    fn name(&self) -> &str {
        self.program.command_name()
    }

    fn configure(&self, settings: &AudioSettings) -> Result<()> {
        settings.validate()?;
        *self.settings.lock().unwrap() = *settings;
        Ok(())
    }

    fn speak(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }
        self.stopping.store(false, Ordering::SeqCst);

        let settings = *self.settings.lock().unwrap();
        let name = self.program.command_name();
        let mut cmd = Command::new(name);
        cmd.args(self.program.speak_args(&settings))
            .arg(text)
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let child = cmd
            .spawn()
            .map_err(|e| Error::synthesis(format!("failed to start {}: {}", name, e)))?;
        *self.child.lock().unwrap() = Some(child);

        loop {
            std::thread::sleep(POLL_INTERVAL);
            let mut slot = self.child.lock().unwrap();
            match slot.as_mut() {
                // stop() already killed and reaped the child.
                None => return Ok(()),
                Some(child) => match child.try_wait() {
                    Ok(Some(status)) => {
                        *slot = None;
                        if status.success() || self.stopping.load(Ordering::SeqCst) {
                            return Ok(());
                        }
                        return Err(Error::synthesis(format!(
                            "{} exited with {}",
                            name, status
                        )));
                    }
                    Ok(None) => {}
                    Err(e) => {
                        *slot = None;
                        return Err(Error::synthesis(format!(
                            "failed to wait for {}: {}",
                            name, e
                        )));
                    }
                },
            }
        }
    }

    fn stop(&self) -> Result<()> {
        self.stopping.store(true, Ordering::SeqCst);
        let mut slot = self.child.lock().unwrap();
        if let Some(child) = slot.as_mut() {
            let _ = child.kill();
            let _ = child.wait();
            *slot = None;
        }
        Ok(())
    }
}
