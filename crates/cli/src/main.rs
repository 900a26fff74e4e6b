//! CLI for narrating PDF documents aloud or to audio files.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use narrator_core::{AudioSettings, VoiceKind, DEFAULT_RATE, MAX_RATE, MIN_RATE};
use narrator_pdf::PdfExtractor;
use narrator_player::{Player, PlayerEvent};
use narrator_speech::{CommandNarrator, Narrator, PiperSynthesizer, SpeechProgram};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Read PDF documents aloud, or render them to WAV audio.
#[derive(Parser, Debug)]
#[command(name = "pdf-narrate")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract text from PDF file(s) without narrating
    Extract {
        /// Input PDF file(s)
        #[arg(required = true)]
        input: Vec<PathBuf>,

        /// Extract only the first N pages
        #[arg(short = 'n', long, value_name = "PAGES")]
        preview: Option<usize>,

        /// Output directory (default: same as input file)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print text to stdout instead of writing to file
        #[arg(short, long)]
        print: bool,
    },

    /// Narrate a PDF aloud
    Play {
        /// Input PDF file
        input: PathBuf,

        /// Voice to narrate with
        #[arg(long, value_enum, default_value_t = VoiceArg::Male)]
        voice: VoiceArg,

        /// Speech rate in words per minute
        #[arg(long, default_value_t = DEFAULT_RATE,
              value_parser = clap::value_parser!(u16).range(MIN_RATE as i64..=MAX_RATE as i64))]
        rate: u16,

        /// Playback volume, 0.0 to 1.0
        #[arg(long, default_value_t = narrator_core::DEFAULT_VOLUME)]
        volume: f32,

        /// Speech program to use instead of auto-detection
        #[arg(long, value_enum)]
        program: Option<ProgramArg>,
    },

    /// List the speech backends available on this machine
    Voices,

    /// Render a PDF to a WAV file with a piper voice model
    Export {
        /// Input PDF file
        input: PathBuf,

        /// Piper voice model (.onnx)
        #[arg(short, long)]
        model: PathBuf,

        /// Output WAV path (default: input name with .wav)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Speech rate in words per minute
        #[arg(long, default_value_t = DEFAULT_RATE,
              value_parser = clap::value_parser!(u16).range(MIN_RATE as i64..=MAX_RATE as i64))]
        rate: u16,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VoiceArg {
    Male,
    Female,
}

impl From<VoiceArg> for VoiceKind {
    fn from(arg: VoiceArg) -> Self {
        match arg {
            VoiceArg::Male => VoiceKind::Male,
            VoiceArg::Female => VoiceKind::Female,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProgramArg {
    EspeakNg,
    Espeak,
    Say,
    SpdSay,
}

impl From<ProgramArg> for SpeechProgram {
    fn from(arg: ProgramArg) -> Self {
        match arg {
            ProgramArg::EspeakNg => SpeechProgram::EspeakNg,
            ProgramArg::Espeak => SpeechProgram::Espeak,
            ProgramArg::Say => SpeechProgram::Say,
            ProgramArg::SpdSay => SpeechProgram::SpdSay,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match args.command {
        Command::Extract {
            input,
            preview,
            output,
            print,
        } => extract(&input, preview, output.as_ref(), print, args.verbose),
        Command::Play {
            input,
            voice,
            rate,
            volume,
            program,
        } => play(&input, voice, rate, volume, program),
        Command::Voices => voices(),
        Command::Export {
            input,
            model,
            output,
            rate,
        } => export(&input, &model, output, rate),
    }
}

fn extract(
    inputs: &[PathBuf],
    preview: Option<usize>,
    output_dir: Option<&PathBuf>,
    print: bool,
    verbose: bool,
) -> Result<()> {
    let extractor = PdfExtractor::new();

    for input_path in inputs {
        if verbose {
            eprintln!("Processing: {}", input_path.display());
        }

        match extract_file(&extractor, input_path, preview) {
            Ok(text) => {
                if print {
                    println!("{}", text);
                } else {
                    let output_path = get_output_path(input_path, output_dir)?;
                    write_output(&output_path, &text)?;
                    if verbose {
                        eprintln!("Written to: {}", output_path.display());
                    }
                }
            }
            Err(e) => {
                eprintln!("Error processing {}: {}", input_path.display(), e);
            }
        }
    }

    Ok(())
}

/// Extract a single PDF, whole or as a bounded preview.
fn extract_file(
    extractor: &PdfExtractor,
    input_path: &Path,
    preview: Option<usize>,
) -> Result<String> {
    let pages = extractor.page_count(input_path)?;
    log::debug!("{}: {} pages", input_path.display(), pages);

    let text = match preview {
        Some(max_pages) => extractor.extract_preview(input_path, max_pages)?,
        None => extractor.extract_all(input_path, |percent| {
            log::debug!("extracting: {}%", percent);
        })?,
    };

    Ok(text)
}

fn play(
    input: &Path,
    voice: VoiceArg,
    rate: u16,
    volume: f32,
    program: Option<ProgramArg>,
) -> Result<()> {
    let narrator = match program {
        Some(program) => CommandNarrator::with_program(program.into()),
        None => CommandNarrator::detect()?,
    };
    log::info!("narrating with {}", narrator.name());

    let settings = AudioSettings {
        voice: voice.into(),
        rate,
        volume,
    };

    let mut player = Player::new(Arc::new(narrator));
    player.set_settings(settings)?;
    player.select_document(input);
    player.toggle()?;

    let mut failure = None;
    while player.is_active() {
        for event in player.pump() {
            match event {
                PlayerEvent::StatusChanged { status } => eprintln!("{}", status),
                PlayerEvent::Progress { percent } => log::info!("extracting: {}%", percent),
                PlayerEvent::Error { message } => failure = Some(message),
            }
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    match failure {
        Some(message) => Err(anyhow::anyhow!(message)),
        None => Ok(()),
    }
}

fn voices() -> Result<()> {
    println!("Speech programs:");
    for program in SpeechProgram::ALL {
        let availability = if program.is_available() {
            "available"
        } else {
            "not found"
        };
        println!("  {:<10} {}", program.command_name(), availability);
        for kind in [VoiceKind::Male, VoiceKind::Female] {
            if let Some(label) = program.voice_label(kind) {
                println!("    {:?} voice: {}", kind, label);
            }
        }
    }

    #[cfg(feature = "system-tts")]
    {
        use narrator_speech::SystemNarrator;
        match SystemNarrator::new() {
            Ok(narrator) => {
                println!("System voices:");
                for name in narrator.voice_names()? {
                    println!("  {}", name);
                }
            }
            Err(e) => eprintln!("System speech unavailable: {}", e),
        }
    }

    Ok(())
}

fn export(input: &Path, model: &Path, output: Option<PathBuf>, rate: u16) -> Result<()> {
    let extractor = PdfExtractor::new();
    let text = extractor
        .extract_all(input, |percent| log::info!("extracting: {}%", percent))
        .with_context(|| format!("Failed to extract {}", input.display()))?;
    if text.is_empty() {
        anyhow::bail!("{} has no extractable text", input.display());
    }

    let output_path = match output {
        Some(path) => path,
        None => input.with_extension("wav"),
    };

    let settings = AudioSettings {
        rate,
        ..Default::default()
    };
    let synthesizer = PiperSynthesizer::new(model)?;
    synthesizer
        .synthesize_to_wav(&text, &settings, &output_path)
        .with_context(|| format!("Failed to render {}", output_path.display()))?;

    eprintln!("Written to: {}", output_path.display());
    Ok(())
}

/// Determine the output path for an extracted text file.
fn get_output_path(input_path: &Path, output_dir: Option<&PathBuf>) -> Result<PathBuf> {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");

    let output_filename = format!("{}.txt", stem);

    let output_path = match output_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            dir.join(output_filename)
        }
        None => {
            if let Some(parent) = input_path.parent() {
                parent.join(output_filename)
            } else {
                PathBuf::from(output_filename)
            }
        }
    };

    Ok(output_path)
}

/// Write extracted text to a file.
fn write_output(path: &Path, content: &str) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write to {}", path.display()))?;
    file.write_all(b"\n")
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}
