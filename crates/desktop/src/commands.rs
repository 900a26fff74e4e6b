//! Tauri commands bridging the webview to the playback controller.

use crate::PlayerState;
use narrator_core::AudioSettings;
use narrator_pdf::{PdfExtractor, PREVIEW_PAGES};
use narrator_speech::PiperSynthesizer;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tauri::State;

/// What the frontend shows after picking a document.
#[derive(Debug, Serialize, Deserialize)]
pub struct PreviewPayload {
    /// Selected file name.
    pub filename: String,
    /// Total pages in the document.
    pub page_count: usize,
    /// Normalized text of the first few pages.
    pub preview: String,
}

/// Snapshot of the controller for initial render.
#[derive(Debug, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub status: String,
    pub progress: u8,
    pub is_playing: bool,
    pub document: Option<String>,
    pub has_cached_text: bool,
    pub settings: AudioSettings,
}

/// Select a PDF document and return its preview.
///
/// Halts any narration of the previous document and always drops its
/// cached text, even when the same file is picked again.
#[tauri::command]
pub async fn select_document(
    state: State<'_, PlayerState>,
    file_path: String,
) -> Result<PreviewPayload, String> {
    let path = PathBuf::from(&file_path);

    // The preview never touches the player; the document handle lives
    // only for these two calls.
    let extractor = PdfExtractor::new();
    let page_count = extractor.page_count(&path).map_err(|e| format!("{}", e))?;
    let preview = extractor
        .extract_preview(&path, PREVIEW_PAGES)
        .map_err(|e| format!("{}", e))?;

    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();

    let mut player = state.lock()?;
    player.select_document(&path);

    Ok(PreviewPayload {
        filename,
        page_count,
        preview,
    })
}

/// Start narration, or pause it if it is running.
#[tauri::command]
pub async fn toggle_playback(state: State<'_, PlayerState>) -> Result<(), String> {
    let mut player = state.lock()?;
    player.toggle().map_err(|e| format!("{}", e))
}

/// Stop narration and reset progress.
#[tauri::command]
pub async fn stop_playback(state: State<'_, PlayerState>) -> Result<(), String> {
    let mut player = state.lock()?;
    player.stop();
    Ok(())
}

/// Replace the speech settings used by subsequent narration.
#[tauri::command]
pub async fn apply_settings(
    state: State<'_, PlayerState>,
    settings: AudioSettings,
) -> Result<(), String> {
    let mut player = state.lock()?;
    player.set_settings(settings).map_err(|e| format!("{}", e))
}

/// Point the exporter at a piper voice model.
#[tauri::command]
pub async fn configure_export(
    state: State<'_, PlayerState>,
    model_path: String,
) -> Result<(), String> {
    let synthesizer = PiperSynthesizer::new(&model_path).map_err(|e| format!("{}", e))?;
    let mut player = state.lock()?;
    player.set_exporter(synthesizer);
    Ok(())
}

/// Render the selected document to a WAV file in the background.
///
/// Progress and completion arrive as `player-event` emissions.
#[tauri::command]
pub async fn export_audio(
    state: State<'_, PlayerState>,
    output_path: String,
) -> Result<(), String> {
    let mut player = state.lock()?;
    player.export_wav(output_path).map_err(|e| format!("{}", e))
}

/// Current controller state, for the frontend's initial render.
#[tauri::command]
pub async fn player_state(state: State<'_, PlayerState>) -> Result<PlayerSnapshot, String> {
    let player = state.lock()?;
    let session = player.session();
    Ok(PlayerSnapshot {
        status: player.status().to_string(),
        progress: player.progress(),
        is_playing: player.is_playing(),
        document: session.path.as_ref().map(|p| p.display().to_string()),
        has_cached_text: session.cached_text.is_some(),
        settings: session.settings,
    })
}
