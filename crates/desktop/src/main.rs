//! Desktop GUI for PDF narration using Tauri.

#![cfg_attr(
    all(not(debug_assertions), target_os = "windows"),
    windows_subsystem = "windows"
)]

mod commands;

use narrator_player::Player;
use narrator_speech::{CommandNarrator, Narrator, SpeechProgram};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tauri::{Emitter, Manager};

/// Shared playback controller; commands and the event bridge take turns.
pub struct PlayerState(Mutex<Player>);

impl PlayerState {
    /// Lock the controller, surfacing poisoning as a command error.
    fn lock(&self) -> Result<MutexGuard<'_, Player>, String> {
        self.0
            .lock()
            .map_err(|e| format!("Failed to lock player: {}", e))
    }
}

fn main() {
    env_logger::init();

    let narrator = CommandNarrator::detect().unwrap_or_else(|e| {
        log::warn!("no speech program found ({}); defaulting to espeak-ng", e);
        CommandNarrator::with_program(SpeechProgram::EspeakNg)
    });
    log::info!("narrating with {}", narrator.name());
    let player = Player::new(Arc::new(narrator));

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_fs::init())
        .manage(PlayerState(Mutex::new(player)))
        .invoke_handler(tauri::generate_handler![
            commands::select_document,
            commands::toggle_playback,
            commands::stop_playback,
            commands::apply_settings,
            commands::configure_export,
            commands::export_audio,
            commands::player_state,
        ])
        .setup(|app| {
            spawn_event_bridge(app.handle().clone());
            #[cfg(debug_assertions)]
            {
                let window = app.get_webview_window("main").unwrap();
                window.open_devtools();
            }
            Ok(())
        })
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

/// Pump the player on a timer and forward its events to the webview.
///
/// Commands mutate the player; this thread is what turns the resulting
/// worker messages into `player-event` emissions the frontend listens to.
fn spawn_event_bridge(app: tauri::AppHandle) {
    std::thread::spawn(move || loop {
        let events = match app.state::<PlayerState>().0.lock() {
            Ok(mut player) => player.pump(),
            Err(e) => {
                log::error!("player state poisoned, stopping event bridge: {}", e);
                break;
            }
        };
        for event in events {
            if let Err(e) = app.emit("player-event", &event) {
                log::warn!("failed to emit player event: {}", e);
            }
        }
        std::thread::sleep(Duration::from_millis(100));
    });
}
