mod audio;
mod audio_api;
mod config;
mod controls;
mod loader;
mod middle;
mod pipeline;
mod sequencer;
mod shared;
mod tui;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use crossterm::terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use audio_api::AudioCommand;
use config::Config;
use controls::Controls;
use middle::Middle;
use pipeline::persistence;
use sequencer::{Scheduler, StepGrid, TempoControl, Transport};
use shared::InputEvent;

fn main() {
    if let Err(e) = run() {
        log::error!("fatal: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    use simplelog::{Config as LogConfig, LevelFilter, WriteLogger};

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };

    let log_path = config::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("drumgrid.log");
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    // the terminal belongs to the TUI, so logs only ever go to a file
    let Ok(log_file) = File::create(&log_path) else {
        return;
    };
    if WriteLogger::init(log_level, LogConfig::default(), log_file).is_ok() {
        log::info!("drumgrid starting (log level: {:?}, log file: {})", log_level, log_path.display());
    }
}

fn run() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");
    init_logging(verbose);

    let project_dir: PathBuf = args
        .iter()
        .find(|a| !a.starts_with('-'))
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
    let config = Config::load();

    let audio = audio::start_audio()?;

    // one track per sample in the kit
    let kit_dir = config.kit_dir(&project_dir);
    let kit = loader::sample_loader::load_kit(&kit_dir, audio.sample_rate(), shared::MAX_TRACKS)
        .unwrap_or_else(|e| {
            log::warn!("no kit loaded: {:#}", e);
            Vec::new()
        });
    let mut grid = StepGrid::new(config.sequence_length(), kit.len());
    let mut track_names = Vec::with_capacity(kit.len());
    for (track, sample) in kit.into_iter().enumerate() {
        grid.bind_track(track, sample.id);
        track_names.push(sample.name);
        audio.send(AudioCommand::RegisterSample { id: sample.id, buffer: sample.buffer });
    }

    let tempo = Arc::new(TempoControl::new(config.initial_tempo(), config.tempo_range()));
    let scheduler = Scheduler::new(
        Arc::new(audio.clock()),
        Arc::new(audio.player()),
        Arc::clone(&tempo),
        config.scheduler(),
    );
    let mut middle = Middle::new(
        grid.shared(),
        track_names,
        tempo,
        Transport::new(scheduler),
        Controls::new(audio.sample_rate()),
    );

    let restore_cmds = match persistence::load_pattern(&project_dir) {
        Some(pattern) => middle.restore(&pattern),
        None => middle.control_commands(),
    };
    for cmd in restore_cmds {
        audio.send(cmd);
    }

    terminal::enable_raw_mode()?;
    let _guard = RawModeGuard; // auto drops when out of scope
    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let frame_interval = std::time::Duration::from_millis(16); // ~60fps

    loop {
        middle.tick();
        middle.set_engine_drops(audio.dropped_triggers());
        let ds = middle.display_state();
        term.draw(|frame| {
            tui::view::render(frame, frame.area(), &ds);
        })?;

        for event in tui::input::poll_input(frame_interval)? {
            match event {
                InputEvent::Quit => {
                    middle.stop();
                    if let Err(e) = persistence::save_pattern(&project_dir, &middle.pattern_snapshot()) {
                        log::error!("could not save pattern on quit: {:#}", e);
                    }
                    log::info!("drumgrid exiting");
                    return Ok(());
                }
                InputEvent::Save => {
                    match persistence::save_pattern(&project_dir, &middle.pattern_snapshot()) {
                        Ok(()) => middle.set_status("saved"),
                        Err(e) => middle.set_status(format!("save failed: {e}")),
                    }
                }
                other => {
                    for cmd in middle.handle_input(other) {
                        audio.send(cmd);
                    }
                }
            }
        }
    }
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
