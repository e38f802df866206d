//! CallRec: meeting recorder with microphone consent and live level metering.

mod app;
mod app_command;
mod config;
mod console_handler;
mod error;
mod meeting_store;
mod recording_state;
mod status_reporter;
mod terminal_prompt;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    console_handler::ConsoleHandler,
    error::{AppError, Result as AppResult},
    recording_state::RecordingState,
    status_reporter::StatusReporter,
};

use crate::{config::Config, meeting_store::MeetingStore, terminal_prompt::TerminalPrompt};

use callrec_core::{ConsentFileStore, CpalBackend, RecorderOptions, RecordingManager};

use std::{sync::Arc, time::Duration};

use tokio::sync::{Mutex, mpsc, watch};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_LOG_FILTER: &str = "callrec=info,callrec_core=info";

/// Install stderr logging plus JSON log files in the data directory.
///
/// The returned guard flushes the file writer and must live until exit.
fn init_tracing() -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    match config::project_dirs() {
        Ok(dirs) => {
            let appender = tracing_appender::rolling::daily(dirs.data_dir().join("logs"), "callrec.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(fmt::layer().json().with_writer(writer))
                .init();

            Some(guard)
        }
        Err(e) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .init();

            error!(error = ?e, "No data directory, logging to stderr only");
            None
        }
    }
}

/// Application entry point.
fn main() {
    let _log_guard = init_tracing();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {:?}", e);
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {:?}", e);
            std::process::exit(1);
        }
    };

    runtime.block_on(run(config));

    // The console reader may still be blocked on stdin.
    runtime.shutdown_timeout(Duration::from_secs(1));
}

async fn run(config: Config) {
    let meetings = match MeetingStore::load(&config.meetings.store_file) {
        Ok(m) => m,
        Err(e) => {
            error!("Failed to load meetings: {:?}", e);
            std::process::exit(1);
        }
    };

    let (prompt, prompt_answers) = TerminalPrompt::new();
    let store = Arc::new(ConsentFileStore::new(
        config.permission.consent_file.clone(),
        Arc::new(prompt),
    ));
    let consent_file = store.path().to_path_buf();
    let backend = Arc::new(CpalBackend::new(
        config.audio.ffmpeg_path.clone(),
        config.audio.selected_device.clone(),
    ));

    let recorder = RecordingManager::spawn(
        store,
        backend,
        RecorderOptions {
            sampling_interval: config.recording.sampling_interval(),
            ..RecorderOptions::default()
        },
    );

    let state = Arc::new(Mutex::new(RecordingState::Idle));
    let (command_tx, command_rx) = mpsc::channel(32);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let console = ConsoleHandler::new(Arc::clone(&state), command_tx.clone(), prompt_answers);
    let reporter = StatusReporter::new(recorder.subscribe(), consent_file);

    // Ctrl-C also shuts the recorder down directly so a start waiting on the
    // consent prompt is cancelled instead of blocking the exit.
    let signal_recorder = recorder.clone();
    let signal_tx = command_tx;
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received");
                let _ = signal_tx.send(AppCommand::Shutdown).await;
                signal_recorder.shutdown().await;
            }
            Err(e) => error!(error = ?e, "Failed to listen for Ctrl-C"),
        }
    });

    let app = App {
        recorder,
        meetings,
        config,
        state,
        command_rx,
        shutdown_tx,
    };

    let console_shutdown_rx = shutdown_rx.clone();
    tokio::join!(
        async {
            if let Err(e) = console.run(console_shutdown_rx).await {
                error!(error = ?e, "Console handler error");
            }
        },
        reporter.run(shutdown_rx),
        async {
            if let Err(e) = app.run().await {
                error!(error = ?e, "App error");
            }
        }
    );
}
