//! Application entry point — mock-interview terminal client.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Read the session id from argv (created by the external signup step).
//! 4. Create [`tokio`] runtime (multi-thread, 2 workers).
//! 5. Build capture (stdin line feed), playback (console voice), and the
//!    HTTP question service.
//! 6. Spawn the session controller and the playback-update forwarder.
//! 7. Run the stdin command loop until `/end` or EOF.
//!
//! # Commands
//!
//! | Input | Effect |
//! |-------|--------|
//! | plain text | a finalized speech fragment for the current answer |
//! | `/submit` | send the answer to the interviewer |
//! | `/code` … `/done` | edit the code surface |
//! | `/editor` | show / hide the code surface |
//! | `/reset` | clear the captured transcript |
//! | `/end` | end the session |

use std::io::BufRead;
use std::sync::Arc;

use tokio::sync::mpsc;

use mock_interview::{
    capture::{CaptureSource, LineCapture},
    config::AppConfig,
    playback::{ConsoleVoice, PlaybackSink, PlaybackState, PlaybackUpdate},
    service::{ApiQuestionService, QuestionService},
    session::{new_shared_session, SessionController, SessionEvent},
};

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("mock-interview client starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Session id (missing id is handled by the controller as fatal)
    let session_id = std::env::args().nth(1).unwrap_or_default();
    if session_id.is_empty() {
        log::warn!("no session id given; usage: mock-interview <session-id>");
    }

    // 4. Tokio runtime (2 worker threads — service I/O + session loop)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    rt.block_on(run_client(config, session_id))
}

async fn run_client(config: AppConfig, session_id: String) -> anyhow::Result<()> {
    let state = new_shared_session(&config.session.starter_code);

    // 5. Channel setup + subsystems
    let (lines_tx, lines_rx) = mpsc::channel::<String>(32);
    let (synth_tx, synth_rx) = mpsc::channel(16);
    let (updates_tx, mut updates_rx) = mpsc::channel::<PlaybackUpdate>(16);
    let (events_tx, events_rx) = mpsc::channel::<SessionEvent>(32);

    let capture = CaptureSource::new(LineCapture::new(lines_rx));
    let playback = PlaybackSink::new(
        ConsoleVoice::new(synth_tx),
        synth_rx,
        updates_tx,
        Some(config.playback.voice_hint.clone()),
    );
    let service: Arc<dyn QuestionService> =
        Arc::new(ApiQuestionService::from_config(&config.service));

    // 6. Session controller + playback-update forwarder
    let controller = SessionController::new(
        session_id,
        Arc::clone(&state),
        capture,
        playback,
        service,
        events_tx.clone(),
    );
    let mut controller_task = tokio::spawn(controller.run(events_rx));

    {
        let events_tx = events_tx.clone();
        tokio::spawn(async move {
            while let Some(update) = updates_rx.recv().await {
                let event = match update.state {
                    PlaybackState::Ended => Some(SessionEvent::PlaybackFinished),
                    PlaybackState::Error => Some(SessionEvent::PlaybackFailed {
                        message: update
                            .message
                            .unwrap_or_else(|| "speech synthesis failed".into()),
                    }),
                    PlaybackState::Idle | PlaybackState::Speaking => None,
                };
                if let Some(event) = event {
                    if events_tx.send(event).await.is_err() {
                        break;
                    }
                }
            }
        });
    }

    // Blocking stdin reads stay on their own OS thread.
    let (input_tx, mut input_rx) = mpsc::channel::<String>(32);
    std::thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        if input_tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        log::warn!("stdin read failed: {e}");
                        break;
                    }
                }
            }
        })
        .expect("failed to spawn stdin-reader thread");

    println!("Mock interview session ready.");
    println!("Speak by typing. Commands: /submit  /code  /editor  /reset  /end");

    let _ = events_tx.send(SessionEvent::Start).await;

    // 7. Command loop
    //
    // While `/code` entry is open, lines accumulate here until `/done`.
    let mut code_entry: Option<Vec<String>> = None;
    let mut ended_by_user = false;

    loop {
        tokio::select! {
            // Controller exited on its own (session end or fatal error).
            res = &mut controller_task => {
                if let Err(e) = res {
                    log::error!("session task failed: {e}");
                }
                report_fatal(&state);
                return Ok(());
            }

            maybe_line = input_rx.recv() => {
                let Some(line) = maybe_line else {
                    // EOF: treat like /end.
                    let _ = events_tx.send(SessionEvent::End).await;
                    break;
                };

                if code_entry.is_some() {
                    if line.trim() == "/done" {
                        let content = code_entry.take().unwrap_or_default().join("\n");
                        let _ = events_tx.send(SessionEvent::CodeEdited { content }).await;
                        println!("(code saved)");
                    } else if let Some(buffer) = code_entry.as_mut() {
                        buffer.push(line);
                    }
                    continue;
                }

                let trimmed = line.trim();
                if trimmed.is_empty() {
                    // Skip blank lines.
                } else if trimmed == "/submit" {
                    let _ = events_tx.send(SessionEvent::Submit).await;
                } else if trimmed == "/code" {
                    println!("(enter code; finish with /done)");
                    code_entry = Some(Vec::new());
                } else if trimmed == "/editor" {
                    let _ = events_tx.send(SessionEvent::ToggleEditor).await;
                } else if trimmed == "/reset" {
                    let _ = events_tx.send(SessionEvent::ResetTranscript).await;
                    println!("(transcript cleared)");
                } else if trimmed == "/end" {
                    let _ = events_tx.send(SessionEvent::End).await;
                    ended_by_user = true;
                } else {
                    // Everything else is speech.
                    let _ = lines_tx.send(line).await;
                }

                if ended_by_user {
                    break;
                }
            }
        }
    }

    if let Err(e) = controller_task.await {
        log::error!("session task failed: {e}");
    }
    report_fatal(&state);
    println!("Session ended.");
    Ok(())
}

/// Surface a fatal session error (missing session id) to the user.
fn report_fatal(state: &mock_interview::session::SharedSession) {
    if let Some(fatal) = state.lock().unwrap().fatal.clone() {
        println!("{fatal}");
    }
}
