use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::mpsc;
use std::thread;

use anyhow::{bail, Context};
use engine_logging::{engine_info, engine_warn};
use redact_core::{update, AppState, Msg};
use redact_engine::EngineHandle;

use super::effects::EffectRunner;
use super::ui::commands::{self, Command};
use super::ui::render;
use crate::cli::Cli;

/// Everything the session loop reacts to.
pub enum Inbox {
    Msg(Msg),
    Input(Result<Command, String>),
    /// The session cannot continue.
    Failed(String),
    InputClosed,
}

pub fn run_session(cli: &Cli, path: &Path) -> anyhow::Result<()> {
    let content = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());

    let (engine, events) = EngineHandle::with_settings(cli.client_settings())
        .context("start document service client")?;
    let (inbox_tx, inbox_rx) = mpsc::channel::<Inbox>();

    let runner = EffectRunner::new(engine.clone(), &cli.output_dir, inbox_tx.clone());
    runner.spawn_event_loop(events);
    spawn_input_reader(inbox_tx);

    engine_info!("Uploading {} ({} bytes)", filename, content.len());
    println!("uploading {filename} to {} ...", cli.server_url);
    engine.extract(filename, content);

    let mut state = AppState::with_poll_settings(cli.poll_settings());
    for item in inbox_rx {
        let msg = match item {
            Inbox::Msg(msg) => msg,
            Inbox::Input(Ok(Command::Quit)) | Inbox::InputClosed => break,
            Inbox::Input(Ok(Command::Help)) => {
                println!("{}", commands::HELP);
                continue;
            }
            Inbox::Input(Ok(Command::Types)) => {
                print!("{}", render::pii_types());
                continue;
            }
            Inbox::Input(Ok(command)) => match command.into_msg() {
                Some(msg) => msg,
                None => continue,
            },
            Inbox::Input(Err(problem)) => {
                println!("{problem}");
                continue;
            }
            Inbox::Failed(reason) => bail!(reason),
        };

        let redraw = matches!(msg, Msg::Tick);
        state = dispatch(state, msg, &runner, redraw);
    }

    let (_, effects) = update(state, Msg::DocumentDiscarded);
    runner.enqueue(effects);
    Ok(())
}

fn dispatch(state: AppState, msg: Msg, runner: &EffectRunner, redraw: bool) -> AppState {
    let (mut state, effects) = update(state, msg);
    runner.enqueue(effects);

    if state.consume_view_changed() || redraw {
        let view = state.view();
        match render::detection_progress(&view) {
            Some(progress) => println!("{progress}"),
            None => {
                print!("{}", render::render(&view));
                print!("> ");
            }
        }
        let _ = io::stdout().flush();
    }
    state
}

fn spawn_input_reader(inbox: mpsc::Sender<Inbox>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    engine_warn!("stdin read failed: {}", err);
                    break;
                }
            };
            if inbox.send(Inbox::Input(commands::parse(&line))).is_err() {
                return;
            }
        }
        let _ = inbox.send(Inbox::InputClosed);
    });
}
