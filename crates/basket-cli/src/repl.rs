//! Interactive prompt.
//!
//! Questions and job triggers run as background tasks so the prompt stays
//! responsive; their results come back over a channel. Job and health
//! changes arrive on the operations broadcast.

use crate::render;
use anyhow::Result;
use basket_core::view::render_transcript;
use basket_core::{OperationsEvent, Session, SubmitOutcome, SubmitRejection, TriggerOutcome};
use basket_types::{HealthSnapshot, HealthState, JobKind};
use colored::Colorize;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc};
use tracing::debug;

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Ask(String),
    New,
    History,
    Trigger(JobKind),
    Health,
    Status,
    Help,
    Quit,
    Unknown(String),
}

/// Parse a line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Option<ReplCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Some(ReplCommand::Ask(line.to_string()));
    };
    let command = match command.trim().to_lowercase().as_str() {
        "new" | "reset" => ReplCommand::New,
        "history" => ReplCommand::History,
        "scrape" => ReplCommand::Trigger(JobKind::Scrape),
        "import" => ReplCommand::Trigger(JobKind::Import),
        "health" => ReplCommand::Health,
        "status" => ReplCommand::Status,
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" | "q" => ReplCommand::Quit,
        _ => ReplCommand::Unknown(line.to_string()),
    };
    Some(command)
}

/// Decides which health snapshots reach the screen.
///
/// Polled snapshots print only when the state changes. While a `/health`
/// check is pending its own result is printed instead, so one check never
/// prints twice.
#[derive(Debug, Default)]
struct HealthDisplay {
    last: HealthState,
    manual_pending: usize,
}

impl HealthDisplay {
    fn requested(&mut self) {
        self.manual_pending += 1;
    }

    /// A `HealthChanged` event. Returns whether to print it.
    fn on_event(&mut self, snapshot: &HealthSnapshot) -> bool {
        if self.manual_pending > 0 || snapshot.state == self.last {
            return false;
        }
        self.last = snapshot.state;
        true
    }

    /// The result of a `/health` check, which is always printed.
    fn on_manual(&mut self, snapshot: &HealthSnapshot) {
        self.manual_pending = self.manual_pending.saturating_sub(1);
        self.last = snapshot.state;
    }
}

/// Work finished in the background.
enum Finished {
    Query(SubmitOutcome),
    Trigger(JobKind, TriggerOutcome),
    Health(HealthSnapshot),
}

fn prompt() {
    print!("{} ", "basket>".cyan().bold());
    let _ = std::io::stdout().flush();
}

/// Run the prompt until `/quit` or end of input.
pub async fn run(session: &mut Session) -> Result<()> {
    session.begin();

    let query = session.query().clone();
    let operations = session.operations().clone();
    let vocabulary = session.vocabulary().clone();

    let mut events = operations.subscribe();
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Finished>();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut health_display = HealthDisplay::default();

    println!("{}", render::help());
    println!("{}", render::suggestions());
    prompt();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let Some(command) = parse_line(&line) else {
                    prompt();
                    continue;
                };
                debug!(target: "basket::repl", "Command: {:?}", command);
                match command {
                    ReplCommand::Ask(question) => {
                        if query.is_busy() {
                            println!("{}", "Still working on the previous question.".yellow());
                        } else {
                            println!("{}", render::THINKING.dimmed());
                            let query = query.clone();
                            let done = done_tx.clone();
                            tokio::spawn(async move {
                                let outcome = query.submit(&question).await;
                                let _ = done.send(Finished::Query(outcome));
                            });
                        }
                    }
                    ReplCommand::New => {
                        query.reset().await;
                        println!("{}", "Started a new conversation.".green());
                        println!("{}", render::suggestions());
                    }
                    ReplCommand::History => {
                        let transcript = query.transcript().await;
                        if transcript.is_empty() {
                            println!("{}", render::suggestions());
                        }
                        for entry in render_transcript(&transcript, &vocabulary) {
                            println!("{}", render::entry(&entry));
                        }
                    }
                    ReplCommand::Trigger(kind) => {
                        let operations = operations.clone();
                        let done = done_tx.clone();
                        tokio::spawn(async move {
                            let outcome = operations.trigger(kind).await;
                            let _ = done.send(Finished::Trigger(kind, outcome));
                        });
                    }
                    ReplCommand::Health => {
                        health_display.requested();
                        let operations = operations.clone();
                        let done = done_tx.clone();
                        tokio::spawn(async move {
                            let snapshot = operations.poll_health().await;
                            let _ = done.send(Finished::Health(snapshot));
                        });
                    }
                    ReplCommand::Status => println!("{}", render::status(&operations.snapshot())),
                    ReplCommand::Help => println!("{}", render::help()),
                    ReplCommand::Quit => break,
                    ReplCommand::Unknown(command) => {
                        println!("Unknown command {}. Type /help for the list.", command.red());
                    }
                }
                prompt();
            }
            Some(finished) = done_rx.recv() => {
                match finished {
                    Finished::Query(outcome) => print_query_outcome(&outcome, &query, &vocabulary).await,
                    Finished::Trigger(kind, TriggerOutcome::Rejected) => {
                        println!("{}", format!("{} is already running.", kind).yellow());
                    }
                    // Status lines arrive as events.
                    Finished::Trigger(..) => {}
                    Finished::Health(snapshot) => {
                        health_display.on_manual(&snapshot);
                        println!("{}", render::health(&snapshot));
                    }
                }
                prompt();
            }
            event = events.recv() => {
                match event {
                    Ok(OperationsEvent::JobChanged { kind, status }) => {
                        println!("{}", render::job(kind, &status));
                        prompt();
                    }
                    Ok(OperationsEvent::HealthChanged(snapshot)) => {
                        if health_display.on_event(&snapshot) {
                            println!("{}", render::health(&snapshot));
                            prompt();
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(target: "basket::repl", "Skipped {} operations events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    println!();
    session.end();
    Ok(())
}

async fn print_query_outcome(
    outcome: &SubmitOutcome,
    query: &basket_core::QuerySession,
    vocabulary: &basket_core::ColumnVocabulary,
) {
    match outcome {
        SubmitOutcome::Answered { .. } | SubmitOutcome::Failed { .. } => {
            let transcript = query.transcript().await;
            let Some(last) = transcript.last() else {
                return;
            };
            for entry in render_transcript(std::slice::from_ref(last), vocabulary) {
                println!("{}", render::entry(&entry));
            }
            if let Some(metadata) = last.as_answer().and_then(|a| a.metadata.as_ref()) {
                println!("{}", render::metadata(metadata));
            }
        }
        SubmitOutcome::Rejected(SubmitRejection::Busy) => {
            println!("{}", "Still working on the previous question.".yellow());
        }
        SubmitOutcome::Rejected(SubmitRejection::Empty) => {}
        SubmitOutcome::Discarded => {
            println!("{}", "(reply to a previous conversation discarded)".dimmed());
        }
    }
}
