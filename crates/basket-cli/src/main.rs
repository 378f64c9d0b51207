//! Basket - ask natural-language questions about supermarket prices.

use anyhow::{Result, bail};
use basket_cli::{config, logging, render, repl};
use basket_core::view::render_transcript;
use basket_core::{Session, SubmitOutcome, SubmitRejection, TriggerOutcome};
use basket_types::{HealthState, JobKind};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use config::{API_URL_ENV, Config};
use logging::LogArgs;

/// Basket - supermarket price explorer.
#[derive(Parser, Debug)]
#[command(name = "basket")]
#[command(about = "Ask questions about supermarket prices and manage the data pipeline")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Price service base URL (overrides config and BASKET_API_URL)
    #[arg(long, value_name = "URL", global = true)]
    api_url: Option<String>,

    /// Ask the service for dataset metadata with every answer
    #[arg(long, global = true)]
    debug_queries: bool,

    #[command(flatten)]
    log: LogArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask a single question and print the answer
    Ask {
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Start the price scraper
    Scrape,
    /// Start the price importer
    Import,
    /// Check whether the service is up
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log);

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.apply_env(std::env::var(API_URL_ENV).ok());
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    if cli.debug_queries {
        config.debug_queries = true;
    }
    tracing::info!(target: "basket::startup", "Loaded configuration (service: {})", config.api_url);

    let mut session = Session::connect(config.session_config())?;

    match cli.command {
        None => repl::run(&mut session).await,
        Some(Command::Ask { question }) => ask(&session, &question.join(" ")).await,
        Some(Command::Scrape) => trigger(&session, JobKind::Scrape).await,
        Some(Command::Import) => trigger(&session, JobKind::Import).await,
        Some(Command::Health) => health(&session).await,
    }
}

async fn ask(session: &Session, question: &str) -> Result<()> {
    let outcome = session.query().submit(question).await;
    if outcome == SubmitOutcome::Rejected(SubmitRejection::Empty) {
        bail!("Question must not be empty");
    }

    let transcript = session.query().transcript().await;
    if let Some(last) = transcript.last() {
        for entry in render_transcript(std::slice::from_ref(last), session.vocabulary()) {
            println!("{}", render::entry(&entry));
        }
        if let Some(metadata) = last.as_answer().and_then(|a| a.metadata.as_ref()) {
            println!("{}", render::metadata(metadata));
        }
    }

    match outcome {
        SubmitOutcome::Failed { message } => bail!(message),
        _ => Ok(()),
    }
}

async fn trigger(session: &Session, kind: JobKind) -> Result<()> {
    match session.operations().trigger(kind).await {
        TriggerOutcome::Succeeded { .. } => {
            println!("{}", render::job(kind, &session.operations().job_status(kind)));
            Ok(())
        }
        TriggerOutcome::Failed { message } => bail!(message),
        TriggerOutcome::Rejected | TriggerOutcome::Superseded => {
            bail!("{} is already running", kind)
        }
    }
}

async fn health(session: &Session) -> Result<()> {
    let snapshot = session.operations().poll_health().await;
    println!("{}", render::health(&snapshot));
    if snapshot.state != HealthState::Ok {
        bail!("Service is unavailable");
    }
    Ok(())
}
