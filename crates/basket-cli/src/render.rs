//! Terminal rendering of view models.
//!
//! Everything returns a `String` so the REPL and the one-shot commands print
//! the same text.

use basket_core::view::{self, AnswerView, EntryView, SUGGESTIONS, TableView};
use basket_core::OperationsSnapshot;
use basket_types::{HealthSnapshot, HealthState, JobKind, JobState, JobStatus, QueryMetadata};
use colored::Colorize;
use tabled::{builder::Builder, settings::Style};

pub const THINKING: &str = "Thinking…";

pub fn table(table: &TableView) -> String {
    let mut builder = Builder::default();
    builder.push_record(table.headers.iter().cloned());
    for row in &table.rows {
        builder.push_record(row.iter().cloned());
    }
    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

pub fn answer_body(body: &AnswerView) -> String {
    match body {
        AnswerView::Table(t) => table(t),
        AnswerView::NoResults => "No results.".dimmed().to_string(),
        AnswerView::Error(message) => format!("{} {}", "✗".red(), message.red()),
    }
}

pub fn entry(entry: &EntryView) -> String {
    match entry {
        EntryView::Question(text) => format!("{} {}", "›".cyan().bold(), text.bold()),
        EntryView::Answer {
            generated_query,
            body,
            ..
        } => {
            let mut out = String::new();
            if let Some(sql) = generated_query {
                out.push_str(&format!("{}\n", sql.dimmed()));
            }
            out.push_str(&answer_body(body));
            out
        }
    }
}

pub fn metadata(metadata: &QueryMetadata) -> String {
    let mut lines = vec![format!(
        "{} {} cities, {} chains",
        "Data:".bold(),
        metadata.cities_count,
        metadata.chains_count
    )];
    if !metadata.sample_cities.is_empty() {
        lines.push(format!(
            "{} {}",
            "Cities:".bold(),
            metadata.sample_cities.join(", ")
        ));
    }
    for (key, value) in &metadata.stats {
        lines.push(format!("{} {}", format!("{}:", key).bold(), value));
    }
    lines.join("\n")
}

pub fn suggestions() -> String {
    let mut out = format!("{}\n", "Try asking:".bold());
    for question in SUGGESTIONS {
        out.push_str(&format!("  • {}\n", question));
    }
    out
}

pub fn job(kind: JobKind, status: &JobStatus) -> String {
    let line = view::describe_job(kind.as_str(), status);
    match status.state {
        JobState::Idle => line.dimmed().to_string(),
        JobState::Running => line.yellow().to_string(),
        JobState::Succeeded => line.green().to_string(),
        JobState::Failed => line.red().to_string(),
    }
}

pub fn health(health: &HealthSnapshot) -> String {
    let line = view::describe_health(health);
    match health.state {
        HealthState::Unknown => line.dimmed().to_string(),
        HealthState::Ok => line.green().to_string(),
        HealthState::Error => line.red().to_string(),
    }
}

pub fn status(snapshot: &OperationsSnapshot) -> String {
    let mut lines = vec![
        health(&snapshot.health),
        job(JobKind::Scrape, &snapshot.scrape),
        job(JobKind::Import, &snapshot.import),
    ];
    if let Some(message) = &snapshot.message {
        lines.push(format!("{} {}", format!("[{}]", message.kind).dimmed(), message.text));
    }
    lines.join("\n")
}

pub fn help() -> String {
    let commands = [
        ("/new", "start a new conversation"),
        ("/history", "show the conversation so far"),
        ("/scrape", "start the price scraper"),
        ("/import", "start the price importer"),
        ("/status", "show service and job status"),
        ("/health", "check the service now"),
        ("/help", "show this help"),
        ("/quit", "exit"),
    ];
    let mut out = format!("{}\n", "Commands:".bold());
    for (name, description) in commands {
        out.push_str(&format!("  {:<10} {}\n", name.cyan(), description));
    }
    out.push_str("Anything else is sent as a question.\n");
    out
}
