//! Read-only view models for the presentation layer.
//!
//! Nothing here mutates session state; front ends build these from snapshots
//! and draw them however they like.

use crate::format::{ColumnVocabulary, NOT_AVAILABLE};
use basket_types::{
    Answer, AnswerOutcome, HealthSnapshot, HealthState, JobState, JobStatus, ResultSet,
    TranscriptEntry,
};

/// Starter questions shown while the transcript is empty.
pub const SUGGESTIONS: &[&str] = &[
    "Where is the cheapest milk?",
    "Compare the price of white bread across chains",
    "Which stores are in Haifa?",
    "Show current promotions on coffee",
    "When were prices last updated?",
];

/// A formatted result table: one header per column, one row per result row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerView {
    Table(TableView),
    /// The query succeeded with zero rows.
    NoResults,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryView {
    Question(String),
    Answer {
        question: String,
        generated_query: Option<String>,
        body: AnswerView,
    },
}

pub fn render_result_set(set: &ResultSet, vocabulary: &ColumnVocabulary) -> AnswerView {
    if set.is_empty() {
        return AnswerView::NoResults;
    }

    let headers = set
        .columns
        .iter()
        .map(|column| vocabulary.label(column).to_string())
        .collect();

    // Rows are aligned to the header: missing cells show as N/A, extras are dropped.
    let rows = set
        .rows
        .iter()
        .map(|row| {
            set.columns
                .iter()
                .enumerate()
                .map(|(i, column)| match row.get(i) {
                    Some(cell) => vocabulary.format_cell(cell, column),
                    None => NOT_AVAILABLE.to_string(),
                })
                .collect()
        })
        .collect();

    AnswerView::Table(TableView { headers, rows })
}

pub fn render_answer(answer: &Answer, vocabulary: &ColumnVocabulary) -> AnswerView {
    match &answer.outcome {
        AnswerOutcome::Rows(set) => render_result_set(set, vocabulary),
        AnswerOutcome::Error { message } => AnswerView::Error(message.clone()),
    }
}

pub fn render_transcript(
    transcript: &[TranscriptEntry],
    vocabulary: &ColumnVocabulary,
) -> Vec<EntryView> {
    transcript
        .iter()
        .map(|entry| match entry {
            TranscriptEntry::Question { text } => EntryView::Question(text.clone()),
            TranscriptEntry::Answer(answer) => EntryView::Answer {
                question: answer.question.clone(),
                generated_query: answer.generated_query.clone(),
                body: render_answer(answer, vocabulary),
            },
        })
        .collect()
}

/// One-line job status, e.g. `scrape: failed (scraper busy)`.
pub fn describe_job(name: &str, status: &JobStatus) -> String {
    let state = match status.state {
        JobState::Idle => "idle",
        JobState::Running => "running...",
        JobState::Succeeded => "started",
        JobState::Failed => "failed",
    };
    match &status.message {
        Some(message) => format!("{}: {} ({})", name, state, message),
        None => format!("{}: {}", name, state),
    }
}

pub fn describe_health(health: &HealthSnapshot) -> String {
    let state = match health.state {
        HealthState::Unknown => "checking...",
        HealthState::Ok => "online",
        HealthState::Error => "offline",
    };
    match (&health.state, &health.detail) {
        (HealthState::Error, Some(detail)) => format!("service {} ({})", state, detail),
        _ => format!("service {}", state),
    }
}
