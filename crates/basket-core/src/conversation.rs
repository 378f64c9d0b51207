//! Conversation store: transcript and context, kept in lockstep.

use basket_types::{Answer, AnswerOutcome, ContextTurn, QueryMetadata, TranscriptEntry};

/// Holds the UI-facing transcript and the LLM-facing context.
///
/// Both sequences only ever grow, except through [`ConversationStore::reset`],
/// which clears them together. Context turns are added in user/assistant pairs
/// and only for answers that carry a result.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    transcript: Vec<TranscriptEntry>,
    context: Vec<ContextTurn>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_question(&mut self, text: impl Into<String>) {
        self.transcript.push(TranscriptEntry::question(text));
    }

    /// Record the answer to `question`.
    ///
    /// A result (even an empty one) also extends the context with the question
    /// and a summary of the generated query. An error leaves the context alone,
    /// so the next request continues from the last successful turn.
    pub fn append_answer(
        &mut self,
        question: impl Into<String>,
        outcome: AnswerOutcome,
        generated_query: Option<String>,
    ) {
        self.append_answer_with_metadata(question, outcome, generated_query, None);
    }

    pub fn append_answer_with_metadata(
        &mut self,
        question: impl Into<String>,
        outcome: AnswerOutcome,
        generated_query: Option<String>,
        metadata: Option<QueryMetadata>,
    ) {
        let question = question.into();
        if !outcome.is_error() {
            let summary = summarize_turn(&question, generated_query.as_deref());
            self.context.push(ContextTurn::user(question.clone()));
            self.context.push(ContextTurn::assistant(summary));
        }
        self.transcript.push(TranscriptEntry::Answer(Answer {
            question,
            generated_query,
            outcome,
            metadata,
        }));
    }

    pub fn reset(&mut self) {
        self.transcript.clear();
        self.context.clear();
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn context(&self) -> &[ContextTurn] {
        &self.context
    }

    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty() && self.context.is_empty()
    }
}

/// Assistant-side context text. Never includes result rows.
fn summarize_turn(question: &str, generated_query: Option<&str>) -> String {
    match generated_query.map(str::trim).filter(|q| !q.is_empty()) {
        Some(query) => format!(
            "Answered the question \"{}\" by running the query: {}",
            question, query
        ),
        None => format!("Answered the question \"{}\" without a query.", question),
    }
}
