//! Conversation types: the UI-facing transcript and the LLM-facing context.
//!
//! The transcript is what the user sees (questions, tables, errors). The context
//! is the compact role-tagged record that gets re-submitted with every query so
//! the remote engine can resolve follow-up questions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::QueryMetadata;

/// A single cell in a result row. Cells are heterogeneous: numbers, strings,
/// timestamp-like strings or null.
pub type CellValue = Value;

/// Tabular result of a successful query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Column names in the order the service returned them.
    #[serde(default)]
    pub columns: Vec<String>,
    /// Rows, each an ordered sequence of cells aligned with `columns`.
    #[serde(default)]
    pub rows: Vec<Vec<CellValue>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { columns, rows }
    }

    /// A successful result with zero rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// What a completed query cycle produced. Exactly one of the two.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerOutcome {
    /// The query ran; the set may be empty.
    Rows(ResultSet),
    /// The cycle failed; carries the message shown to the user.
    Error { message: String },
}

impl AnswerOutcome {
    pub fn error(message: impl Into<String>) -> Self {
        AnswerOutcome::Error {
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, AnswerOutcome::Error { .. })
    }
}

/// An answer entry in the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// The question this answer responds to.
    pub question: String,
    /// Query the remote engine generated, when it got that far.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_query: Option<String>,
    pub outcome: AnswerOutcome,
    /// Diagnostic metadata returned by debug queries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<QueryMetadata>,
}

/// One entry of the UI-facing transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TranscriptEntry {
    /// The literal user utterance.
    Question { text: String },
    Answer(Answer),
}

impl TranscriptEntry {
    pub fn question(text: impl Into<String>) -> Self {
        TranscriptEntry::Question { text: text.into() }
    }

    pub fn as_answer(&self) -> Option<&Answer> {
        match self {
            TranscriptEntry::Answer(answer) => Some(answer),
            TranscriptEntry::Question { .. } => None,
        }
    }
}

/// Role of a context turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextRole {
    User,
    Assistant,
}

/// One role-tagged utterance of the LLM-facing context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextTurn {
    pub role: ContextRole,
    pub content: String,
}

impl ContextTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ContextRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ContextRole::Assistant,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_context_turn_wire_shape() {
        let turn = ContextTurn::user("cheapest milk");
        let value = serde_json::to_value(&turn).unwrap();
        assert_eq!(value, json!({"role": "user", "content": "cheapest milk"}));

        let turn: ContextTurn =
            serde_json::from_value(json!({"role": "assistant", "content": "done"})).unwrap();
        assert_eq!(turn.role, ContextRole::Assistant);
    }

    #[test]
    fn test_result_set_counts() {
        let set = ResultSet::new(
            vec!["StoreName".into(), "ItemPrice".into()],
            vec![vec![json!("Store A"), json!(6.9)]],
        );
        assert_eq!(set.row_count(), 1);
        assert_eq!(set.column_count(), 2);
        assert!(!set.is_empty());
        assert!(ResultSet::default().is_empty());
    }

    #[test]
    fn test_transcript_entry_tagging() {
        let entry = TranscriptEntry::question("hi");
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["type"], "question");
        assert!(entry.as_answer().is_none());

        let entry = TranscriptEntry::Answer(Answer {
            question: "hi".into(),
            generated_query: None,
            outcome: AnswerOutcome::error("boom"),
            metadata: None,
        });
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["type"], "answer");
        assert_eq!(value["outcome"]["kind"], "error");
        assert!(entry.as_answer().unwrap().outcome.is_error());
    }
}
