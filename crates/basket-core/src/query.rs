//! Query session controller: one question, one request, one answer.

use crate::{ConversationStore, PriceService};
use basket_types::{AnswerOutcome, ContextTurn, QueryRequest, TranscriptEntry};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Why a submission was dropped without sending anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejection {
    /// Utterance was empty after trimming.
    Empty,
    /// Another request is still in flight.
    Busy,
}

/// Result of [`QuerySession::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing was sent and no state changed.
    Rejected(SubmitRejection),
    /// The answer was recorded with this many rows.
    Answered { rows: usize },
    /// An error answer was recorded.
    Failed { message: String },
    /// The conversation was reset while the request was in flight; the
    /// response was dropped.
    Discarded,
}

struct Conversation {
    store: ConversationStore,
    /// Bumped by every reset. In-flight requests remember the value they
    /// started with.
    generation: u64,
}

/// Drives request/response cycles against the query endpoint.
///
/// At most one request is in flight: `submit` while busy is rejected, not
/// queued.
pub struct QuerySession {
    service: Arc<dyn PriceService>,
    conversation: RwLock<Conversation>,
    busy: AtomicBool,
}

/// Clears the busy flag when the cycle ends, including when the submitting
/// future is dropped mid-request.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl QuerySession {
    pub fn new(service: Arc<dyn PriceService>) -> Self {
        Self {
            service,
            conversation: RwLock::new(Conversation {
                store: ConversationStore::new(),
                generation: 0,
            }),
            busy: AtomicBool::new(false),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Ask `utterance` with the current context.
    ///
    /// The question is appended immediately; the answer (or error) is appended
    /// when the service replies.
    pub async fn submit(&self, utterance: &str) -> SubmitOutcome {
        let question = utterance.trim();
        if question.is_empty() {
            debug!(target: "basket::query", "Ignoring empty question");
            return SubmitOutcome::Rejected(SubmitRejection::Empty);
        }
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(target: "basket::query", "Ignoring question while a query is in flight");
            return SubmitOutcome::Rejected(SubmitRejection::Busy);
        }
        let _busy = BusyGuard(&self.busy);

        let (request, generation) = {
            let mut conversation = self.conversation.write().await;
            conversation.store.append_question(question);
            let request = QueryRequest {
                question: question.to_string(),
                conversation_history: conversation.store.context().to_vec(),
            };
            (request, conversation.generation)
        };

        info!(
            target: "basket::query",
            "Submitting question ({} context turns): {}",
            request.conversation_history.len(),
            question
        );
        let result = self.service.query(&request).await;

        let mut conversation = self.conversation.write().await;
        if conversation.generation != generation {
            info!(
                target: "basket::query",
                "Dropping response for '{}': conversation was reset",
                question
            );
            return SubmitOutcome::Discarded;
        }

        match result {
            Ok(mut response) => {
                let generated_query = response.sql.take();
                let metadata = response.metadata.take();
                let result_set = response.take_result_set();
                let rows = result_set.row_count();
                debug!(
                    target: "basket::query",
                    "Query returned {} rows x {} columns",
                    rows,
                    result_set.column_count()
                );
                conversation.store.append_answer_with_metadata(
                    question,
                    AnswerOutcome::Rows(result_set),
                    generated_query,
                    metadata,
                );
                SubmitOutcome::Answered { rows }
            }
            Err(err) => {
                let message = err.user_message();
                warn!(target: "basket::query", "Query failed: {}", err);
                conversation
                    .store
                    .append_answer(question, AnswerOutcome::error(message.clone()), None);
                SubmitOutcome::Failed { message }
            }
        }
    }

    /// Start a new conversation. Responses still in flight are dropped when
    /// they arrive.
    pub async fn reset(&self) {
        let mut conversation = self.conversation.write().await;
        conversation.store.reset();
        conversation.generation += 1;
        info!(target: "basket::query", "Conversation reset");
    }

    pub async fn transcript(&self) -> Vec<TranscriptEntry> {
        self.conversation.read().await.store.transcript().to_vec()
    }

    pub async fn context(&self) -> Vec<ContextTurn> {
        self.conversation.read().await.store.context().to_vec()
    }
}
