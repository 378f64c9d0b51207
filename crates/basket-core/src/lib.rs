//! Core session and job-status logic for Basket.
//!
//! A [`Session`] pairs a [`QuerySession`] (multi-turn natural-language queries
//! against the price service) with an [`OperationsController`] (scrape/import
//! triggers and health polling). Formatting and view models for front ends
//! live in [`format`] and [`view`].

mod client;
mod conversation;
mod error;
pub mod format;
mod operations;
mod query;
mod session;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{DEFAULT_SERVICE_URL, HttpPriceService, PriceService, ServiceClientConfig};
pub use conversation::ConversationStore;
pub use error::{BasketError, FALLBACK_ERROR_MESSAGE, ServiceError};
pub use format::{ColumnVocabulary, NOT_AVAILABLE, format_cell};
pub use operations::{
    JobMessage, OperationsConfig, OperationsController, OperationsEvent, OperationsSnapshot,
    TriggerOutcome,
};
pub use query::{QuerySession, SubmitOutcome, SubmitRejection};
pub use session::{Session, SessionConfig};

/// Result type for Basket operations.
pub type Result<T> = std::result::Result<T, BasketError>;
