//! Backend job types and the per-job status state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Long-running backend operations the client can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    /// Download fresh price files from the supermarket chains.
    Scrape,
    /// Load downloaded files into the query database.
    Import,
}

impl JobKind {
    pub const ALL: [JobKind; 2] = [JobKind::Scrape, JobKind::Import];

    /// Path of the trigger endpoint, relative to the service base URL.
    pub fn endpoint(self) -> &'static str {
        match self {
            JobKind::Scrape => "/scrape",
            JobKind::Import => "/import",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobKind::Scrape => "scrape",
            JobKind::Import => "import",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job status in the lifecycle.
///
/// `Idle -> Running -> (Succeeded | Failed) -> Idle`, the last step after a
/// fixed display timeout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    #[default]
    Idle,
    /// Trigger request sent, response pending.
    Running,
    /// The service accepted the trigger.
    Succeeded,
    /// The trigger was rejected or never reached the service.
    Failed,
}

impl JobState {
    /// Succeeded and Failed are displayed briefly, then revert to Idle.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }
}

/// Status of one job kind as shown to the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    pub state: JobState,
    /// Confirmation or failure text from the last completed trigger.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl JobStatus {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn running() -> Self {
        Self {
            state: JobState::Running,
            message: None,
        }
    }

    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            state: JobState::Succeeded,
            message: Some(message.into()),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            state: JobState::Failed,
            message: Some(message.into()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == JobState::Running
    }
}
