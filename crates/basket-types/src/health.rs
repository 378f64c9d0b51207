//! Remote service health snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    /// No poll has completed yet.
    #[default]
    Unknown,
    Ok,
    Error,
}

/// Most recent result of polling the service's liveness endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub state: HealthState,
    /// Status text on success, transport error text on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// When the poll that produced this snapshot completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked_at: Option<DateTime<Utc>>,
}

impl HealthSnapshot {
    pub fn ok(detail: Option<String>) -> Self {
        Self {
            state: HealthState::Ok,
            detail,
            checked_at: Some(Utc::now()),
        }
    }

    pub fn error(detail: impl Into<String>) -> Self {
        Self {
            state: HealthState::Error,
            detail: Some(detail.into()),
            checked_at: Some(Utc::now()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.state == HealthState::Ok
    }
}
