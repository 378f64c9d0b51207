//! The explorer session: owns the query controller and the operations
//! controller for one connection to the price service.

use crate::{
    ColumnVocabulary, HttpPriceService, OperationsConfig, OperationsController, PriceService,
    QuerySession, Result, ServiceClientConfig,
};
use std::sync::Arc;
use tracing::info;

/// Configuration for a [`Session`].
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub client: ServiceClientConfig,
    pub operations: OperationsConfig,
    pub vocabulary: ColumnVocabulary,
}

/// Everything one user session needs, with an explicit lifecycle.
///
/// [`Session::begin`] starts health polling; [`Session::end`] (or dropping the
/// session) stops it.
pub struct Session {
    query: Arc<QuerySession>,
    operations: OperationsController,
    vocabulary: Arc<ColumnVocabulary>,
    active: bool,
}

impl Session {
    /// Build a session talking to the configured service over HTTP.
    pub fn connect(config: SessionConfig) -> Result<Self> {
        let service = HttpPriceService::new(config.client)?;
        info!(target: "basket::startup", "Using price service at {}", service.base_url());
        Ok(Self::with_service(
            Arc::new(service),
            config.operations,
            config.vocabulary,
        ))
    }

    pub fn with_service(
        service: Arc<dyn PriceService>,
        operations: OperationsConfig,
        vocabulary: ColumnVocabulary,
    ) -> Self {
        Self {
            query: Arc::new(QuerySession::new(service.clone())),
            operations: OperationsController::new(service, operations),
            vocabulary: Arc::new(vocabulary),
            active: false,
        }
    }

    /// Start the session. Must be called inside a tokio runtime.
    pub fn begin(&mut self) {
        if self.active {
            return;
        }
        self.operations.start_health_polling();
        self.active = true;
        info!(target: "basket::startup", "Session started");
    }

    /// End the session and cancel its timers.
    pub fn end(&mut self) {
        if !self.active {
            return;
        }
        self.operations.stop_health_polling();
        self.active = false;
        info!(target: "basket::startup", "Session ended");
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn query(&self) -> &Arc<QuerySession> {
        &self.query
    }

    pub fn operations(&self) -> &OperationsController {
        &self.operations
    }

    pub fn vocabulary(&self) -> &Arc<ColumnVocabulary> {
        &self.vocabulary
    }

    /// Clear transcript and context together.
    pub async fn new_conversation(&self) {
        self.query.reset().await;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.operations.stop_health_polling();
    }
}
