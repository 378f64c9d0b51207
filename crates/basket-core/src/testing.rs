//! Scripted [`PriceService`] for unit tests.

use crate::{PriceService, ServiceError};
use async_trait::async_trait;
use basket_types::{HealthResponse, JobAccepted, JobKind, QueryRequest, QueryResponse};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

type Reply<T> = Result<T, ServiceError>;

/// Replies are consumed in order; an exhausted queue answers with a default
/// success.
#[derive(Default)]
pub(crate) struct FakeService {
    queries: Mutex<VecDeque<Reply<QueryResponse>>>,
    jobs: Mutex<HashMap<JobKind, VecDeque<Reply<JobAccepted>>>>,
    health: Mutex<VecDeque<Reply<HealthResponse>>>,
    health_delays: Mutex<VecDeque<Duration>>,
    query_gate: Option<Arc<Notify>>,
    job_gate: Option<Arc<Notify>>,
    pub requests: Mutex<Vec<QueryRequest>>,
    pub job_calls: Mutex<Vec<JobKind>>,
    pub health_calls: AtomicUsize,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(self, reply: Reply<QueryResponse>) -> Self {
        self.queries.lock().unwrap().push_back(reply);
        self
    }

    pub fn with_job(self, kind: JobKind, reply: Reply<JobAccepted>) -> Self {
        self.jobs
            .lock()
            .unwrap()
            .entry(kind)
            .or_default()
            .push_back(reply);
        self
    }

    pub fn with_health(self, reply: Reply<HealthResponse>) -> Self {
        self.health.lock().unwrap().push_back(reply);
        self
    }

    /// Delay the next health reply. Delays are consumed per call, in call
    /// order; calls beyond the queue answer at once.
    pub fn with_health_delay(self, delay: Duration) -> Self {
        self.health_delays.lock().unwrap().push_back(delay);
        self
    }

    /// Every query waits for one `notify_one` before replying.
    pub fn with_query_gate(mut self, gate: Arc<Notify>) -> Self {
        self.query_gate = Some(gate);
        self
    }

    /// Every job trigger waits for one `notify_one` before replying.
    pub fn with_job_gate(mut self, gate: Arc<Notify>) -> Self {
        self.job_gate = Some(gate);
        self
    }

    pub fn health_calls(&self) -> usize {
        self.health_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceService for FakeService {
    async fn query(&self, request: &QueryRequest) -> Reply<QueryResponse> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.query_gate {
            gate.notified().await;
        }
        self.queries
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(QueryResponse::default()))
    }

    async fn start_job(&self, kind: JobKind) -> Reply<JobAccepted> {
        self.job_calls.lock().unwrap().push(kind);
        if let Some(gate) = &self.job_gate {
            gate.notified().await;
        }
        let reply = self
            .jobs
            .lock()
            .unwrap()
            .get_mut(&kind)
            .and_then(|queue| queue.pop_front());
        reply.unwrap_or_else(|| {
            Ok(JobAccepted {
                message: format!("{} started", kind),
            })
        })
    }

    async fn health(&self) -> Reply<HealthResponse> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        // Replies are taken in call order so a delayed call keeps its own.
        let reply = self.health.lock().unwrap().pop_front();
        let delay = self.health_delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        reply.unwrap_or_else(|| {
            Ok(HealthResponse {
                status: "ok".into(),
                version: None,
            })
        })
    }
}

pub(crate) fn rows_response(sql: &str, columns: &[&str], data: Vec<Vec<serde_json::Value>>) -> QueryResponse {
    QueryResponse {
        sql: Some(sql.to_string()),
        columns: columns.iter().map(|c| c.to_string()).collect(),
        data,
        ..Default::default()
    }
}
