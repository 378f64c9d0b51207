//! Mock price service for integration tests.
//!
//! Serves `/query`, `/scrape`, `/import` and `/health` on an ephemeral port.
//! Replies are queued per endpoint and consumed in order; an empty queue
//! answers like the real service does on success.

#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

/// A canned reply.
#[derive(Debug, Clone)]
pub enum Reply {
    Json(StatusCode, Value),
    /// Body that is not JSON.
    Raw(StatusCode, &'static str),
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Reply::Json(status, body) => (status, Json(body)).into_response(),
            Reply::Raw(status, body) => (status, body).into_response(),
        }
    }
}

#[derive(Default)]
pub struct Recorded {
    pub query_bodies: Vec<Value>,
    pub query_params: Vec<HashMap<String, String>>,
    pub job_calls: Vec<&'static str>,
    pub health_calls: usize,
}

#[derive(Default)]
struct Replies {
    query: VecDeque<Reply>,
    scrape: VecDeque<Reply>,
    import: VecDeque<Reply>,
    health: VecDeque<Reply>,
}

#[derive(Clone, Default)]
struct MockState {
    replies: Arc<Mutex<Replies>>,
    recorded: Arc<Mutex<Recorded>>,
}

pub struct MockService {
    pub addr: SocketAddr,
    state: MockState,
}

impl MockService {
    pub async fn start() -> Self {
        let state = MockState::default();
        let app = Router::new()
            .route("/query", post(query))
            .route("/scrape", post(scrape))
            .route("/import", post(import))
            .route("/health", get(health))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn push_query(&self, reply: Reply) {
        self.state.replies.lock().unwrap().query.push_back(reply);
    }

    pub fn push_scrape(&self, reply: Reply) {
        self.state.replies.lock().unwrap().scrape.push_back(reply);
    }

    pub fn push_import(&self, reply: Reply) {
        self.state.replies.lock().unwrap().import.push_back(reply);
    }

    pub fn push_health(&self, reply: Reply) {
        self.state.replies.lock().unwrap().health.push_back(reply);
    }

    pub fn recorded<T>(&self, f: impl FnOnce(&Recorded) -> T) -> T {
        f(&self.state.recorded.lock().unwrap())
    }
}

/// An address nothing listens on.
pub async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

async fn query(
    State(state): State<MockState>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Reply {
    let question = body["question"].clone();
    {
        let mut recorded = state.recorded.lock().unwrap();
        recorded.query_bodies.push(body);
        recorded.query_params.push(params);
    }
    let reply = state.replies.lock().unwrap().query.pop_front();
    reply.unwrap_or_else(|| {
        Reply::Json(
            StatusCode::OK,
            json!({"question": question, "sql": "SELECT 1", "columns": [], "data": []}),
        )
    })
}

async fn scrape(State(state): State<MockState>) -> Reply {
    state.recorded.lock().unwrap().job_calls.push("scrape");
    let reply = state.replies.lock().unwrap().scrape.pop_front();
    reply.unwrap_or_else(|| {
        Reply::Json(
            StatusCode::OK,
            json!({"message": "Scraper started in background"}),
        )
    })
}

async fn import(State(state): State<MockState>) -> Reply {
    state.recorded.lock().unwrap().job_calls.push("import");
    let reply = state.replies.lock().unwrap().import.pop_front();
    reply.unwrap_or_else(|| {
        Reply::Json(
            StatusCode::OK,
            json!({"message": "Importer started in background"}),
        )
    })
}

async fn health(State(state): State<MockState>) -> Reply {
    state.recorded.lock().unwrap().health_calls += 1;
    let reply = state.replies.lock().unwrap().health.pop_front();
    reply.unwrap_or_else(|| Reply::Json(StatusCode::OK, json!({"status": "ok"})))
}
