//! Test doubles shared by the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use opsdesk_core::session::{InMemoryKeyValueStore, SessionEvents, TokenStore};
use opsdesk_interaction::{ApiError, OutgoingRequest, RawResponse, RequestClient, Transport};

pub const BASE_URL: &str = "http://localhost:8080/api/v1/";

/// Records every request and answers with queued responses, in order.
/// An empty queue fails with a transport error.
#[derive(Default)]
pub struct FakeTransport {
    responses: Mutex<VecDeque<RawResponse>>,
    requests: Mutex<Vec<OutgoingRequest>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, response: RawResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn requests(&self) -> Vec<OutgoingRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> OutgoingRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: OutgoingRequest) -> Result<RawResponse, ApiError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ApiError::Transport("no canned response queued".to_string()))
    }
}

pub fn json_response(status: u16, body: &str) -> RawResponse {
    RawResponse {
        status,
        status_text: status_text(status).to_string(),
        content_type: Some("application/json".to_string()),
        body: body.as_bytes().to_vec(),
    }
}

pub fn empty_response(status: u16) -> RawResponse {
    RawResponse {
        status,
        status_text: status_text(status).to_string(),
        content_type: None,
        body: Vec::new(),
    }
}

pub fn raw_response(status: u16, content_type: &str, body: &[u8]) -> RawResponse {
    RawResponse {
        status,
        status_text: status_text(status).to_string(),
        content_type: Some(content_type.to_string()),
        body: body.to_vec(),
    }
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "",
    }
}

pub struct Harness {
    pub transport: Arc<FakeTransport>,
    pub storage: Arc<InMemoryKeyValueStore>,
    pub tokens: Arc<TokenStore>,
    pub events: SessionEvents,
    pub client: Arc<RequestClient>,
}

/// Client over a fresh fake transport with `entries` pre-seeded in storage.
pub fn harness(entries: &[(&str, &str)]) -> Harness {
    let transport = FakeTransport::new();
    let storage = Arc::new(InMemoryKeyValueStore::with_entries(entries.iter().copied()));
    let tokens = Arc::new(TokenStore::new(storage.clone()));
    let events = SessionEvents::new();
    let client = RequestClient::new(BASE_URL, transport.clone(), tokens.clone(), events.clone())
        .expect("valid base URL");
    Harness {
        transport,
        storage,
        tokens,
        events,
        client: Arc::new(client),
    }
}

pub fn logged_in() -> Harness {
    harness(&[
        ("accessToken", "T"),
        ("refreshToken", "R"),
        ("id", "42"),
        ("role", "admin"),
    ])
}
