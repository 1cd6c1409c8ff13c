//! Test utilities for the connection crate.
//!
//! This module provides an in-memory [`Transport`] shared by unit tests (in
//! `src/`) and integration tests (in `tests/`). It is only compiled for tests
//! or with the `test-support` feature.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};

use common::{MeteError, MeteResult};

use crate::transport::{HttpRequest, HttpResponse, Method, Transport};

#[derive(Debug, Clone)]
enum Reply {
    Response(HttpResponse),
    Unreachable,
}

#[derive(Debug, Clone)]
struct Route {
    method: Method,
    url: String,
    reply: Reply,
}

#[derive(Debug, Default)]
struct MockState {
    routes: Vec<Route>,
    requests: Vec<HttpRequest>,
}

/// Transport answering from a fixed routing table
///
/// Routes match on method and URL without the query string. Requests without
/// a route get a 404. Every request is recorded, including unmatched ones.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand the transport to a session while keeping this handle for asserts
    pub fn shared(&self) -> Arc<dyn Transport> {
        Arc::new(self.clone())
    }

    fn add(&self, method: Method, url: &str, reply: Reply) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.routes.retain(|route| !(route.method == method && route.url == url));
        state.routes.push(Route {
            method,
            url: url.to_string(),
            reply,
        });
    }

    pub fn respond(&self, method: Method, url: &str, response: HttpResponse) {
        self.add(method, url, Reply::Response(response));
    }

    pub fn respond_json(&self, method: Method, url: &str, status: u16, body: Value) {
        self.respond(method, url, HttpResponse::new(status, body.to_string()));
    }

    /// Make a URL fail as if the host could not be reached
    pub fn unreachable(&self, method: Method, url: &str) {
        self.add(method, url, Reply::Unreachable);
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .requests
            .clone()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests().pop()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> MeteResult<HttpResponse> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.requests.push(request.clone());

        let reply = state
            .routes
            .iter()
            .find(|route| route.method == request.method && route.url == request.url.as_str())
            .map(|route| route.reply.clone());

        match reply {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::Unreachable) => Err(MeteError::transport(format!(
                "error sending request for url ({})",
                request.url
            ))),
            None => Ok(HttpResponse::new(
                404,
                format!("no route for {} {}", request.method, request.url),
            )),
        }
    }
}
