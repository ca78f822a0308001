//! In-memory transport for driving the engine without a server.
//!
//! Replies are scripted per endpoint: one-shot replies are consumed in order,
//! then the endpoint's standing reply (if any) is used. Every request is
//! recorded, so "no network call was made" is a plain assertion on the log.

use crate::error::TransportError;
use crate::transport::{ApiRequest, RawResponse, Transport};
use nightwatch_protocol::Endpoint;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Outcome {
    Response(RawResponse),
    NetworkError(String),
}

/// A scripted reply, optionally delayed (on the tokio clock).
#[derive(Debug, Clone)]
pub struct Reply {
    outcome: Outcome,
    delay: Option<Duration>,
}

impl Reply {
    pub fn json(value: Value) -> Self {
        Self::status(200, value.to_string())
    }

    pub fn status(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            outcome: Outcome::Response(RawResponse::new(status, body)),
            delay: None,
        }
    }

    pub fn detail(status: u16, detail: &str) -> Self {
        Self::status(status, serde_json::json!({ "detail": detail }).to_string())
    }

    pub fn no_content() -> Self {
        Self::status(204, Vec::new())
    }

    pub fn network_error(message: &str) -> Self {
        Self {
            outcome: Outcome::NetworkError(message.to_string()),
            delay: None,
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Debug, Default)]
struct Script {
    queued: VecDeque<Reply>,
    standing: Option<Reply>,
}

#[derive(Debug, Default)]
pub struct ScriptedTransport {
    scripts: RefCell<HashMap<String, Script>>,
    requests: RefCell<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a one-shot reply for `endpoint`.
    pub fn respond(&self, endpoint: Endpoint, reply: Reply) {
        self.scripts
            .borrow_mut()
            .entry(endpoint.to_string())
            .or_default()
            .queued
            .push_back(reply);
    }

    /// Sets the reply used whenever no one-shot reply is queued.
    pub fn respond_always(&self, endpoint: Endpoint, reply: Reply) {
        self.scripts
            .borrow_mut()
            .entry(endpoint.to_string())
            .or_default()
            .standing = Some(reply);
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn count(&self, endpoint: &Endpoint) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|request| &request.endpoint == endpoint)
            .count()
    }

    pub fn clear_requests(&self) {
        self.requests.borrow_mut().clear();
    }

    fn next_reply(&self, endpoint: &Endpoint) -> Option<Reply> {
        let mut scripts = self.scripts.borrow_mut();
        let script = scripts.get_mut(&endpoint.to_string())?;
        script.queued.pop_front().or_else(|| script.standing.clone())
    }
}

impl Transport for ScriptedTransport {
    fn send(
        &self,
        request: ApiRequest,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> {
        let reply = self.next_reply(&request.endpoint);
        let label = request.endpoint.to_string();
        self.requests.borrow_mut().push(request);

        async move {
            let Some(reply) = reply else {
                return Err(TransportError::Network(format!(
                    "No scripted response for {}",
                    label
                )));
            };
            if let Some(delay) = reply.delay {
                tokio::time::sleep(delay).await;
            }
            match reply.outcome {
                Outcome::Response(response) => Ok(response),
                Outcome::NetworkError(message) => Err(TransportError::Network(message)),
            }
        }
    }
}
