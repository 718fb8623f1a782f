//! Scripted in-memory transport for tests.
//!
//! Routes are matched on the path and query of the requested URL, so tests do
//! not depend on which pool member was picked.

use crate::api::transport::{RawResponse, Transport, TransportError};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

enum Scripted {
    Response(RawResponse),
    NetworkError,
}

/// Transport answering from per-path scripts
///
/// Each path holds a queue; the last entry repeats once the others are used up.
/// Unknown paths answer 404.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `path`
    pub fn respond(&self, path: &str, status: u16, body: &str) {
        self.push(
            path,
            Scripted::Response(RawResponse {
                status,
                body: body.to_string(),
            }),
        );
    }

    /// Queue a JSON response for `path`
    pub fn respond_json(&self, path: &str, body: serde_json::Value) {
        self.respond(path, 200, &body.to_string());
    }

    pub fn respond_sequence(&self, path: &str, responses: Vec<(u16, &str)>) {
        for (status, body) in responses {
            self.respond(path, status, body);
        }
    }

    /// Queue `times` network failures for `path`
    pub fn fail_network(&self, path: &str, times: usize) {
        for _ in 0..times {
            self.push(path, Scripted::NetworkError);
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Paths requested so far, in order
    pub fn paths(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| path_of(url).to_string())
            .collect()
    }

    pub fn referers(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, referer)| referer.clone())
            .collect()
    }

    fn push(&self, path: &str, scripted: Scripted) {
        self.routes
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(scripted);
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &str, referer: &str) -> Result<RawResponse, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), referer.to_string()));

        let mut routes = self.routes.lock().unwrap();
        let Some(queue) = routes.get_mut(path_of(url)) else {
            return Ok(RawResponse {
                status: 404,
                body: "not found".to_string(),
            });
        };

        let scripted = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().map(|s| match s {
                Scripted::Response(r) => Scripted::Response(r.clone()),
                Scripted::NetworkError => Scripted::NetworkError,
            })
        };

        match scripted {
            Some(Scripted::Response(response)) => Ok(response),
            Some(Scripted::NetworkError) => {
                Err(TransportError::Network("connection reset".to_string()))
            }
            None => Ok(RawResponse {
                status: 404,
                body: "not found".to_string(),
            }),
        }
    }
}

/// Strip scheme and host: `https://a.example/x?y` → `/x?y`
fn path_of(url: &str) -> &str {
    let rest = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    rest.find('/').map(|idx| &rest[idx..]).unwrap_or("/")
}
