//! Outcome reporting
//!
//! The reporter follows one invocation and remembers the last request it
//! made, so a failure anywhere still produces a report naming the method,
//! path and payload involved.

use chrono::Utc;
use serde_json::Value;

use nfvis_common::{Error, Method, Outcome, Report, ResourceKind, State};

use crate::client::ApiResponse;

/// A reconciliation that did not converge
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct Failure {
    #[source]
    pub error: Error,
    /// Report with `Outcome::Failed` and the last known request
    pub report: Report,
}

/// Collects what happened during one invocation
#[derive(Debug)]
pub struct OutcomeReporter {
    kind: ResourceKind,
    key: String,
    state: State,
    preview: bool,
    changed_fields: Vec<String>,
    method: Option<Method>,
    path: Option<String>,
    payload: Option<Value>,
    status: Option<u16>,
    response: Option<Value>,
    current: Option<Value>,
}

impl OutcomeReporter {
    pub fn new(kind: ResourceKind, key: impl Into<String>, state: State, preview: bool) -> Self {
        Self {
            kind,
            key: key.into(),
            state,
            preview,
            changed_fields: Vec::new(),
            method: None,
            path: None,
            payload: None,
            status: None,
            response: None,
            current: None,
        }
    }

    /// Remember the remote instance as it was before any mutation
    pub fn observe_current(&mut self, current: Option<&Value>) {
        self.current = current.cloned();
    }

    pub fn record_request(&mut self, method: Method, path: &str, payload: Option<&Value>) {
        self.method = Some(method);
        self.path = Some(path.to_string());
        self.payload = payload.cloned();
        self.status = None;
        self.response = None;
    }

    pub fn record_response(&mut self, response: &ApiResponse) {
        self.status = Some(response.status);
        self.response = response.body.clone();
    }

    pub fn record_fields(&mut self, fields: &[&str]) {
        self.changed_fields = fields.iter().map(|f| f.to_string()).collect();
    }

    pub fn finish(self, outcome: Outcome) -> Report {
        Report {
            kind: self.kind,
            key: self.key,
            state: self.state,
            changed: outcome.is_change(),
            outcome,
            changed_fields: self.changed_fields,
            method: self.method,
            path: self.path,
            payload: self.payload,
            status: self.status,
            response: self.response,
            current: self.current,
            preview: self.preview,
            finished_at: Utc::now(),
        }
    }

    pub fn fail(mut self, error: Error) -> Failure {
        if let Error::Protocol { status, body, .. } = &error {
            self.status = Some(*status);
            self.response = body.clone();
        }
        let report = self.finish(Outcome::Failed(error.to_string()));
        Failure { error, report }
    }
}
