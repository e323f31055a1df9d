//! Scripted in-memory transport shared by the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;

use chrono::NaiveDate;
use serde_json::Value;

use dirsync_compiler::FixedClock;
use dirsync_reconcile::{Method, Transport, TransportError};

/// One request as the transport saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

/// Answers requests from a queue, in order, and records every call.
/// An unscripted request fails with a generic transport error.
#[derive(Default)]
pub struct ScriptedTransport {
    script: RefCell<VecDeque<Result<Value, TransportError>>>,
    calls: RefCell<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, body: Value) -> Self {
        self.script.borrow_mut().push_back(Ok(body));
        self
    }

    pub fn fail(self, err: TransportError) -> Self {
        self.script.borrow_mut().push_back(Err(err));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn routes(&self) -> Vec<(Method, String)> {
        self.calls
            .borrow()
            .iter()
            .map(|call| (call.method, call.path.clone()))
            .collect()
    }

    pub fn remaining(&self) -> usize {
        self.script.borrow().len()
    }
}

impl Transport for ScriptedTransport {
    fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&[u8]>,
    ) -> Result<Vec<u8>, TransportError> {
        let body = body.map(|bytes| serde_json::from_slice(bytes).expect("request body is json"));
        self.calls.borrow_mut().push(Call {
            method,
            path: path.to_owned(),
            body,
        });
        match self.script.borrow_mut().pop_front() {
            Some(Ok(value)) => Ok(serde_json::to_vec(&value).expect("encode response")),
            Some(Err(err)) => Err(err),
            None => Err(TransportError::Generic {
                status: None,
                body: format!("unscripted {} {path}", method.as_str()),
            }),
        }
    }
}

pub fn clock() -> FixedClock {
    FixedClock(NaiveDate::from_ymd_opt(2026, 10, 18).expect("valid date"))
}

pub fn not_found() -> TransportError {
    TransportError::NotFound {
        body: r#"{"message":"Not Found"}"#.to_owned(),
    }
}

pub fn conflict() -> TransportError {
    TransportError::Conflict {
        body: r#"{"message":"user is bound to a dependent service"}"#.to_owned(),
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
