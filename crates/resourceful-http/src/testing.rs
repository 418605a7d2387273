//! In-memory collaborators for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::logging::{LogLevel, LogSink};
use crate::request::Request;
use crate::response::Response;
use crate::transport::{Connection, Transport, TransportError, TransportErrorKind};

/// Answers requests from a fixed script and records what it was sent.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<Response, TransportError>>>,
    requests: Mutex<Vec<Request>>,
    connections: Mutex<Vec<(String, u16)>>,
    open: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Result<Response, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            ..Default::default()
        })
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn connections(&self) -> Vec<(String, u16)> {
        self.connections.lock().unwrap().clone()
    }

    /// Connections handed out and not yet dropped.
    pub fn open_connections(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

impl Transport for ScriptedTransport {
    fn connect(&self, host: &str, port: u16) -> Result<Box<dyn Connection + '_>, TransportError> {
        self.connections
            .lock()
            .unwrap()
            .push((host.to_string(), port));
        self.open.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedConnection { transport: self }))
    }
}

struct ScriptedConnection<'a> {
    transport: &'a ScriptedTransport,
}

impl Connection for ScriptedConnection<'_> {
    fn send(&mut self, request: &Request) -> Result<Response, TransportError> {
        self.transport.requests.lock().unwrap().push(request.clone());
        self.transport
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(TransportError::new(
                    TransportErrorKind::Other,
                    "script exhausted",
                ))
            })
    }
}

impl Drop for ScriptedConnection<'_> {
    fn drop(&mut self) {
        self.transport.open.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Keeps every line it is given.
#[derive(Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<(LogLevel, String)>>,
}

impl RecordingSink {
    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines.lock().unwrap().clone()
    }
}

impl LogSink for RecordingSink {
    fn log(&self, level: LogLevel, message: &str) {
        self.lines
            .lock()
            .unwrap()
            .push((level, message.to_string()));
    }
}
