//! Diagnostic output for debug mode.
//!
//! When `debug` or `advanced_debug` is enabled the executor dumps transport
//! info and the sent payload to a `DiagnosticSink`. The sink is a side
//! channel only; nothing written here is reflected in the returned response.

use tracing::info;

/// Destination for human-readable debug dumps.
pub trait DiagnosticSink {
    fn emit(&mut self, message: &str);
}

/// Default sink: forwards every message to `tracing` at INFO.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&mut self, message: &str) {
        info!(target: "proxycrawl::diagnostics", "{message}");
    }
}

/// Collects messages in memory. Handy for tests and for callers that want to
/// attach debug output to their own reports.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    messages: std::rc::Rc<std::cell::RefCell<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages emitted so far, shared with every clone of this sink.
    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&mut self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}
