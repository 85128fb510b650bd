//! Diagnostic sink — the injected channel for user-visible log lines.
//!
//! Hosts that render a terminal panel hand the session a sink; everything
//! else (operational logs) goes through `tracing`. Calls are
//! fire-and-forget with no acknowledgment; a no-op sink is always safe.

use std::sync::Mutex;

pub trait DiagnosticSink: Send + Sync {
    fn add_log(&self, message: &str);
}

/// Forwards log lines to `tracing` at info level.
#[derive(Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn add_log(&self, message: &str) {
        tracing::info!(target: "terminal", "{message}");
    }
}

/// Collects log lines in memory. Used by tests and by hosts that render
/// the lines themselves.
#[derive(Debug, Default)]
pub struct BufferSink {
    logs: Mutex<Vec<String>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn logs(&self) -> Vec<String> {
        self.logs.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut logs) = self.logs.lock() {
            logs.clear();
        }
    }
}

impl DiagnosticSink for BufferSink {
    fn add_log(&self, message: &str) {
        if let Ok(mut logs) = self.logs.lock() {
            logs.push(message.to_string());
        }
    }
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn add_log(&self, _message: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_sink_collects_in_order() {
        let sink = BufferSink::new();
        sink.add_log("first");
        sink.add_log("second");
        assert_eq!(sink.logs(), vec!["first", "second"]);

        sink.clear();
        assert!(sink.logs().is_empty());
    }

    #[test]
    fn noop_sink_accepts_anything() {
        NoopSink.add_log("goes nowhere");
    }
}
