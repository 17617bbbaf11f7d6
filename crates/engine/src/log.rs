//! Delivery of run log entries to the caller.
//!
//! Entries are handed to a [`LogSink`] as soon as they are produced. Branches run
//! concurrently and share one sink, so implementations must accept calls from several
//! branches; ordering is only guaranteed among entries of the same branch.

use std::sync::Mutex;

use agentflow_types::{LogEntry, LogSeverity};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// Receives log entries while a run is in progress.
pub trait LogSink: Send + Sync {
    fn emit(&self, entry: LogEntry);
}

impl<F> LogSink for F
where
    F: Fn(LogEntry) + Send + Sync,
{
    fn emit(&self, entry: LogEntry) {
        self(entry)
    }
}

/// Streams entries over an unbounded Tokio channel.
///
/// Dropping the receiver only stops observation; the run itself keeps going.
#[derive(Debug, Clone)]
pub struct ChannelLogSink {
    sender: UnboundedSender<LogEntry>,
}

impl ChannelLogSink {
    /// Creates a sink and the receiver that observes it.
    pub fn channel() -> (Self, UnboundedReceiver<LogEntry>) {
        let (sender, receiver) = unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl LogSink for ChannelLogSink {
    fn emit(&self, entry: LogEntry) {
        let _ = self.sender.send(entry);
    }
}

/// Buffers entries in memory; handy for tests and post-run inspection.
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything emitted so far, in arrival order.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().expect("log sink lock poisoned").clone()
    }

    /// Entries of one severity, in arrival order.
    pub fn with_severity(&self, severity: LogSeverity) -> Vec<LogEntry> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.severity == severity)
            .collect()
    }

    /// Entries attributed to one branch, in emission order.
    pub fn for_branch(&self, branch: usize) -> Vec<LogEntry> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.branch == Some(branch))
            .collect()
    }
}

impl LogSink for MemoryLogSink {
    fn emit(&self, entry: LogEntry) {
        self.entries.lock().expect("log sink lock poisoned").push(entry);
    }
}

/// Writes entries for one branch, prefixing the text with its 1-based label.
pub(crate) struct BranchLogger<'a> {
    sink: &'a dyn LogSink,
    branch: usize,
}

impl<'a> BranchLogger<'a> {
    pub(crate) fn new(sink: &'a dyn LogSink, branch: usize) -> Self {
        Self { sink, branch }
    }

    pub(crate) fn emit(&self, severity: LogSeverity, text: impl AsRef<str>) {
        let text = format!("[Branch {}] {}", self.branch + 1, text.as_ref());
        self.sink.emit(LogEntry::for_branch(self.branch, severity, text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_act_as_sinks() {
        let seen = Mutex::new(Vec::new());
        let sink = |entry: LogEntry| seen.lock().unwrap().push(entry.text);
        sink.emit(LogEntry::new(LogSeverity::Info, "hello"));
        assert_eq!(*seen.lock().unwrap(), vec!["hello".to_string()]);
    }

    #[test]
    fn channel_sink_survives_dropped_receiver() {
        let (sink, receiver) = ChannelLogSink::channel();
        drop(receiver);
        sink.emit(LogEntry::new(LogSeverity::Info, "nobody listens"));
    }

    #[test]
    fn branch_logger_labels_entries() {
        let sink = MemoryLogSink::new();
        BranchLogger::new(&sink, 2).emit(LogSeverity::Success, "SUCCESS: done");

        let entries = sink.for_branch(2);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].text, "[Branch 3] SUCCESS: done");
        assert_eq!(entries[0].severity, LogSeverity::Success);
    }
}
