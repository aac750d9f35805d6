//! Progress observers.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

use crate::progress::event::ProgressEvent;

/// Receives `(percent, message)` reports from a run, in the order they are issued.
/// Implementations must return quickly: store or log, never wait on I/O.
pub trait ProgressSink: Send + Sync {
    fn report(&self, percent: u8, message: &str);
}

impl<T: ProgressSink + ?Sized> ProgressSink for Arc<T> {
    fn report(&self, percent: u8, message: &str) {
        (**self).report(percent, message)
    }
}

/// CLI sink: logs every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn report(&self, percent: u8, message: &str) {
        info!(progress = percent, "{}", message);
    }
}

/// Appends every report to an in-memory list.
#[derive(Debug, Default)]
pub struct ProgressLog {
    events: Mutex<Vec<ProgressEvent>>,
}

impl ProgressLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().clone()
    }

    pub fn percents(&self) -> Vec<u8> {
        self.events.lock().iter().map(|e| e.percent).collect()
    }

    pub fn last(&self) -> Option<ProgressEvent> {
        self.events.lock().last().cloned()
    }
}

impl ProgressSink for ProgressLog {
    fn report(&self, percent: u8, message: &str) {
        self.events.lock().push(ProgressEvent::now(percent, message));
    }
}

/// Forwards each report to several sinks.
pub struct FanOut {
    sinks: Vec<Arc<dyn ProgressSink>>,
}

impl FanOut {
    pub fn new(sinks: Vec<Arc<dyn ProgressSink>>) -> Self {
        Self { sinks }
    }
}

impl ProgressSink for FanOut {
    fn report(&self, percent: u8, message: &str) {
        for sink in &self.sinks {
            sink.report(percent, message);
        }
    }
}
