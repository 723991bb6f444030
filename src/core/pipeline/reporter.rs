use std::sync::Mutex;

use tracing::info;

/// Front-end collaborator receiving launch progress.
///
/// The core never formats UI; it only hands over log lines, a short status
/// and a 0..=100 progress value.
pub trait LaunchReporter: Send + Sync {
    fn log(&self, message: &str);
    fn status(&self, status: &str);
    fn progress(&self, value: u8);
}

/// Reporter that writes everything to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl LaunchReporter for TracingReporter {
    fn log(&self, message: &str) {
        info!(target: "catclient::launch", "{}", message);
    }

    fn status(&self, status: &str) {
        info!(target: "catclient::launch", "[status] {}", status);
    }

    fn progress(&self, value: u8) {
        info!(target: "catclient::launch", "[progress] {}%", value);
    }
}

/// Everything a [`RecordingReporter`] has seen, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    Log(String),
    Status(String),
    Progress(u8),
}

/// Reporter that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<ReportEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ReportEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn logs(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ReportEvent::Log(line) => Some(line),
                _ => None,
            })
            .collect()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ReportEvent::Status(status) => Some(status),
                _ => None,
            })
            .collect()
    }

    pub fn progress_values(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ReportEvent::Progress(value) => Some(value),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ReportEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

impl LaunchReporter for RecordingReporter {
    fn log(&self, message: &str) {
        self.push(ReportEvent::Log(message.to_string()));
    }

    fn status(&self, status: &str) {
        self.push(ReportEvent::Status(status.to_string()));
    }

    fn progress(&self, value: u8) {
        self.push(ReportEvent::Progress(value.min(100)));
    }
}
