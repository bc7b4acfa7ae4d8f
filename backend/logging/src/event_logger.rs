//! Analysis Event Logger
//!
//! One structured record per checkpoint of an analysis invocation, written
//! through `tracing` on the `analysis_events` target.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalysisEvent {
    RequestReceived {
        text_len: usize,
        attachments: usize,
    },
    ImageResolved {
        origin: String,
        bytes: usize,
        media_path: String,
    },
    RemoteCallIssued {
        mode: String,
        encoded_len: usize,
    },
    RemoteCallCompleted {
        is_ai_generated: f64,
        status: String,
    },
    RemoteCallFailed {
        kind: String,
        error_msg: String,
    },
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub invocation_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: AnalysisEvent,
}

pub struct EventLogger;

impl EventLogger {
    /// Redacts and logs one checkpoint event, returning the entry that was written.
    pub fn log_event(invocation_id: &str, mut event: AnalysisEvent) -> EventLogEntry {
        if let AnalysisEvent::RemoteCallFailed { error_msg, .. } = &mut event {
            *error_msg = redact_sensitive_data(error_msg);
        }

        let entry = EventLogEntry {
            invocation_id: invocation_id.into(),
            timestamp: Utc::now(),
            event,
        };

        let json = serde_json::to_string(&entry).unwrap_or_default();
        info!(target: "analysis_events", invocation_id, event = %json, "Analysis checkpoint");
        entry
    }
}
