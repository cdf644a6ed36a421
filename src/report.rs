//! Serialized session summaries.
//!
//! Reports are write-only debugging artifacts, not persistence: call logs
//! never survive a process, and nothing reads a report back at runtime.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::CallEntry;
use crate::session::ShimSession;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub generated_at: DateTime<Utc>,
    /// The entry point, as `Type.name(params) -> ret`.
    pub entry: String,
    pub records: Vec<RecordReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordReport {
    pub member: String,
    pub pass_through: bool,
    pub call_count: usize,
    pub calls: Vec<CallEntry>,
}

impl SessionReport {
    pub(crate) fn new(session: &ShimSession) -> Self {
        Self {
            generated_at: Utc::now(),
            entry: session.entry_descriptor().signature(),
            records: session
                .records()
                .iter()
                .map(|record| RecordReport {
                    member: record.descriptor().signature(),
                    pass_through: record.pass_through(),
                    call_count: record.call_count(),
                    calls: record.calls(),
                })
                .collect(),
        }
    }
}
