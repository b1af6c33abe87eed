use std::fmt;

use chrono::{DateTime, Local};
use courier_core::{CanonicalAddress, Contact};

/// Final classification of one contact's dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Sent,
    /// Surface confirmed the address is unreachable; skipped, no retry.
    InvalidAddress,
    /// Neither search nor direct navigation resolved a conversation.
    ConversationUnreachable,
    /// The composer never became writable within its timeout.
    ComposerNotFound,
    /// Retries exhausted without a delivery confirmation.
    SendNotConfirmed,
    /// The raw address contained no digits; no surface interaction happened.
    NormalizationFailed,
    /// Unclassified surface fault; aborted this contact only.
    SurfaceFault,
}

impl Outcome {
    pub fn is_sent(self) -> bool {
        self == Outcome::Sent
    }

    /// Stable token used in report rows.
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Sent => "SENT",
            Outcome::InvalidAddress => "INVALID_ADDRESS",
            Outcome::ConversationUnreachable => "CONVERSATION_UNREACHABLE",
            Outcome::ComposerNotFound => "COMPOSER_NOT_FOUND",
            Outcome::SendNotConfirmed => "SEND_NOT_CONFIRMED",
            Outcome::NormalizationFailed => "NORMALIZATION_FAILED",
            Outcome::SurfaceFault => "SURFACE_FAULT",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One report row; appended to the report stream as soon as it is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeRecord {
    /// Canonical address when normalization succeeded, raw input otherwise.
    pub address: String,
    pub name: String,
    pub outcome: Outcome,
    pub detail: String,
    pub timestamp: DateTime<Local>,
}

/// Per-contact unit of work. `resolved_text` is computed once and reused
/// across retries so message identity is preserved between attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageJob {
    pub contact: Contact,
    pub address: CanonicalAddress,
    pub resolved_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub processed: usize,
    pub total: usize,
    pub status: String,
}

/// Totals for one run, reported with the final event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    pub stopped_early: bool,
}

/// Events emitted by the worker towards the control plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Log(String),
    Progress(ProgressUpdate),
    ContactCompleted { index: usize, record: OutcomeRecord },
    Finished { summary: RunSummary },
}
