// src/core/types.rs — Core domain types

use serde::{Deserialize, Serialize};

use crate::provider::TokenUsage;

/// Which collaboration workflow is running. Selects the prompt templates;
/// the iteration loop itself is identical for all kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowKind {
    Develop,
    Review,
    Plan,
    Docs,
}

impl std::fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Develop => write!(f, "develop"),
            Self::Review => write!(f, "review"),
            Self::Plan => write!(f, "plan"),
            Self::Docs => write!(f, "docs"),
        }
    }
}

/// The PM's decision on a submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub approved: bool,
    pub feedback: String,
}

const APPROVE_MARKER: &str = "[APPROVED]";
const REVISE_MARKER: &str = "[REVISE]";

impl Verdict {
    /// Parse the PM response. The review protocol asks for an `[APPROVED]`
    /// or `[REVISE]` marker (case-insensitive); the remaining text becomes
    /// the feedback. A response carrying neither marker is treated as a
    /// rejection with empty feedback so the loop can continue; the anomaly
    /// is logged rather than crashing the run.
    pub fn parse(response: &str) -> Self {
        if let Some(pos) = find_marker(response, APPROVE_MARKER) {
            return Self {
                approved: true,
                feedback: strip_marker(response, pos, APPROVE_MARKER.len()),
            };
        }
        if let Some(pos) = find_marker(response, REVISE_MARKER) {
            return Self {
                approved: false,
                feedback: strip_marker(response, pos, REVISE_MARKER.len()),
            };
        }
        tracing::warn!("PM response carried no [APPROVED]/[REVISE] marker; treating as rejection");
        Self {
            approved: false,
            feedback: String::new(),
        }
    }
}

// The markers are ASCII, so a bytewise case-insensitive scan is safe and
// the match boundaries are always char boundaries.
fn find_marker(response: &str, marker: &str) -> Option<usize> {
    response
        .as_bytes()
        .windows(marker.len())
        .position(|w| w.eq_ignore_ascii_case(marker.as_bytes()))
}

fn strip_marker(response: &str, pos: usize, marker_len: usize) -> String {
    let mut text = String::with_capacity(response.len() - marker_len);
    text.push_str(&response[..pos]);
    text.push_str(&response[pos + marker_len..]);
    text.trim().to_string()
}

/// One completed developer/PM exchange. Appended to the run history and
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationRecord {
    /// 1-based iteration ordinal.
    pub index: u32,
    pub submission: String,
    pub verdict: Verdict,
    /// Combined token usage of the developer and PM calls this iteration.
    pub usage: TokenUsage,
    /// Estimated cost delta for this iteration in USD.
    pub cost_usd: f64,
}

/// Why the collaboration loop terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Approved,
    MaxIterations,
    MaxTokens,
    MaxCost,
    NoProgress,
    UserStopped,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approved => write!(f, "approved"),
            Self::MaxIterations => write!(f, "max_iterations"),
            Self::MaxTokens => write!(f, "max_tokens"),
            Self::MaxCost => write!(f, "max_cost"),
            Self::NoProgress => write!(f, "no_progress"),
            Self::UserStopped => write!(f, "user_stopped"),
        }
    }
}

/// Final result of a run. Created once at loop exit.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub output: String,
    pub success: bool,
    pub iterations: u32,
    pub total_tokens: u64,
    pub total_cost_usd: f64,
    pub stop_reason: StopReason,
    pub history: Vec<IterationRecord>,
}

/// Real-time lifecycle events emitted by the loop for display layers.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    IterationStart {
        iteration: u32,
        max_iterations: u32,
    },
    Verdict {
        iteration: u32,
        approved: bool,
        cost_so_far: f64,
    },
    Stalled {
        iteration: u32,
        similarity: f64,
        count: u32,
    },
    Checkpoint {
        iteration: u32,
    },
    Complete {
        iterations: u32,
        total_tokens: u64,
        cost: f64,
        stop_reason: StopReason,
    },
}
