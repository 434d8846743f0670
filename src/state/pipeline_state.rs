/// Pipeline state definitions for tracking a run
///
/// A run walks `Idle → Fetching → Normalizing → Aggregating` once per page
/// and ends in `Completed` or `Failed`.
use std::fmt;

/// Represents the current phase of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    // ===== Initial State =====
    /// Constructed, not yet started
    Idle,

    // ===== Active States =====
    /// Waiting for the next page in order
    Fetching,

    /// Turning a delivered page's entries into records
    Normalizing,

    /// Feeding records into the deduplicating aggregator
    Aggregating,

    // ===== Terminal States =====
    /// Target reached or upstream ran out of pages
    Completed,

    /// A fatal error ended the run; no records were produced
    Failed,
}

impl PipelineState {
    /// Returns true if the run has ended
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true while the run is in progress
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Fetching | Self::Normalizing | Self::Aggregating)
    }

    /// Checks whether moving from `self` to `next` is allowed
    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Idle, Fetching)
                | (Idle, Completed)
                | (Fetching, Normalizing)
                | (Normalizing, Aggregating)
                | (Aggregating, Fetching)
                | (Aggregating, Completed)
                | (Fetching, Completed)
                | (Fetching, Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Normalizing => "normalizing",
            Self::Aggregating => "aggregating",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
