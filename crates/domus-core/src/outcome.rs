use std::fmt;

use serde::{Deserialize, Serialize};

/// Status the engine reports after writing both artifacts.
pub const STATUS_SUCCESS: i32 = 0;
/// The input graph has more vertices than the engine supports.
pub const STATUS_TOO_LARGE: i32 = -1;
/// The input graph is not connected.
pub const STATUS_DISCONNECTED: i32 = -2;
/// Any other engine failure.
pub const STATUS_UNKNOWN: i32 = -3;

/// Classified result of one engine invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    TooLarge,
    Disconnected,
    UnknownFailure,
}

impl Outcome {
    /// Map an engine status code to an outcome.
    ///
    /// Non-negative codes are success; negative codes outside the documented
    /// set are reported as [`Outcome::UnknownFailure`].
    pub fn from_status(status: i32) -> Self {
        match status {
            STATUS_TOO_LARGE => Outcome::TooLarge,
            STATUS_DISCONNECTED => Outcome::Disconnected,
            s if s >= STATUS_SUCCESS => Outcome::Success,
            _ => Outcome::UnknownFailure,
        }
    }

    /// Whether `status` is one of the codes the engine contract documents.
    pub fn is_documented_status(status: i32) -> bool {
        matches!(
            status,
            STATUS_SUCCESS | STATUS_TOO_LARGE | STATUS_DISCONNECTED | STATUS_UNKNOWN
        )
    }

    /// The canonical status code for this outcome.
    pub fn status(&self) -> i32 {
        match self {
            Outcome::Success => STATUS_SUCCESS,
            Outcome::TooLarge => STATUS_TOO_LARGE,
            Outcome::Disconnected => STATUS_DISCONNECTED,
            Outcome::UnknownFailure => STATUS_UNKNOWN,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    /// Message shown to the user for this outcome.
    pub fn message(&self) -> &'static str {
        match self {
            Outcome::Success => "Drawing computed.",
            Outcome::TooLarge => "Error: The graph is too large (more than 30 vertices).",
            Outcome::Disconnected => "Error: The graph is disconnected.",
            Outcome::UnknownFailure => "Error: An unexpected error occurred during computation.",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Outcome::Success => "success",
            Outcome::TooLarge => "too large",
            Outcome::Disconnected => "disconnected",
            Outcome::UnknownFailure => "unknown failure",
        };
        f.write_str(name)
    }
}
