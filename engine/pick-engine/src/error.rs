//! Error types for PickEngine

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a candidate pick is refused.
///
/// Messages are surfaced to players verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("League not found or its game mode does not accept picks")]
    UnsupportedLeague,

    #[error("Invalid team id '{raw}'")]
    MalformedTeamId { raw: String },

    #[error("Must select exactly two teams")]
    WrongTeamCount { selected: usize },

    #[error("Must select two different teams (unless BYE)")]
    DuplicateTeam,

    #[error("Can't select one team and BYE")]
    MixedBye,

    #[error("Team {team_id} is not a recognized team")]
    UnknownTeam { team_id: i64 },

    #[error(
        "Team {short_name} does not appear to have a game this week! If this is incorrect, please contact your league commissioner to make your pick."
    )]
    NoGameThisWeek { short_name: String },

    #[error("Can't select two teams playing each other (except in week {final_week}).")]
    SameGame { final_week: u32 },

    #[error(
        "At least one selected game appears to have already started! If this is incorrect, please contact your league commissioner to make your pick."
    )]
    GameStarted,

    #[error("You have already used all byes this season!")]
    ByeLimitReached { limit: u32 },

    #[error(
        "You have already picked at least one of these teams! If this is incorrect, please contact your league commissioner to make your pick."
    )]
    TeamAlreadyPicked,

    #[error(
        "At least one team from your PREVIOUS submission has already started their game. If this is incorrect, please contact your league commissioner to make your pick."
    )]
    PreviousPickLocked,
}

/// Failures reported by season providers and pick sinks
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error("Lookup failed: {0}")]
    Lookup(String),

    #[error("Storage failure: {0}")]
    Storage(String),
}

impl ProviderError {
    /// Create a new lookup error
    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::Lookup(msg.into())
    }

    /// Create a new storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}

/// Errors produced by the engine
#[derive(Error, Debug)]
pub enum PickEngineError {
    #[error("Pick rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl From<ProviderError> for PickEngineError {
    fn from(err: ProviderError) -> Self {
        PickEngineError::Storage { message: err.to_string() }
    }
}

impl PickEngineError {
    /// Response code this error maps to
    pub fn error_code(&self) -> ErrorCode {
        match self {
            PickEngineError::Rejected(_) => ErrorCode::InvalidInput,
            PickEngineError::Storage { .. } | PickEngineError::InvalidConfig { .. } => {
                ErrorCode::Unknown
            }
        }
    }
}

/// Error codes carried in the submitPick response envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "ERR_UNKNOWN")]
    Unknown,
    #[serde(rename = "ERR_INVALID_INPUT")]
    InvalidInput,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Unknown => "ERR_UNKNOWN",
            ErrorCode::InvalidInput => "ERR_INVALID_INPUT",
        }
    }
}
