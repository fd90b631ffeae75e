use thiserror::Error;

use crate::rubric::Round;

/// Generic message shown when the server rejects a submit without saying why.
pub const GENERIC_SUBMIT_FAILURE: &str = "Failed to submit scores. Please try again.";

/// Everything that can go wrong while a judge is scoring.
///
/// Validation variants are resolved locally and never discard draft data.
/// Network variants carry a user-facing message and allow a manual retry.
/// `AccessDenied` ends the session until the judge logs in again.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("round {0} is not configured")]
    UnknownRound(Round),

    #[error("select a round first")]
    NoRoundSelected,

    #[error("please enter all scores (missing: {})", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("all scores must be valid numbers (invalid: {})", .0.join(", "))]
    InvalidNumber(Vec<String>),

    #[error("please select a team")]
    NoTeamSelected,

    #[error("you have already submitted scores for team {team_id} in round {round}")]
    DuplicateSubmission { team_id: String, round: Round },

    #[error("a submission is already in progress")]
    SubmissionInProgress,

    #[error("could not load your previous submissions: {0}")]
    LedgerUnavailable(String),

    #[error("failed to fetch teams: {0}")]
    TeamDirectoryUnavailable(String),

    #[error("access denied: no valid token, please log in again")]
    AccessDenied,

    #[error("{0}")]
    SubmitRejected(String),

    #[error("network error: {0}")]
    NetworkFailure(String),

    #[error("failed to load leaderboard data: {0}")]
    LeaderboardUnavailable(String),

    #[error("{0}")]
    AuthFailed(String),
}

impl SessionError {
    /// True when the session cannot continue without re-authentication.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionError::AccessDenied)
    }

    /// True for input problems the judge can fix in place.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SessionError::MissingFields(_)
                | SessionError::InvalidNumber(_)
                | SessionError::NoTeamSelected
                | SessionError::DuplicateSubmission { .. }
                | SessionError::UnknownRound(_)
                | SessionError::NoRoundSelected
        )
    }

    /// Criterion keys the judge needs to revisit, if any.
    pub fn offending_keys(&self) -> &[String] {
        match self {
            SessionError::MissingFields(keys) | SessionError::InvalidNumber(keys) => keys,
            _ => &[],
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
