use chrono::{DateTime, Utc};

use crate::api::{SubmissionRecord, Team};
use crate::error::SessionError;
use crate::rubric::Round;

/// Where a scoring session is in its lifecycle.
///
/// ```text
/// Idle -> RoundSelected -> TeamSelected -> Validating -> Submitting -> Submitted
///                ^               ^             |              |
///                |               +-------------+              v
///                +----------------------------------------- Failed
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    RoundSelected,
    TeamSelected,
    Validating,
    Submitting,
    Submitted,
    Failed(SessionError),
}

impl SessionState {
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::RoundSelected => "round selected",
            SessionState::TeamSelected => "team selected",
            SessionState::Validating => "validating",
            SessionState::Submitting => "submitting",
            SessionState::Submitted => "submitted",
            SessionState::Failed(_) => "failed",
        }
    }
}

/// Published by the background ledger load of one round.
#[derive(Debug, Clone)]
pub(crate) enum LoadOutcome {
    Pending,
    Loaded(Vec<SubmissionRecord>),
    Failed(SessionError),
}

impl LoadOutcome {
    pub(crate) fn is_pending(&self) -> bool {
        matches!(self, LoadOutcome::Pending)
    }
}

/// What the session knows about the judge's previous submissions.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerStatus {
    /// No round selected yet
    Idle,
    Pending,
    Ready { scored: usize },
    /// Load failed; duplicate checks only know about this session's submits
    Unavailable { error: SessionError, scored: usize },
}

/// Receipt for an accepted submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitReceipt {
    pub team_id: String,
    pub round: Round,
    pub scores: Vec<(String, f64)>,
    /// Keys submitted with values outside the rubric bounds
    pub out_of_range: Vec<String>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamStatus {
    pub team: Team,
    pub scored: bool,
}

/// Team directory merged with the ledger, for picking the next team.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamBoard {
    pub round: Round,
    pub teams: Vec<TeamStatus>,
    pub remaining: usize,
    /// False when the ledger could not be loaded; `scored` flags then only
    /// reflect submits made in this session.
    pub ledger_complete: bool,
}

impl TeamBoard {
    pub fn scored_count(&self) -> usize {
        self.teams.iter().filter(|t| t.scored).count()
    }

    pub fn find(&self, team_id: &str) -> Option<&TeamStatus> {
        self.teams.iter().find(|t| t.team.team_id == team_id)
    }
}
