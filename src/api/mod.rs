pub mod client;
pub mod types;

use async_trait::async_trait;

pub use client::{JudgingClient, DEFAULT_BASE_URL};
pub use types::{JudgeCredentials, LeaderboardEntry, LoginResponse, ScorePayload, ScoreValue, SubmissionRecord, Team};

use crate::credentials::AuthContext;
use crate::error::SessionResult;

/// The judging backend as seen by a scoring session.
///
/// Implemented over HTTP by [`JudgingClient`]. Every authenticated call
/// fails with `AccessDenied` when `auth` carries no token.
#[async_trait]
pub trait ScoringBackend: Send + Sync {
    /// `GET /api/teams`
    async fn list_teams(&self, auth: &AuthContext) -> SessionResult<Vec<Team>>;

    /// `GET /api/scores/submitted-rounds`, across all rounds
    async fn submitted_rounds(&self, auth: &AuthContext) -> SessionResult<Vec<SubmissionRecord>>;

    /// `POST /api/scores/submit-score`
    async fn submit_score(&self, auth: &AuthContext, payload: &ScorePayload) -> SessionResult<()>;

    /// `GET /api/scores/leaderboard`, already sorted by the server
    async fn leaderboard(&self) -> SessionResult<Vec<LeaderboardEntry>>;
}
