//! Scoring session controller.
//!
//! Owns the draft and the ledger for one judge and drives them through
//! round selection, team selection and submission. All state sits behind a
//! single mutex that is never held across an `.await`, so every method takes
//! `&self` and concurrent calls on one session are serialized.

pub mod state;

use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub use state::{LedgerStatus, SessionState, SubmitReceipt, TeamBoard, TeamStatus};
use state::LoadOutcome;

use crate::api::{ScorePayload, ScoreValue, ScoringBackend};
use crate::credentials::AuthContext;
use crate::draft::{ScoreDraft, ValidatedScores};
use crate::error::{SessionError, SessionResult};
use crate::ledger::SubmissionLedger;
use crate::rubric::{Criterion, Round, RubricRegistry};

/// How long a submit waits for a pending ledger load before giving up
pub const DEFAULT_LEDGER_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ScoringSession {
    backend: Arc<dyn ScoringBackend>,
    registry: Arc<RubricRegistry>,
    inner: Mutex<SessionInner>,
    ledger_timeout: Duration,
}

struct SessionInner {
    auth: AuthContext,
    state: SessionState,
    draft: ScoreDraft,
    ledger: SubmissionLedger,
    /// Set while the ledger load for the current round is outstanding
    ledger_rx: Option<watch::Receiver<LoadOutcome>>,
    ledger_error: Option<SessionError>,
    /// Bumped on every round change; stale async results compare against it
    generation: u64,
    submitting: bool,
    revoked: bool,
}

impl SessionInner {
    /// Merge a finished ledger load, if there is one.
    fn sync_ledger(&mut self) {
        let outcome = match &self.ledger_rx {
            Some(rx) => rx.borrow().clone(),
            None => return,
        };
        let Some(round) = self.draft.round() else {
            return;
        };

        match outcome {
            LoadOutcome::Pending => return,
            LoadOutcome::Loaded(records) => {
                self.ledger.load(round, &records);
                self.ledger_error = None;
                debug!(round = %round, scored = self.ledger.len(), "ledger loaded");
            }
            LoadOutcome::Failed(e) => {
                if e.is_terminal() {
                    self.revoke();
                }
                self.ledger_error = Some(e);
            }
        }
        self.ledger_rx = None;
    }

    fn revoke(&mut self) {
        self.revoked = true;
        self.state = SessionState::Failed(SessionError::AccessDenied);
    }

    fn ensure_authorized(&self) -> SessionResult<()> {
        if self.revoked {
            Err(SessionError::AccessDenied)
        } else {
            Ok(())
        }
    }
}

fn lock(inner: &Mutex<SessionInner>) -> MutexGuard<'_, SessionInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the in-flight flag however the submit ends, including when its
/// future is dropped.
struct InFlight<'a> {
    inner: &'a Mutex<SessionInner>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        lock(self.inner).submitting = false;
    }
}

/// Everything a submit needs once the local checks passed.
struct PreparedSubmit {
    generation: u64,
    auth: AuthContext,
    team_id: String,
    scores: ValidatedScores,
}

impl ScoringSession {
    pub fn new(backend: Arc<dyn ScoringBackend>, registry: Arc<RubricRegistry>, auth: AuthContext) -> Self {
        Self {
            backend,
            inner: Mutex::new(SessionInner {
                auth,
                state: SessionState::Idle,
                draft: ScoreDraft::new(Arc::clone(&registry)),
                ledger: SubmissionLedger::new(),
                ledger_rx: None,
                ledger_error: None,
                generation: 0,
                submitting: false,
                revoked: false,
            }),
            registry,
            ledger_timeout: DEFAULT_LEDGER_TIMEOUT,
        }
    }

    pub fn with_ledger_timeout(mut self, timeout: Duration) -> Self {
        self.ledger_timeout = timeout;
        self
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        lock(&self.inner)
    }

    /// Switch to `round`: fresh draft, no team, and a background reload of
    /// the ledger. Outside a tokio runtime the load cannot start, so the
    /// session is left unchanged and `LedgerUnavailable` is returned.
    pub fn select_round(&self, round: Round) -> SessionResult<()> {
        let mut inner = self.lock();
        inner.ensure_authorized()?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| SessionError::LedgerUnavailable(format!("cannot load submission history: {}", e)))?;
        inner.draft.set_round(round)?;

        inner.generation += 1;
        inner.ledger.reset(round);
        inner.ledger_error = None;
        inner.state = SessionState::RoundSelected;

        let (tx, rx) = watch::channel(LoadOutcome::Pending);
        let backend = Arc::clone(&self.backend);
        let auth = inner.auth.clone();
        runtime.spawn(async move {
            let outcome = match backend.submitted_rounds(&auth).await {
                Ok(records) => LoadOutcome::Loaded(records),
                Err(e) => {
                    warn!(round = %round, error = %e, "could not load submitted rounds");
                    LoadOutcome::Failed(e)
                }
            };
            // Nobody listening means the round changed again
            let _ = tx.send(outcome);
        });
        inner.ledger_rx = Some(rx);

        debug!(round = %round, generation = inner.generation, "round selected");
        Ok(())
    }

    /// Pick the team to score. Already-scored teams are accepted here and
    /// rejected at submit.
    pub fn select_team(&self, team_id: &str) -> SessionResult<()> {
        let team_id = team_id.trim();
        let mut inner = self.lock();
        inner.ensure_authorized()?;
        if inner.draft.round().is_none() {
            return Err(SessionError::NoRoundSelected);
        }
        if team_id.is_empty() {
            return Err(SessionError::NoTeamSelected);
        }

        inner.draft.set_team(team_id);
        inner.state = SessionState::TeamSelected;
        debug!(team = team_id, "team selected");
        Ok(())
    }

    /// Record what the judge typed for a criterion (key or name).
    pub fn set_value(&self, ident: &str, raw: &str) -> SessionResult<()> {
        let mut inner = self.lock();
        inner.ensure_authorized()?;
        if inner.draft.round().is_none() {
            return Err(SessionError::NoRoundSelected);
        }

        // Editing after Submitted or Failed keeps the state for display
        inner.draft.set_criterion_value(ident, raw);
        Ok(())
    }

    /// Validate the draft and send it.
    ///
    /// Local checks run in order: in-flight submit, team selected, ledger
    /// duplicate, field validation. Only then is the server contacted. On
    /// success the team joins the ledger and the draft is cleared; on failure
    /// the draft is left exactly as it was.
    pub async fn submit(&self) -> SessionResult<SubmitReceipt> {
        {
            let mut inner = self.lock();
            inner.ensure_authorized()?;
            if inner.submitting {
                return Err(SessionError::SubmissionInProgress);
            }
            inner.submitting = true;
        }
        let _in_flight = InFlight { inner: &self.inner };

        let prepared = self.prepare_submit().await?;
        let round = prepared.scores.round;
        let payload = ScorePayload {
            team_id: prepared.team_id.clone(),
            round,
            scores: prepared
                .scores
                .values
                .iter()
                .map(|(k, v)| (k.clone(), ScoreValue(*v)))
                .collect::<BTreeMap<_, _>>(),
        };

        debug!(team = %prepared.team_id, round = %round, "submitting scores");
        let result = self.backend.submit_score(&prepared.auth, &payload).await;

        let mut inner = self.lock();
        let current = inner.generation == prepared.generation;
        match result {
            Ok(()) => {
                // Recorded even if the same round was re-selected meanwhile
                if inner.ledger.round() == Some(round) {
                    inner.ledger.record(&prepared.team_id);
                }
                if current {
                    if inner.draft.team() == Some(prepared.team_id.as_str()) {
                        inner.draft.clear_values();
                    }
                    inner.state = SessionState::Submitted;
                }
                info!(team = %prepared.team_id, round = %round, "scores submitted");
                Ok(SubmitReceipt {
                    team_id: prepared.team_id,
                    round,
                    out_of_range: prepared.scores.out_of_range().to_vec(),
                    scores: prepared.scores.values,
                    submitted_at: Utc::now(),
                })
            }
            Err(e) => {
                warn!(team = %prepared.team_id, round = %round, error = %e, "submit failed");
                if e.is_terminal() {
                    inner.revoke();
                } else if current {
                    inner.state = SessionState::Failed(e.clone());
                }
                Err(e)
            }
        }
    }

    /// Run the local checks, waiting for a pending ledger load first.
    /// Starts over if the round changes while waiting.
    async fn prepare_submit(&self) -> SessionResult<PreparedSubmit> {
        loop {
            let (generation, pending) = {
                let mut inner = self.lock();
                if inner.draft.team().is_none() {
                    return Err(SessionError::NoTeamSelected);
                }
                inner.sync_ledger();
                (inner.generation, inner.ledger_rx.clone())
            };

            if let Some(rx) = pending {
                self.wait_for_ledger(rx).await?;
            }

            let mut inner = self.lock();
            if inner.generation != generation {
                continue;
            }
            inner.sync_ledger();
            inner.ensure_authorized()?;

            let round = inner.draft.round().ok_or(SessionError::NoRoundSelected)?;
            let team_id = inner
                .draft
                .team()
                .map(str::to_string)
                .ok_or(SessionError::NoTeamSelected)?;

            if inner.ledger.has(&team_id) {
                debug!(team = %team_id, round = %round, "duplicate submission blocked");
                return Err(SessionError::DuplicateSubmission { team_id, round });
            }

            inner.state = SessionState::Validating;
            let scores = match inner.draft.validate() {
                Ok(scores) => scores,
                Err(e) => {
                    inner.state = SessionState::TeamSelected;
                    return Err(e);
                }
            };
            inner.state = SessionState::Submitting;

            return Ok(PreparedSubmit {
                generation,
                auth: inner.auth.clone(),
                team_id,
                scores,
            });
        }
    }

    async fn wait_for_ledger(&self, mut rx: watch::Receiver<LoadOutcome>) -> SessionResult<()> {
        let waited = tokio::time::timeout(self.ledger_timeout, rx.wait_for(|o| !o.is_pending()))
            .await
            .map(|r| r.map(|_| ()));

        match waited {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(SessionError::LedgerUnavailable(
                "submission history load was abandoned".to_string(),
            )),
            Err(_) => Err(SessionError::LedgerUnavailable(format!(
                "timed out after {} waiting for submission history",
                humantime::format_duration(self.ledger_timeout)
            ))),
        }
    }

    /// Team directory for the active round with already-scored teams marked.
    pub async fn team_board(&self) -> SessionResult<TeamBoard> {
        let (auth, pending) = {
            let mut inner = self.lock();
            inner.ensure_authorized()?;
            if inner.draft.round().is_none() {
                return Err(SessionError::NoRoundSelected);
            }
            inner.sync_ledger();
            (inner.auth.clone(), inner.ledger_rx.clone())
        };

        let teams = match self.backend.list_teams(&auth).await {
            Ok(teams) => teams,
            Err(e) => {
                if e.is_terminal() {
                    self.lock().revoke();
                }
                return Err(e);
            }
        };

        // The board is advisory; a slow ledger just leaves it incomplete.
        if let Some(rx) = pending {
            if let Err(e) = self.wait_for_ledger(rx).await {
                debug!(error = %e, "showing team board without submission history");
            }
        }

        let mut inner = self.lock();
        inner.sync_ledger();
        inner.ensure_authorized()?;
        let round = inner.draft.round().ok_or(SessionError::NoRoundSelected)?;

        let remaining = inner.ledger.remaining_count(teams.len());
        let teams = teams
            .into_iter()
            .map(|team| TeamStatus {
                scored: inner.ledger.has(&team.team_id),
                team,
            })
            .collect();

        Ok(TeamBoard {
            round,
            teams,
            remaining,
            ledger_complete: inner.ledger.is_complete(),
        })
    }

    /// Replace the token after the judge logged in again. Starts over from `Idle`.
    pub fn reauthenticate(&self, auth: AuthContext) {
        let mut inner = self.lock();
        inner.auth = auth;
        inner.revoked = false;
        inner.generation += 1;
        inner.ledger = SubmissionLedger::new();
        inner.ledger_rx = None;
        inner.ledger_error = None;
        inner.draft = ScoreDraft::new(Arc::clone(&self.registry));
        inner.state = SessionState::Idle;
    }

    pub fn state(&self) -> SessionState {
        self.lock().state.clone()
    }

    pub fn round(&self) -> Option<Round> {
        self.lock().draft.round()
    }

    /// Snapshot of the current draft
    pub fn draft(&self) -> ScoreDraft {
        self.lock().draft.clone()
    }

    pub fn registry(&self) -> &RubricRegistry {
        &self.registry
    }

    pub fn criteria(&self) -> Vec<Criterion> {
        self.lock().draft.criteria().to_vec()
    }

    /// Whether `team_id` is known to be scored in the active round
    pub fn is_scored(&self, team_id: &str) -> bool {
        let mut inner = self.lock();
        inner.sync_ledger();
        inner.ledger.has(team_id)
    }

    pub fn ledger_status(&self) -> LedgerStatus {
        let mut inner = self.lock();
        inner.sync_ledger();
        if inner.draft.round().is_none() {
            LedgerStatus::Idle
        } else if inner.ledger_rx.is_some() {
            LedgerStatus::Pending
        } else if let Some(error) = inner.ledger_error.clone() {
            LedgerStatus::Unavailable {
                error,
                scored: inner.ledger.len(),
            }
        } else {
            LedgerStatus::Ready {
                scored: inner.ledger.len(),
            }
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.lock().submitting
    }
}
