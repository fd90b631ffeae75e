use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::api::SubmissionRecord;
use crate::rubric::Round;

/// Teams this judge has already scored in one round.
///
/// A cache of the server's record: seeded by [`load`](Self::load), grown by
/// [`record`](Self::record) after each confirmed submit, never shrunk.
#[derive(Debug, Clone, Default)]
pub struct SubmissionLedger {
    round: Option<Round>,
    teams: HashSet<String>,
    loaded_at: Option<DateTime<Utc>>,
}

impl SubmissionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh, not-yet-loaded ledger for `round`.
    pub fn reset(&mut self, round: Round) {
        self.round = Some(round);
        self.teams.clear();
        self.loaded_at = None;
    }

    /// Seed from the server's submissions across all rounds, keeping only
    /// those for `round`. Entries recorded locally for the same round
    /// survive the load.
    pub fn load(&mut self, round: Round, records: &[SubmissionRecord]) {
        if self.round != Some(round) {
            self.reset(round);
        }
        self.teams.extend(
            records
                .iter()
                .filter(|r| r.round == round)
                .map(|r| r.team_id.clone()),
        );
        self.loaded_at = Some(Utc::now());
    }

    pub fn has(&self, team_id: &str) -> bool {
        self.teams.contains(team_id)
    }

    /// Add `team_id` after a confirmed submit. Returns false if it was already present.
    pub fn record(&mut self, team_id: &str) -> bool {
        self.teams.insert(team_id.to_string())
    }

    pub fn remaining_count(&self, total_teams: usize) -> usize {
        total_teams.saturating_sub(self.teams.len())
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn round(&self) -> Option<Round> {
        self.round
    }

    /// When the server state was last merged in; `None` if it never was.
    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    /// Whether the set reflects the server. A ledger whose load failed only
    /// knows about local submits and must not claim completeness.
    pub fn is_complete(&self) -> bool {
        self.loaded_at.is_some()
    }
}
