use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{SessionError, SessionResult};
use crate::rubric::{Criterion, Round, RubricRegistry};

/// Scores a judge is entering for one team in one round.
///
/// Values are kept exactly as typed so they can be shown again after a
/// failed submit. Numeric parsing happens only in [`validate`](Self::validate).
#[derive(Debug, Clone)]
pub struct ScoreDraft {
    registry: Arc<RubricRegistry>,
    round: Option<Round>,
    team: Option<String>,
    values: HashMap<String, String>,
}

/// Output of a successful [`ScoreDraft::validate`], in rubric order.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedScores {
    pub round: Round,
    pub values: Vec<(String, f64)>,
    out_of_range: Vec<String>,
}

impl ValidatedScores {
    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
    }

    /// Keys whose value lies outside the rubric's bounds.
    ///
    /// Bounds are advisory: these values are still submitted and the server
    /// decides whether to accept them.
    pub fn out_of_range(&self) -> &[String] {
        &self.out_of_range
    }
}

impl ScoreDraft {
    pub fn new(registry: Arc<RubricRegistry>) -> Self {
        Self {
            registry,
            round: None,
            team: None,
            values: HashMap::new(),
        }
    }

    /// Switch to `round`, discarding every value and the selected team.
    /// On `UnknownRound` the draft is left untouched.
    pub fn set_round(&mut self, round: Round) -> SessionResult<()> {
        self.registry.criteria_for(round)?;
        self.round = Some(round);
        self.team = None;
        self.values.clear();
        Ok(())
    }

    pub fn set_team(&mut self, team_id: impl Into<String>) {
        self.team = Some(team_id.into());
    }

    /// Store `raw` for the criterion named by `ident` (key or name).
    ///
    /// Identifiers outside the active rubric are stored verbatim; they are
    /// never validated or submitted.
    pub fn set_criterion_value(&mut self, ident: &str, raw: impl Into<String>) {
        let key = self
            .criteria()
            .iter()
            .find(|c| c.matches(ident))
            .map(|c| c.key.clone())
            .unwrap_or_else(|| ident.to_string());
        self.values.insert(key, raw.into());
    }

    /// Drop the values and team but keep the round (used after a submit).
    pub fn clear_values(&mut self) {
        self.team = None;
        self.values.clear();
    }

    pub fn round(&self) -> Option<Round> {
        self.round
    }

    pub fn team(&self) -> Option<&str> {
        self.team.as_deref()
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.team.is_none() && self.values.is_empty()
    }

    /// Criteria of the active round, or an empty slice before a round is set.
    pub fn criteria(&self) -> &[Criterion] {
        match self.round {
            Some(round) => self.registry.criteria_for(round).unwrap_or(&[]),
            None => &[],
        }
    }

    /// Check every criterion of the active round.
    ///
    /// All blank criteria are reported together as `MissingFields`; only when
    /// none are blank are values parsed, and every unparseable one is
    /// reported as `InvalidNumber`.
    pub fn validate(&self) -> SessionResult<ValidatedScores> {
        let round = self.round.ok_or(SessionError::NoRoundSelected)?;
        let criteria = self.registry.criteria_for(round)?;

        let missing: Vec<String> = criteria
            .iter()
            .filter(|c| {
                self.values
                    .get(&c.key)
                    .map_or(true, |raw| raw.trim().is_empty())
            })
            .map(|c| c.key.clone())
            .collect();
        if !missing.is_empty() {
            return Err(SessionError::MissingFields(missing));
        }

        let mut values = Vec::with_capacity(criteria.len());
        let mut invalid = Vec::new();
        let mut out_of_range = Vec::new();
        for c in criteria {
            let raw = self.values.get(&c.key).map(String::as_str).unwrap_or_default();
            match parse_score(raw) {
                Some(v) => {
                    if !c.in_range(v) {
                        out_of_range.push(c.key.clone());
                    }
                    values.push((c.key.clone(), v));
                }
                None => invalid.push(c.key.clone()),
            }
        }
        if !invalid.is_empty() {
            return Err(SessionError::InvalidNumber(invalid));
        }

        Ok(ValidatedScores {
            round,
            values,
            out_of_range,
        })
    }
}

/// Parse a typed score. Surrounding whitespace is ignored; NaN and
/// infinities are rejected. Blank input counts as missing rather than zero
/// and `Infinity` is never a valid score.
fn parse_score(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
