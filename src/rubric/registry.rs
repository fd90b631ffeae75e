use std::collections::BTreeMap;

use super::config::{default_rubrics, Criterion, RubricConfig, Round};
use super::validation::validate_rubrics;
use crate::error::{SessionError, SessionResult};

/// Mapping from round to its ordered criteria.
///
/// The registry is the single source of truth for which fields exist in a
/// round. Front ends iterate [`criteria_for`](Self::criteria_for) instead of
/// branching on the round number.
#[derive(Debug, Clone, PartialEq)]
pub struct RubricRegistry {
    rounds: BTreeMap<Round, Vec<Criterion>>,
}

impl Default for RubricRegistry {
    fn default() -> Self {
        Self::from_rubrics(default_rubrics())
    }
}

impl RubricRegistry {
    /// Build a registry from config overrides. Rounds not mentioned keep
    /// their built-in rubric.
    pub fn from_config(overrides: &[RubricConfig]) -> Result<Self, Vec<String>> {
        validate_rubrics(overrides)?;

        let mut registry = Self::default();
        for rubric in overrides {
            registry
                .rounds
                .insert(rubric.round, normalize(rubric.criteria.clone()));
        }
        Ok(registry)
    }

    fn from_rubrics(rubrics: Vec<RubricConfig>) -> Self {
        let rounds = rubrics
            .into_iter()
            .map(|r| (r.round, normalize(r.criteria)))
            .collect();
        Self { rounds }
    }

    /// Ordered criteria for `round`.
    pub fn criteria_for(&self, round: Round) -> SessionResult<&[Criterion]> {
        self.rounds
            .get(&round)
            .map(Vec::as_slice)
            .ok_or(SessionError::UnknownRound(round))
    }

    /// Look up a criterion of `round` by key or name.
    pub fn criterion(&self, round: Round, ident: &str) -> SessionResult<Option<&Criterion>> {
        Ok(self.criteria_for(round)?.iter().find(|c| c.matches(ident)))
    }

    /// Configured rounds in ascending order.
    pub fn rounds(&self) -> Vec<Round> {
        self.rounds.keys().copied().collect()
    }
}

fn normalize(mut criteria: Vec<Criterion>) -> Vec<Criterion> {
    for c in &mut criteria {
        if c.name.is_empty() {
            c.name = c.key.clone();
        }
    }
    criteria
}
