use serde::{Deserialize, Serialize};
use std::fmt;

/// A numbered judging phase.
///
/// Which rounds exist is decided by the [`RubricRegistry`](super::RubricRegistry),
/// not by this type: `Round(4)` is representable but unconfigured by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Round(pub u8);

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for Round {
    fn from(n: u8) -> Self {
        Round(n)
    }
}

/// One scoring criterion of a round's rubric.
///
/// Example YAML:
/// ```yaml
/// key: technicalC
/// name: technicalComplexity
/// label: Technical Complexity
/// min: 0
/// max: 30
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Criterion {
    /// Field name sent to the server
    pub key: String,

    /// Descriptive identifier; accepted as an alias for `key` when entering values.
    /// Defaults to `key` when omitted.
    #[serde(default)]
    pub name: String,

    /// Caption shown to the judge
    pub label: String,

    pub min: f64,
    pub max: f64,
}

impl Criterion {
    pub fn new(key: &str, name: &str, label: &str, min: f64, max: f64) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            label: label.to_string(),
            min,
            max,
        }
    }

    /// Whether `ident` names this criterion, by key or by name (ASCII case-insensitive).
    pub fn matches(&self, ident: &str) -> bool {
        let ident = ident.trim();
        self.key.eq_ignore_ascii_case(ident) || self.name.eq_ignore_ascii_case(ident)
    }

    pub fn in_range(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// "Technical Complexity (0-30)"
    pub fn caption(&self) -> String {
        format!("{} ({}-{})", self.label, self.min, self.max)
    }
}

/// Rubric for a single round, as written in the config file.
///
/// Example YAML:
/// ```yaml
/// rubrics:
///   - round: 4
///     criteria:
///       - { key: pitch, label: Pitch, min: 0, max: 50 }
///       - { key: demo, label: Demo, min: 0, max: 50 }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RubricConfig {
    pub round: Round,
    pub criteria: Vec<Criterion>,
}

/// Built-in rubrics for rounds 1-3. Each round sums to 100.
pub fn default_rubrics() -> Vec<RubricConfig> {
    vec![
        RubricConfig {
            round: Round(1),
            criteria: vec![
                Criterion::new("originality", "originality", "Originality & Innovation", 0.0, 25.0),
                Criterion::new("feasibility", "feasibility", "Feasibility", 0.0, 25.0),
                Criterion::new("problemSolutionFit", "problemSolutionFit", "Problem-Solution Fit", 0.0, 30.0),
                Criterion::new("impact", "impact", "Impact", 0.0, 20.0),
            ],
        },
        RubricConfig {
            round: Round(2),
            criteria: vec![
                Criterion::new("technicalC", "technicalComplexity", "Technical Complexity", 0.0, 30.0),
                Criterion::new("progress", "progress", "Progress", 0.0, 25.0),
                Criterion::new("uiuxD", "uiuxDesign", "UI/UX & Design", 0.0, 20.0),
                Criterion::new(
                    "collaborationP",
                    "collaborationProblemSolving",
                    "Collaboration & Problem Solving",
                    0.0,
                    25.0,
                ),
            ],
        },
        RubricConfig {
            round: Round(3),
            criteria: vec![
                Criterion::new("functionality", "functionality", "Functionality & Execution", 0.0, 35.0),
                Criterion::new("scalability", "scalability", "Scalability", 0.0, 20.0),
                Criterion::new("uiuxP", "uiuxPresentation", "UI/UX & Presentation", 0.0, 15.0),
                Criterion::new("creativity", "creativity", "Creativity", 0.0, 30.0),
            ],
        },
    ]
}
