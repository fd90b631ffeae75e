use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

use crate::rubric::Round;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    #[serde(rename = "teamID", deserialize_with = "string_or_number")]
    pub team_id: String,
    #[serde(rename = "teamName")]
    pub team_name: String,
}

/// "This judge already scored `team_id` in `round`."
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionRecord {
    #[serde(rename = "teamID", deserialize_with = "string_or_number")]
    pub team_id: String,
    pub round: Round,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    #[serde(rename = "teamID", deserialize_with = "string_or_number")]
    pub team_id: String,
    #[serde(rename = "teamName")]
    pub team_name: String,
    /// Absent or null until the team has been scored
    #[serde(rename = "totalScore", default)]
    pub total_score: Option<f64>,
}

impl LeaderboardEntry {
    pub fn score(&self) -> f64 {
        self.total_score.unwrap_or(0.0)
    }
}

/// Body of `POST /api/scores/submit-score`:
/// `{ "teamID": .., "round": .., "<criterion key>": <number>, .. }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScorePayload {
    #[serde(rename = "teamID")]
    pub team_id: String,
    pub round: Round,
    #[serde(flatten)]
    pub scores: BTreeMap<String, ScoreValue>,
}

/// A criterion score on the wire. Whole numbers are written as JSON
/// integers (`28`, not `28.0`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreValue(pub f64);

const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0; // 2^53

impl Serialize for ScoreValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let v = self.0;
        if v.fract() == 0.0 && v.abs() < MAX_EXACT_INT {
            serializer.serialize_i64(v as i64)
        } else {
            serializer.serialize_f64(v)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JudgeCredentials {
    #[serde(rename = "judgeID")]
    pub judge_id: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Error body the backend sends on failures
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// Team IDs are strings in practice, but accept bare numbers too.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Str(String),
        Int(i64),
    }
    Ok(match Id::deserialize(deserializer)? {
        Id::Str(s) => s,
        Id::Int(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_shape() {
        let payload = ScorePayload {
            team_id: "T1".to_string(),
            round: Round(2),
            scores: BTreeMap::from([
                ("technicalC".to_string(), ScoreValue(28.0)),
                ("uiuxD".to_string(), ScoreValue(15.5)),
            ]),
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"teamID": "T1", "round": 2, "technicalC": 28, "uiuxD": 15.5})
        );
    }

    #[test]
    fn test_submission_record_accepts_numeric_team_id() {
        let records: Vec<SubmissionRecord> =
            serde_json::from_value(json!([{"teamID": 7, "round": 1}, {"teamID": "T2", "round": 3}]))
                .unwrap();
        assert_eq!(records[0].team_id, "7");
        assert_eq!(records[1].round, Round(3));
    }

    #[test]
    fn test_leaderboard_missing_score_defaults_to_zero() {
        let entries: Vec<LeaderboardEntry> = serde_json::from_value(json!([
            {"teamID": "T1", "teamName": "Alpha", "totalScore": 88.5},
            {"teamID": "T2", "teamName": "Beta", "totalScore": null},
            {"teamID": "T3", "teamName": "Gamma"}
        ]))
        .unwrap();
        assert_eq!(entries[0].score(), 88.5);
        assert_eq!(entries[1].score(), 0.0);
        assert_eq!(entries[2].score(), 0.0);
    }

    #[test]
    fn test_credentials_wire_names() {
        let creds = JudgeCredentials {
            judge_id: "judge7".to_string(),
            password: "pw".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&creds).unwrap(),
            json!({"judgeID": "judge7", "password": "pw"})
        );
    }
}
