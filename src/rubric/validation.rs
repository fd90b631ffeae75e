use std::collections::HashSet;

use super::config::RubricConfig;

/// Validate rubric overrides at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_rubrics(rubrics: &[RubricConfig]) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();
    let mut seen_rounds = HashSet::new();

    for (i, rubric) in rubrics.iter().enumerate() {
        if !seen_rounds.insert(rubric.round) {
            errors.push(format!("rubrics[{}].round: round {} defined more than once", i, rubric.round));
        }

        if rubric.criteria.is_empty() {
            errors.push(format!("rubrics[{}].criteria: round {} has no criteria", i, rubric.round));
        }

        let mut seen_idents = HashSet::new();
        for (j, criterion) in rubric.criteria.iter().enumerate() {
            let path = format!("rubrics[{}].criteria[{}]", i, j);

            if criterion.key.trim().is_empty() {
                errors.push(format!("{}.key: must not be empty", path));
            } else if !seen_idents.insert(criterion.key.to_ascii_lowercase()) {
                errors.push(format!("{}.key: '{}' is not unique in round {}", path, criterion.key, rubric.round));
            }

            if !criterion.name.is_empty()
                && !criterion.name.eq_ignore_ascii_case(&criterion.key)
                && !seen_idents.insert(criterion.name.to_ascii_lowercase())
            {
                errors.push(format!("{}.name: '{}' is not unique in round {}", path, criterion.name, rubric.round));
            }

            if !criterion.min.is_finite() || !criterion.max.is_finite() {
                errors.push(format!("{}: bounds must be finite numbers", path));
            } else if criterion.min > criterion.max {
                errors.push(format!(
                    "{}: min {} is greater than max {}",
                    path, criterion.min, criterion.max
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rubric::{default_rubrics, Criterion, Round};

    fn rubric(round: u8, criteria: Vec<Criterion>) -> RubricConfig {
        RubricConfig { round: Round(round), criteria }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_rubrics(&default_rubrics()).is_ok());
    }

    #[test]
    fn test_empty_list_is_valid() {
        assert!(validate_rubrics(&[]).is_ok());
    }

    #[test]
    fn test_min_greater_than_max() {
        let rubrics = vec![rubric(1, vec![Criterion::new("pitch", "", "Pitch", 10.0, 5.0)])];
        let errors = validate_rubrics(&rubrics).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("rubrics[0].criteria[0]"));
        assert!(errors[0].contains("min 10 is greater than max 5"));
    }

    #[test]
    fn test_duplicate_key_case_insensitive() {
        let rubrics = vec![rubric(
            1,
            vec![
                Criterion::new("pitch", "", "Pitch", 0.0, 5.0),
                Criterion::new("Pitch", "", "Pitch again", 0.0, 5.0),
            ],
        )];
        let errors = validate_rubrics(&rubrics).unwrap_err();
        assert!(errors[0].contains("rubrics[0].criteria[1].key"));
    }

    #[test]
    fn test_name_colliding_with_other_key() {
        let rubrics = vec![rubric(
            1,
            vec![
                Criterion::new("demo", "", "Demo", 0.0, 5.0),
                Criterion::new("pitch", "demo", "Pitch", 0.0, 5.0),
            ],
        )];
        let errors = validate_rubrics(&rubrics).unwrap_err();
        assert!(errors[0].contains("rubrics[0].criteria[1].name"));
    }

    #[test]
    fn test_duplicate_round_and_empty_criteria() {
        let rubrics = vec![rubric(2, vec![]), rubric(2, vec![])];
        let errors = validate_rubrics(&rubrics).unwrap_err();
        // empty criteria twice + duplicate round once
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.contains("defined more than once")));
    }

    #[test]
    fn test_collects_all_errors() {
        let rubrics = vec![rubric(
            1,
            vec![
                Criterion::new("", "", "Blank", 0.0, 5.0),
                Criterion::new("pitch", "", "Pitch", f64::NAN, 5.0),
            ],
        )];
        let errors = validate_rubrics(&rubrics).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
