use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::api::LeaderboardEntry;
use crate::rubric::Criterion;
use crate::session::{LedgerStatus, SubmitReceipt, TeamBoard};

const MEDALS: [&str; 3] = ["🥇", "🥈", "🥉"];

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a score without a trailing ".0" (28, 27.5)
pub fn format_score(score: f64) -> String {
    if score.fract() == 0.0 && score.abs() < 1e15 {
        format!("{:.0}", score)
    } else {
        let s = format!("{:.2}", score);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate a name to fit available width, accounting for Unicode
fn truncate_name(name: &str, max_width: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_width {
        name.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Ranked leaderboard, in the order the server returned it.
///
/// Columns: rank, score (right-aligned, 7 wide), team name. The top three
/// get a medal; with colors they are also highlighted.
pub fn format_leaderboard(entries: &[LeaderboardEntry], use_colors: bool) -> String {
    format_leaderboard_with_width(entries, use_colors, get_terminal_width())
}

fn format_leaderboard_with_width(entries: &[LeaderboardEntry], use_colors: bool, term_width: Option<usize>) -> String {
    if entries.is_empty() {
        return "No scores available".to_string();
    }

    // "  1. 🥇 " is 8 columns (medal renders double width), score 7, two separators
    let fixed_width = 8 + 7 + 2;

    entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            let rank = format!("{:>3}.", idx + 1);
            let medal = MEDALS.get(idx).copied().unwrap_or("  ");
            let score = format!("{:>7}", format_score(entry.score()));

            let name = match term_width {
                Some(width) if width > fixed_width + 10 => truncate_name(&entry.team_name, width - fixed_width),
                Some(_) => truncate_name(&entry.team_name, 20),
                None => entry.team_name.clone(),
            };

            if use_colors && idx < MEDALS.len() {
                format!("{} {} {}  {}", rank.yellow().bold(), medal, score.bold(), name.yellow())
            } else if use_colors {
                format!("{} {} {}  {}", rank.dimmed(), medal, score.bold(), name)
            } else {
                format!("{} {} {}  {}", rank, medal, score, name)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Team list for one round with scored teams marked, followed by progress.
pub fn format_team_board(board: &TeamBoard, use_colors: bool) -> String {
    if board.teams.is_empty() {
        return "No teams available.".to_string();
    }

    let mut lines: Vec<String> = board
        .teams
        .iter()
        .map(|status| {
            let id = format!("{:>8}", status.team.team_id);
            match (status.scored, use_colors) {
                (true, true) => format!(
                    "{}  {} {}",
                    id.dimmed(),
                    status.team.team_name.dimmed(),
                    "(Already scored)".green()
                ),
                (true, false) => format!("{}  {} (Already scored)", id, status.team.team_name),
                (false, true) => format!("{}  {}", id.cyan(), status.team.team_name.bold()),
                (false, false) => format!("{}  {}", id, status.team.team_name),
            }
        })
        .collect();

    if let Some(progress) = progress_line(board) {
        lines.push(String::new());
        lines.push(progress);
    }
    if !board.ledger_complete {
        lines.push("Submission history unavailable; scored marks may be incomplete.".to_string());
    }

    lines.join("\n")
}

/// Only shown once at least one team has been scored.
fn progress_line(board: &TeamBoard) -> Option<String> {
    if board.scored_count() == 0 {
        return None;
    }
    if board.remaining == 0 {
        Some("You've scored all teams for this round! 🎉".to_string())
    } else {
        Some(format!(
            "{} teams remaining to be scored for Round {}",
            board.remaining, board.round
        ))
    }
}

/// Confirmation printed after an accepted submit.
pub fn format_receipt(receipt: &SubmitReceipt, criteria: &[Criterion], use_colors: bool) -> String {
    let header = format!(
        "Scores submitted for team {} (Round {})",
        receipt.team_id, receipt.round
    );
    let mut lines = vec![if use_colors {
        header.green().bold().to_string()
    } else {
        header
    }];

    let label_width = criteria.iter().map(|c| c.label.chars().count()).max().unwrap_or(0);
    let mut total = 0.0;
    for (key, value) in &receipt.scores {
        total += value;
        let label = criteria
            .iter()
            .find(|c| &c.key == key)
            .map(|c| c.label.as_str())
            .unwrap_or(key.as_str());
        let flag = if receipt.out_of_range.contains(key) {
            "  (outside rubric range)"
        } else {
            ""
        };
        lines.push(format!("  {:<width$}  {:>6}{}", label, format_score(*value), flag, width = label_width));
    }
    lines.push(format!("  {:<width$}  {:>6}", "Total", format_score(total), width = label_width));

    lines.join("\n")
}

/// One-line summary of what the session knows about past submissions.
pub fn format_ledger_status(status: &LedgerStatus, total_teams: Option<usize>) -> String {
    match status {
        LedgerStatus::Idle => "No round selected.".to_string(),
        LedgerStatus::Pending => "Loading submission history...".to_string(),
        LedgerStatus::Ready { scored } => match total_teams {
            Some(total) => format!("{} of {} teams scored", scored, total),
            None => format!("{} teams scored", scored),
        },
        LedgerStatus::Unavailable { error, scored } => {
            format!("{} teams scored in this session (history unavailable: {})", scored, error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Team;
    use crate::rubric::Round;
    use crate::session::TeamStatus;
    use chrono::Utc;

    fn entry(name: &str, score: Option<f64>) -> LeaderboardEntry {
        LeaderboardEntry {
            team_id: name.to_lowercase(),
            team_name: name.to_string(),
            total_score: score,
        }
    }

    fn board(scored: &[bool], remaining: usize) -> TeamBoard {
        TeamBoard {
            round: Round(2),
            teams: scored
                .iter()
                .enumerate()
                .map(|(i, s)| TeamStatus {
                    team: Team {
                        team_id: format!("T{}", i + 1),
                        team_name: format!("Team {}", i + 1),
                    },
                    scored: *s,
                })
                .collect(),
            remaining,
            ledger_complete: true,
        }
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(28.0), "28");
        assert_eq!(format_score(0.0), "0");
        assert_eq!(format_score(27.5), "27.5");
        assert_eq!(format_score(12.25), "12.25");
    }

    #[test]
    fn test_truncate_name() {
        assert_eq!(truncate_name("Short", 20), "Short");
        assert_eq!(truncate_name("This is a very long name", 15), "This is a ve...");
        assert_eq!(truncate_name("Hello world", 3), "Hel");
    }

    #[test]
    fn test_leaderboard_empty() {
        assert_eq!(format_leaderboard(&[], false), "No scores available");
    }

    #[test]
    fn test_leaderboard_order_and_medals() {
        let entries = vec![
            entry("Alpha", Some(91.0)),
            entry("Beta", Some(85.5)),
            entry("Gamma", Some(80.0)),
            entry("Delta", None),
        ];
        let result = format_leaderboard_with_width(&entries, false, None);
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("  1. 🥇"));
        assert!(lines[0].ends_with("Alpha"));
        assert!(lines[1].contains("🥈") && lines[1].contains("85.5"));
        assert!(lines[2].contains("🥉"));
        // Missing total shows as 0, no medal
        assert!(lines[3].starts_with("  4."));
        assert!(lines[3].contains("      0  Delta"));
    }

    #[test]
    fn test_leaderboard_truncates_to_width() {
        let entries = vec![entry("An extremely long hackathon team name", Some(10.0))];
        let result = format_leaderboard_with_width(&entries, false, Some(40));
        assert!(result.ends_with("..."));
        assert!(!result.contains("team name"));
    }

    #[test]
    fn test_team_board_marks_scored() {
        let result = format_team_board(&board(&[true, false, false], 2), false);
        assert!(result.contains("Team 1 (Already scored)"));
        assert!(!result.contains("Team 2 (Already scored)"));
        assert!(result.contains("2 teams remaining to be scored for Round 2"));
    }

    #[test]
    fn test_team_board_all_scored() {
        let result = format_team_board(&board(&[true, true], 0), false);
        assert!(result.contains("You've scored all teams for this round!"));
    }

    #[test]
    fn test_team_board_no_progress_before_first_score() {
        let result = format_team_board(&board(&[false, false], 2), false);
        assert!(!result.contains("remaining"));
    }

    #[test]
    fn test_team_board_incomplete_history_noted() {
        let mut b = board(&[false], 1);
        b.ledger_complete = false;
        assert!(format_team_board(&b, false).contains("history unavailable"));
    }

    #[test]
    fn test_receipt_lists_labels_and_total() {
        let criteria = vec![
            Criterion::new("technicalC", "technicalComplexity", "Technical Complexity", 0.0, 30.0),
            Criterion::new("uiuxD", "uiuxDesign", "UI/UX & Design", 0.0, 20.0),
        ];
        let receipt = SubmitReceipt {
            team_id: "T1".to_string(),
            round: Round(2),
            scores: vec![("technicalC".to_string(), 28.0), ("uiuxD".to_string(), 30.0)],
            out_of_range: vec!["uiuxD".to_string()],
            submitted_at: Utc::now(),
        };
        let result = format_receipt(&receipt, &criteria, false);
        assert!(result.starts_with("Scores submitted for team T1 (Round 2)"));
        assert!(result.contains("Technical Complexity"));
        assert!(result.contains("30  (outside rubric range)"));
        assert!(result.contains("Total"));
        assert!(result.contains("58"));
    }

    #[test]
    fn test_ledger_status_lines() {
        assert_eq!(
            format_ledger_status(&LedgerStatus::Ready { scored: 3 }, Some(10)),
            "3 of 10 teams scored"
        );
        assert_eq!(format_ledger_status(&LedgerStatus::Pending, None), "Loading submission history...");
    }
}
