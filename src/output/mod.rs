pub mod formatter;

pub use formatter::{
    format_leaderboard, format_ledger_status, format_receipt, format_score, format_team_board, should_use_colors,
};
