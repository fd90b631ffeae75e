use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use hackjudge::api::{JudgingClient, ScoringBackend};
use hackjudge::config::{prompt_line, Config};
use hackjudge::credentials::{self, AuthContext, CredentialError};
use hackjudge::rubric::{Criterion, Round, RubricRegistry};
use hackjudge::session::{ScoringSession, TeamBoard};
use hackjudge::{output, SessionError};

const EXIT_SUCCESS: i32 = 0;
const EXIT_AUTH: i32 = 1;
const EXIT_NETWORK: i32 = 2;
const EXIT_VALIDATION: i32 = 3;
const EXIT_CONFIG: i32 = 4;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create or update the config file interactively
    Init,
    /// Log in and store the token in the system keyring
    Login,
    /// Create a judge account
    Register,
    /// Remove the stored token
    Logout,
    /// List teams for a round, marking the ones you already scored
    Teams {
        #[arg(short, long)]
        round: u8,
    },
    /// Score one team; prompts for anything not given as flags
    Score {
        #[arg(short, long)]
        round: u8,

        /// Team ID (prompted for if omitted)
        #[arg(short, long)]
        team: Option<String>,

        /// Criterion value as key=value; repeatable
        #[arg(long = "value", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        values: Vec<(String, String)>,
    },
    /// Show how many teams you have scored in a round
    Status {
        #[arg(short, long)]
        round: u8,
    },
    /// Show the ranked leaderboard
    Leaderboard,
}

#[derive(Parser, Debug)]
#[command(name = "hackjudge")]
#[command(about = "Hackathon judging CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/hackjudge/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.trim().to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

/// Exit code for a failed command.
fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(e) = err.downcast_ref::<SessionError>() {
        return match e {
            SessionError::AccessDenied | SessionError::AuthFailed(_) => EXIT_AUTH,
            e if e.is_validation() => EXIT_VALIDATION,
            SessionError::SubmissionInProgress => EXIT_VALIDATION,
            _ => EXIT_NETWORK,
        };
    }
    if err.downcast_ref::<CredentialError>().is_some() {
        return EXIT_AUTH;
    }
    EXIT_NETWORK
}

fn prompt_yes_no(message: &str) -> anyhow::Result<bool> {
    if !std::io::stdin().is_terminal() {
        return Ok(false);
    }
    let input = prompt_line(&format!("{} [y/N]: ", message))?.to_lowercase();
    Ok(input == "y" || input == "yes")
}

fn warn_out_of_range(criterion: &Criterion, raw: &str) {
    if let Ok(v) = raw.trim().parse::<f64>() {
        if v.is_finite() && !criterion.in_range(v) {
            eprintln!(
                "  Warning: {} is outside {} ({}-{})",
                raw.trim(),
                criterion.label,
                criterion.min,
                criterion.max
            );
        }
    }
}

/// Ask for one criterion and store the answer in the draft.
fn prompt_criterion(session: &ScoringSession, criterion: &Criterion) -> anyhow::Result<()> {
    let raw = prompt_line(&format!("{}: ", criterion.caption()))?;
    warn_out_of_range(criterion, &raw);
    session.set_value(&criterion.key, &raw)?;
    Ok(())
}

/// Prompt for a team until one that is not already scored is given.
fn prompt_team(board: Option<&TeamBoard>) -> anyhow::Result<String> {
    loop {
        let team_id = prompt_line("Team ID: ")?;
        if team_id.is_empty() {
            eprintln!("  {}", SessionError::NoTeamSelected);
            continue;
        }
        let Some(board) = board else {
            return Ok(team_id);
        };
        match board.find(&team_id) {
            Some(status) if status.scored => {
                eprintln!("  {} is already scored for Round {}.", status.team.team_name, board.round)
            }
            Some(_) => return Ok(team_id),
            None => eprintln!("  No team with ID {} in this round.", team_id),
        }
    }
}

async fn run_score(
    session: &ScoringSession,
    team: Option<String>,
    values: Vec<(String, String)>,
    use_colors: bool,
) -> anyhow::Result<()> {
    let team_id = match team {
        Some(t) => t,
        None => {
            let board = match session.team_board().await {
                Ok(board) => {
                    println!("{}", output::format_team_board(&board, use_colors));
                    println!();
                    Some(board)
                }
                Err(e) if e.is_terminal() => return Err(e.into()),
                Err(e) => {
                    eprintln!("Warning: {}", e);
                    None
                }
            };
            prompt_team(board.as_ref())?
        }
    };
    session.select_team(&team_id)?;

    let criteria = session.criteria();
    for (key, raw) in &values {
        if let Some(c) = criteria.iter().find(|c| c.matches(key)) {
            warn_out_of_range(c, raw);
        } else {
            eprintln!("Warning: '{}' is not a criterion for this round and will be ignored", key);
        }
        session.set_value(key, raw)?;
    }

    let draft = session.draft();
    for criterion in &criteria {
        if draft.value(&criterion.key).is_none() {
            prompt_criterion(session, criterion)?;
        }
    }

    loop {
        match session.submit().await {
            Ok(receipt) => {
                println!("{}", output::format_receipt(&receipt, &criteria, use_colors));
                return Ok(());
            }
            Err(e) if !e.offending_keys().is_empty() => {
                eprintln!("{}", e);
                let offending = e.offending_keys().to_vec();
                for criterion in criteria.iter().filter(|c| offending.contains(&c.key)) {
                    prompt_criterion(session, criterion)?;
                }
            }
            Err(e @ (SessionError::NetworkFailure(_)
            | SessionError::SubmitRejected(_)
            | SessionError::LedgerUnavailable(_))) => {
                eprintln!("{}", e);
                if !prompt_yes_no("Retry?")? {
                    return Err(e.into());
                }
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Load config, validate it and build the rubric registry. Exits on failure.
fn load_config_or_exit(path: Option<PathBuf>) -> (Config, RubricRegistry) {
    let config = match hackjudge::config::load_config(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    if let Err(errors) = config.validate() {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let registry = match RubricRegistry::from_config(config.rubrics.as_deref().unwrap_or_default()) {
        Ok(r) => r,
        Err(errors) => {
            eprintln!("Rubric config errors:");
            for error in errors {
                eprintln!("  - {}", error);
            }
            std::process::exit(EXIT_CONFIG);
        }
    };

    (config, registry)
}

#[tokio::main]
async fn main() {
    // Required for rustls 0.23+; an already-installed provider is fine
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();
    let _ = hackjudge::logging::init(cli.verbose);
    let start_time = Instant::now();
    let config_path = cli.config.map(PathBuf::from);

    if let Commands::Init = cli.command {
        if let Err(e) = hackjudge::config::run_init_wizard(config_path) {
            eprintln!("Init failed: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
        std::process::exit(EXIT_SUCCESS);
    }

    let (config, registry) = load_config_or_exit(config_path);

    if cli.verbose {
        eprintln!("Backend: {}", config.base_url);
        let rounds: Vec<String> = registry.rounds().iter().map(Round::to_string).collect();
        eprintln!("Configured rounds: {}", rounds.join(", "));
    }

    let (request_timeout, ledger_timeout) = match (config.request_timeout(), config.ledger_timeout()) {
        (Ok(r), Ok(l)) => (r, l),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("Config error: {}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    let client = match JudgingClient::new(&config.base_url, request_timeout) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create HTTP client: {}", e);
            std::process::exit(EXIT_NETWORK);
        }
    };

    let use_colors = output::should_use_colors();
    let result: anyhow::Result<()> = match cli.command {
        Commands::Init => Ok(()),
        Commands::Login => credentials::login_interactive(&client).await.map(|_| ()),
        Commands::Register => credentials::register_interactive(&client).await,
        Commands::Logout => match credentials::delete_token().await {
            Ok(true) => {
                println!("Logged out. Token removed from keyring.");
                Ok(())
            }
            Ok(false) => {
                println!("Not logged in.");
                Ok(())
            }
            Err(e) => Err(e.into()),
        },
        Commands::Leaderboard => match client.leaderboard().await {
            Ok(entries) => {
                println!("{}", output::format_leaderboard(&entries, use_colors));
                Ok(())
            }
            Err(e) => Err(e.into()),
        },
        Commands::Teams { round } | Commands::Status { round } | Commands::Score { round, .. } => {
            let auth = match credentials::load_auth_context().await {
                Ok(a) => a,
                Err(e) => {
                    eprintln!("Credential error: {}", e);
                    std::process::exit(EXIT_AUTH);
                }
            };
            if !auth.is_authenticated() {
                eprintln!("Not logged in. Run `hackjudge login` first.");
                std::process::exit(EXIT_AUTH);
            }

            let session = new_session(client, registry, auth).with_ledger_timeout(ledger_timeout);
            run_session_command(&session, Round(round), cli.command, use_colors).await
        }
    };

    if cli.verbose {
        eprintln!("Done in {:?}", start_time.elapsed());
    }

    if let Err(e) = result {
        if use_colors {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
        } else {
            eprintln!("Error: {:#}", e);
        }
        let code = exit_code(&e);
        if code == EXIT_AUTH {
            eprintln!("Run `hackjudge login` to sign in again.");
        }
        std::process::exit(code);
    }

    std::process::exit(EXIT_SUCCESS);
}

fn new_session(client: JudgingClient, registry: RubricRegistry, auth: AuthContext) -> ScoringSession {
    let backend: Arc<dyn ScoringBackend> = Arc::new(client);
    ScoringSession::new(backend, Arc::new(registry), auth)
}

async fn run_session_command(
    session: &ScoringSession,
    round: Round,
    command: Commands,
    use_colors: bool,
) -> anyhow::Result<()> {
    session.select_round(round)?;

    match command {
        Commands::Teams { .. } => {
            let board = session.team_board().await?;
            println!("{}", output::format_team_board(&board, use_colors));
        }
        Commands::Status { .. } => {
            let total = match session.team_board().await {
                Ok(board) => Some(board.teams.len()),
                Err(e) if e.is_terminal() => return Err(e.into()),
                Err(e) => {
                    eprintln!("Warning: {}", e);
                    None
                }
            };
            println!(
                "Round {}: {}",
                round,
                output::format_ledger_status(&session.ledger_status(), total)
            );
        }
        Commands::Score { team, values, .. } => run_score(session, team, values, use_colors).await?,
        _ => {}
    }
    Ok(())
}
