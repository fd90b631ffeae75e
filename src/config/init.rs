use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use super::{get_config_path, load_config, save_config, Config};

/// Prompt user with a message and return their trimmed input.
/// Fails once stdin is closed so callers that loop on bad input terminate.
pub fn prompt_line(message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout()
        .flush()
        .context("Failed to flush stdout")?;
    read_answer(&mut std::io::stdin().lock())
}

fn read_answer(reader: &mut impl BufRead) -> Result<String> {
    let mut input = String::new();
    let read = reader.read_line(&mut input).context("Failed to read input")?;
    if read == 0 {
        anyhow::bail!("input closed");
    }
    Ok(input.trim().to_string())
}

/// Prompt user with a message and a default value. Returns default if input is empty.
fn prompt_with_default(message: &str, default: &str) -> Result<String> {
    let input = prompt_line(&format!("{} [{}]: ", message, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

fn prompt_yes_no(message: &str, default_yes: bool) -> Result<bool> {
    let hint = if default_yes { "Y/n" } else { "y/N" };
    let input = prompt_line(&format!("{} [{}]: ", message, hint))?.to_lowercase();
    if input.is_empty() {
        Ok(default_yes)
    } else {
        Ok(input == "y" || input == "yes")
    }
}

/// Keep asking until `check` accepts the answer.
fn prompt_until(message: &str, default: &str, check: impl Fn(&str) -> Result<(), String>) -> Result<String> {
    loop {
        let input = prompt_with_default(message, default)?;
        match check(&input) {
            Ok(()) => return Ok(input),
            Err(e) => println!("  Invalid: {}. Try again.", e),
        }
    }
}

fn check_url(input: &str) -> Result<(), String> {
    if input.starts_with("http://") || input.starts_with("https://") {
        Ok(())
    } else {
        Err("must start with http:// or https://".to_string())
    }
}

fn check_duration(input: &str) -> Result<(), String> {
    match humantime::parse_duration(input) {
        Ok(d) if d.is_zero() => Err("must be greater than zero".to_string()),
        Ok(_) => Ok(()),
        Err(e) => Err(e.to_string()),
    }
}

/// Run the interactive init wizard to create a config file.
///
/// Answers default to the values in an existing config at the same path, so
/// re-running the wizard only changes what the judge retypes. Rubric
/// overrides already in the file are preserved.
pub fn run_init_wizard(default_path: Option<PathBuf>) -> Result<()> {
    let default_config_path = match default_path {
        Some(p) => p,
        None => get_config_path()?,
    };

    println!();
    println!("hackjudge configuration");
    println!("=======================");
    println!();

    let existing = if default_config_path.exists() {
        load_config(Some(default_config_path.clone()))?
    } else {
        Config::default()
    };

    println!("The judging backend every command talks to.");
    let base_url = prompt_until("Backend URL", &existing.base_url, check_url)?;

    println!();
    println!("Durations use forms like '15s', '1m' or '500ms'.");
    let request_timeout = prompt_until("Request timeout", &existing.request_timeout, check_duration)?;
    let ledger_timeout = prompt_until(
        "How long a submit waits for your submission history",
        &existing.ledger_timeout,
        check_duration,
    )?;

    println!();
    let path_str = prompt_with_default(
        "Where should the config be saved?",
        &default_config_path.display().to_string(),
    )?;
    let config_path = PathBuf::from(&path_str);

    if config_path.exists() {
        let overwrite = prompt_yes_no(
            &format!("Config already exists at {}. Overwrite?", config_path.display()),
            false,
        )?;
        if !overwrite {
            println!("Aborted.");
            return Ok(());
        }
    }

    let config = Config {
        base_url: base_url.trim_end_matches('/').to_string(),
        request_timeout,
        ledger_timeout,
        rubrics: existing.rubrics,
    };
    save_config(&config_path, &config)?;

    println!();
    println!("Config written to {}", config_path.display());
    if config.rubrics.is_none() {
        println!("Rubrics for extra rounds can be added under `rubrics:` in that file.");
    }
    println!("Run `hackjudge login` to get started.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_answer_trims() {
        let mut input = std::io::Cursor::new("  T7 \nrest\n");
        assert_eq!(read_answer(&mut input).unwrap(), "T7");
        assert_eq!(read_answer(&mut input).unwrap(), "rest");
    }

    #[test]
    fn test_read_answer_blank_line_is_empty() {
        let mut input = std::io::Cursor::new("\n");
        assert_eq!(read_answer(&mut input).unwrap(), "");
    }

    #[test]
    fn test_read_answer_closed_input_errors() {
        let mut input = std::io::Cursor::new("");
        let err = read_answer(&mut input).unwrap_err();
        assert_eq!(err.to_string(), "input closed");
    }

    #[test]
    fn test_check_url() {
        assert!(check_url("https://judge.example.com").is_ok());
        assert!(check_url("http://localhost:5000").is_ok());
        assert!(check_url("judge.example.com").is_err());
    }

    #[test]
    fn test_check_duration() {
        assert!(check_duration("15s").is_ok());
        assert!(check_duration("1m 30s").is_ok());
        assert_eq!(check_duration("0s"), Err("must be greater than zero".to_string()));
        assert!(check_duration("fast").is_err());
    }
}
