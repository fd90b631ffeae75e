mod init;
mod schema;

pub use init::{prompt_line, run_init_wizard};
pub use schema::{Config, DEFAULT_LEDGER_TIMEOUT, DEFAULT_REQUEST_TIMEOUT};

use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Get the config directory path (~/.config/hackjudge/)
pub fn get_config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("hackjudge"))
}

/// Get the default config file path (~/.config/hackjudge/config.yaml)
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.yaml"))
}

/// Load configuration from a YAML file
///
/// `path` overrides the default location. A missing file is not an error:
/// the built-in defaults are returned instead.
///
/// # Errors
///
/// Returns an error if:
/// - The config file cannot be read
/// - The YAML cannot be parsed
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => p,
        None => get_config_path()?,
    };

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let config: Config = serde_saphyr::from_str(&config_content)
        .with_context(|| format!("Failed to parse config: invalid YAML in {}", config_path.display()))?;

    Ok(config)
}

/// Write `config` to `path` atomically, creating parent directories.
pub fn save_config(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let yaml = serde_saphyr::to_string(config).map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    file.write_all(yaml.as_bytes())
        .with_context(|| format!("Failed to write config to {}", path.display()))?;
    file.commit()
        .with_context(|| format!("Failed to save config to {}", path.display()))?;

    Ok(())
}
