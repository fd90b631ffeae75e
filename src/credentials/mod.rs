pub mod context;
pub mod prompt;

use keyring::Entry;
use thiserror::Error;

pub use context::AuthContext;
pub use prompt::{login_interactive, prompt_for_credentials, register_interactive};

const SERVICE_NAME: &str = "hackjudge";
const TOKEN_KEY: &str = "judge-token";

/// Environment variable name for providing a judge token without keyring
pub const ENV_TOKEN_VAR: &str = "HACKJUDGE_TOKEN";

/// Check for a judge token in the HACKJUDGE_TOKEN environment variable.
/// Returns Some(token) if the env var is set and non-empty, None otherwise.
pub fn get_token_from_env() -> Option<String> {
    match std::env::var(ENV_TOKEN_VAR) {
        Ok(val) => {
            let trimmed = val.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        }
        Err(_) => None,
    }
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Keyring unavailable: {0}")]
    KeyringUnavailable(String),
    #[error("Not logged in")]
    TokenNotFound,
    #[error("Failed to store token: {0}")]
    StoreFailed(String),
}

fn entry() -> Result<Entry, CredentialError> {
    Entry::new(SERVICE_NAME, TOKEN_KEY)
        .map_err(|e| CredentialError::KeyringUnavailable(format!("{}", e)))
}

fn get_token_sync() -> Result<String, CredentialError> {
    entry()?.get_password().map_err(|e| match e {
        keyring::Error::NoEntry => CredentialError::TokenNotFound,
        _ => CredentialError::KeyringUnavailable(format!("{}", e)),
    })
}

fn store_token_sync(token: &str) -> Result<(), CredentialError> {
    entry()?
        .set_password(token)
        .map_err(|e| CredentialError::StoreFailed(format!("{}", e)))
}

fn delete_token_sync() -> Result<bool, CredentialError> {
    match entry()?.delete_credential() {
        Ok(()) => Ok(true),
        Err(keyring::Error::NoEntry) => Ok(false),
        Err(e) => Err(CredentialError::KeyringUnavailable(format!("{}", e))),
    }
}

/// Retrieve the stored token from the system keyring.
/// Uses spawn_blocking to prevent blocking the async runtime
pub async fn get_token() -> Result<String, CredentialError> {
    tokio::task::spawn_blocking(get_token_sync)
        .await
        .map_err(|e| CredentialError::KeyringUnavailable(format!("Task join error: {}", e)))?
}

/// Store `token` in the system keyring, replacing any previous one.
pub async fn store_token(token: String) -> Result<(), CredentialError> {
    tokio::task::spawn_blocking(move || store_token_sync(&token))
        .await
        .map_err(|e| CredentialError::KeyringUnavailable(format!("Task join error: {}", e)))?
}

/// Remove the stored token. Returns false if none was stored.
pub async fn delete_token() -> Result<bool, CredentialError> {
    tokio::task::spawn_blocking(delete_token_sync)
        .await
        .map_err(|e| CredentialError::KeyringUnavailable(format!("Task join error: {}", e)))?
}

/// Build the session's auth context: env var first, then keyring.
///
/// A missing token yields an anonymous context; the session reports
/// `AccessDenied` when it first needs the token.
pub async fn load_auth_context() -> Result<AuthContext, CredentialError> {
    if let Some(token) = get_token_from_env() {
        return Ok(AuthContext::new(token));
    }
    match get_token().await {
        Ok(token) => Ok(AuthContext::new(token)),
        Err(CredentialError::TokenNotFound) => Ok(AuthContext::anonymous()),
        Err(e) => Err(e),
    }
}
