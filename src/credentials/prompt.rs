use anyhow::{Context, Result};

use super::store_token;
use crate::api::{JudgeCredentials, JudgingClient};
use crate::config::prompt_line;

/// Check registration input before it goes to the server.
pub fn check_registration(judge_id: &str, password: &str, confirm: &str) -> Result<(), &'static str> {
    if judge_id.trim().is_empty() || password.is_empty() {
        return Err("Please fill in all fields");
    }
    if password != confirm {
        return Err("Passwords do not match");
    }
    Ok(())
}

/// Prompt for judge ID and password. With `confirm`, the password is asked twice.
pub fn prompt_for_credentials(confirm: bool) -> Result<JudgeCredentials> {
    let judge_id = prompt_line("Judge ID: ")?;
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;

    let confirmation = if confirm {
        rpassword::prompt_password("Confirm password: ").context("Failed to read password")?
    } else {
        password.clone()
    };

    check_registration(&judge_id, &password, &confirmation).map_err(|msg| anyhow::anyhow!(msg))?;

    Ok(JudgeCredentials { judge_id, password })
}

/// Log in against the backend and keep the issued token in the keyring.
pub async fn login_interactive(client: &JudgingClient) -> Result<String> {
    let creds = prompt_for_credentials(false)?;
    let token = client.login(&creds).await?;

    store_token(token.clone())
        .await
        .context("Failed to store token in keyring")?;

    println!("Logged in as {}. Token stored securely in system keyring.", creds.judge_id);
    Ok(token)
}

/// Register a new judge account. Does not log in.
pub async fn register_interactive(client: &JudgingClient) -> Result<()> {
    let creds = prompt_for_credentials(true)?;
    client.register(&creds).await?;
    println!("Registered {}. Run `hackjudge login` to start scoring.", creds.judge_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_requires_all_fields() {
        assert_eq!(check_registration("", "pw", "pw"), Err("Please fill in all fields"));
        assert_eq!(check_registration("judge", "", ""), Err("Please fill in all fields"));
    }

    #[test]
    fn test_registration_password_mismatch() {
        assert_eq!(check_registration("judge", "pw1", "pw2"), Err("Passwords do not match"));
    }

    #[test]
    fn test_registration_ok() {
        assert!(check_registration("judge", "pw", "pw").is_ok());
    }
}
