use std::fmt;

use crate::error::{SessionError, SessionResult};

/// Judge token a session authenticates with.
///
/// Passed into the session explicitly; a missing token is an
/// [`SessionError::AccessDenied`] at call time, never an empty result.
#[derive(Clone, Default, PartialEq)]
pub struct AuthContext {
    token: Option<String>,
}

impl AuthContext {
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        let token = token.trim();
        Self {
            token: (!token.is_empty()).then(|| token.to_string()),
        }
    }

    pub fn anonymous() -> Self {
        Self { token: None }
    }

    /// The token to send, verbatim, in the `Authorization` header.
    pub fn token(&self) -> SessionResult<&str> {
        self.token.as_deref().ok_or(SessionError::AccessDenied)
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = if self.token.is_some() { "<redacted>" } else { "<none>" };
        f.debug_struct("AuthContext").field("token", &shown).finish()
    }
}

impl From<Option<String>> for AuthContext {
    fn from(token: Option<String>) -> Self {
        token.map(AuthContext::new).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_token_is_anonymous() {
        let auth = AuthContext::new("   ");
        assert!(!auth.is_authenticated());
        assert_eq!(auth.token().unwrap_err(), SessionError::AccessDenied);
    }

    #[test]
    fn test_token_trimmed() {
        let auth = AuthContext::new("  abc.def  ");
        assert_eq!(auth.token().unwrap(), "abc.def");
    }

    #[test]
    fn test_debug_redacts_token() {
        let auth = AuthContext::new("secret-token");
        let shown = format!("{:?}", auth);
        assert!(!shown.contains("secret-token"));
        assert!(shown.contains("<redacted>"));
    }
}
