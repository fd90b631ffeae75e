use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};
use tracing::{debug, warn};

use super::types::{
    ErrorBody, JudgeCredentials, LeaderboardEntry, LoginResponse, ScorePayload, SubmissionRecord, Team,
};
use super::ScoringBackend;
use crate::credentials::AuthContext;
use crate::error::{SessionError, SessionResult, GENERIC_SUBMIT_FAILURE};

/// Public deployment of the judging backend
pub const DEFAULT_BASE_URL: &str = "https://hackathon-judging-backend.vercel.app";

const USER_AGENT_VALUE: &str = concat!("hackjudge/", env!("CARGO_PKG_VERSION"));
const DEFAULT_RETRY_ATTEMPTS: usize = 3;

/// Why a single HTTP exchange failed, before it is mapped onto the
/// endpoint-specific [`SessionError`].
#[derive(Debug)]
enum RequestFailure {
    Unauthorized(Option<String>),
    Status(StatusCode, Option<String>),
    Transport(String),
    Decode(String),
}

impl RequestFailure {
    /// Only transport errors and 5xx are worth retrying.
    fn is_transient(&self) -> bool {
        match self {
            RequestFailure::Transport(_) => true,
            RequestFailure::Status(code, _) => code.is_server_error(),
            _ => false,
        }
    }

    fn message(&self) -> Option<String> {
        match self {
            RequestFailure::Unauthorized(msg) | RequestFailure::Status(_, msg) => msg.clone(),
            _ => None,
        }
    }

    fn describe(&self) -> String {
        match self {
            RequestFailure::Unauthorized(_) => "unauthorized".to_string(),
            RequestFailure::Status(code, Some(msg)) => format!("{} ({})", msg, code),
            RequestFailure::Status(code, None) => format!("server returned {}", code),
            RequestFailure::Transport(msg) => msg.clone(),
            RequestFailure::Decode(msg) => format!("unexpected response: {}", msg),
        }
    }

    /// Mapping for authenticated endpoints: 401/403 end the session,
    /// everything else becomes `unavailable`.
    fn into_session_error(self, unavailable: fn(String) -> SessionError) -> SessionError {
        match self {
            RequestFailure::Unauthorized(_) => SessionError::AccessDenied,
            other => unavailable(other.describe()),
        }
    }
}

/// HTTP client for the judging backend.
#[derive(Debug, Clone)]
pub struct JudgingClient {
    http: reqwest::Client,
    base_url: String,
    retry_attempts: usize,
}

impl JudgingClient {
    /// Create a client for `base_url` with a per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT_VALUE)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        })
    }

    /// How many times a failed GET is retried (0 disables retries)
    pub fn with_retry_attempts(mut self, attempts: usize) -> Self {
        self.retry_attempts = attempts;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_once<T: DeserializeOwned>(&self, url: &str, token: Option<&str>) -> Result<T, RequestFailure> {
        let mut request = self.http.get(url);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| RequestFailure::Transport(e.to_string()))?;
        let response = check_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| RequestFailure::Decode(e.to_string()))
    }

    /// GET `path` and decode JSON, retrying transient failures with backoff.
    async fn get_json<T: DeserializeOwned>(&self, path: &str, token: Option<&str>) -> Result<T, RequestFailure> {
        let url = self.url(path);
        debug!(url = %url, "GET");

        // 100ms, 200ms, 400ms ... capped at 5s
        let retry_strategy = ExponentialBackoff::from_millis(2)
            .factor(50)
            .max_delay(Duration::from_secs(5))
            .take(self.retry_attempts);

        let target = url.as_str();
        RetryIf::spawn(
            retry_strategy,
            move || async move {
                let result = self.get_once(target, token).await;
                if let Err(e) = &result {
                    if e.is_transient() {
                        warn!(url = %target, error = %e.describe(), "request failed");
                    }
                }
                result
            },
            RequestFailure::is_transient,
        )
        .await
    }

    /// POST `body` as JSON. Never retried.
    async fn post_json<B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        token: Option<&str>,
        body: &B,
    ) -> Result<reqwest::Response, RequestFailure> {
        let url = self.url(path);
        debug!(url = %url, "POST");

        let mut request = self.http.post(&url).json(body);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| RequestFailure::Transport(e.to_string()))?;
        check_status(response).await
    }

    /// `POST /api/auth/register`
    pub async fn register(&self, creds: &JudgeCredentials) -> SessionResult<()> {
        self.post_json("/api/auth/register", None, creds)
            .await
            .map(|_| ())
            .map_err(|e| auth_error(e, "Registration failed. Please try again."))
    }

    /// `POST /api/auth/login`, returning the issued token
    pub async fn login(&self, creds: &JudgeCredentials) -> SessionResult<String> {
        let response = self
            .post_json("/api/auth/login", None, creds)
            .await
            .map_err(|e| auth_error(e, "Login failed. Please try again."))?;

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| SessionError::AuthFailed(format!("unexpected login response: {}", e)))?;
        Ok(body.token)
    }
}

/// Pass 2xx through; turn anything else into a [`RequestFailure`] carrying
/// the server's `{ message }` when it sent one.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, RequestFailure> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty());

    debug!(status = %status, message = ?message, "request rejected");

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(RequestFailure::Unauthorized(message)),
        _ => Err(RequestFailure::Status(status, message)),
    }
}

fn auth_error(failure: RequestFailure, fallback: &str) -> SessionError {
    match failure {
        RequestFailure::Transport(msg) => SessionError::NetworkFailure(msg),
        other => SessionError::AuthFailed(other.message().unwrap_or_else(|| fallback.to_string())),
    }
}

#[async_trait]
impl ScoringBackend for JudgingClient {
    async fn list_teams(&self, auth: &AuthContext) -> SessionResult<Vec<Team>> {
        let token = auth.token()?;
        self.get_json("/api/teams", Some(token))
            .await
            .map_err(|e| e.into_session_error(SessionError::TeamDirectoryUnavailable))
    }

    async fn submitted_rounds(&self, auth: &AuthContext) -> SessionResult<Vec<SubmissionRecord>> {
        let token = auth.token()?;
        self.get_json("/api/scores/submitted-rounds", Some(token))
            .await
            .map_err(|e| e.into_session_error(SessionError::LedgerUnavailable))
    }

    async fn submit_score(&self, auth: &AuthContext, payload: &ScorePayload) -> SessionResult<()> {
        let token = auth.token()?;
        match self.post_json("/api/scores/submit-score", Some(token), payload).await {
            Ok(_) => Ok(()),
            Err(RequestFailure::Unauthorized(_)) => Err(SessionError::AccessDenied),
            Err(RequestFailure::Transport(msg)) => Err(SessionError::NetworkFailure(msg)),
            Err(other) => Err(SessionError::SubmitRejected(
                other.message().unwrap_or_else(|| GENERIC_SUBMIT_FAILURE.to_string()),
            )),
        }
    }

    async fn leaderboard(&self) -> SessionResult<Vec<LeaderboardEntry>> {
        self.get_json("/api/scores/leaderboard", None)
            .await
            .map_err(|e| SessionError::LeaderboardUnavailable(e.describe()))
    }
}
