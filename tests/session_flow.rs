//! End-to-end scoring sessions against a mocked judging backend.

use std::sync::Arc;
use std::time::Duration;

use hackjudge::api::{JudgingClient, ScoringBackend};
use hackjudge::credentials::AuthContext;
use hackjudge::rubric::{Round, RubricRegistry};
use hackjudge::session::{LedgerStatus, ScoringSession, SessionState};
use hackjudge::SessionError;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_session(mock_server: &MockServer, auth: AuthContext) -> ScoringSession {
    let _ = rustls::crypto::ring::default_provider().install_default();
    let client = JudgingClient::new(&mock_server.uri(), Duration::from_secs(5))
        .expect("failed to create client")
        .with_retry_attempts(0);
    let backend: Arc<dyn ScoringBackend> = Arc::new(client);
    ScoringSession::new(backend, Arc::new(RubricRegistry::default()), auth)
}

async fn mount_ledger(mock_server: &MockServer, records: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/scores/submitted-rounds"))
        .respond_with(ResponseTemplate::new(200).set_body_json(records))
        .mount(mock_server)
        .await;
}

fn fill_round_two(session: &ScoringSession) {
    session.set_value("technicalComplexity", "28").unwrap();
    session.set_value("progress", "20").unwrap();
    session.set_value("uiuxDesign", "15").unwrap();
    session.set_value("collaborationP", "22").unwrap();
}

#[tokio::test]
async fn test_round_two_submit_payload() {
    let mock_server = MockServer::start().await;
    mount_ledger(&mock_server, json!([])).await;

    Mock::given(method("POST"))
        .and(path("/api/scores/submit-score"))
        .and(body_json(json!({
            "teamID": "T1",
            "round": 2,
            "technicalC": 28,
            "progress": 20,
            "uiuxD": 15,
            "collaborationP": 22
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = create_session(&mock_server, AuthContext::new("tok"));
    session.select_round(Round(2)).unwrap();
    session.select_team("T1").unwrap();
    fill_round_two(&session);

    let receipt = session.submit().await.expect("submit failed");
    assert_eq!(receipt.team_id, "T1");
    assert_eq!(receipt.round, Round(2));
    assert_eq!(session.state(), SessionState::Submitted);
    assert!(session.draft().is_empty());
    assert!(session.is_scored("T1"));
}

#[tokio::test]
async fn test_already_scored_team_blocked_without_post() {
    let mock_server = MockServer::start().await;
    mount_ledger(&mock_server, json!([{"teamID": "T2", "round": 2}])).await;

    Mock::given(method("POST"))
        .and(path("/api/scores/submit-score"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let session = create_session(&mock_server, AuthContext::new("tok"));
    session.select_round(Round(2)).unwrap();
    session.select_team("T2").unwrap();
    fill_round_two(&session);

    assert_eq!(
        session.submit().await,
        Err(SessionError::DuplicateSubmission {
            team_id: "T2".to_string(),
            round: Round(2)
        })
    );
}

#[tokio::test]
async fn test_second_submit_while_first_in_flight() {
    let mock_server = MockServer::start().await;
    mount_ledger(&mock_server, json!([])).await;

    Mock::given(method("POST"))
        .and(path("/api/scores/submit-score"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = create_session(&mock_server, AuthContext::new("tok"));
    session.select_round(Round(2)).unwrap();
    session.select_team("T1").unwrap();
    fill_round_two(&session);

    let first = session.submit();
    let second = async {
        while !matches!(session.state(), SessionState::Submitting) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        session.submit().await
    };
    let (first, second) = tokio::join!(first, second);

    assert!(first.is_ok());
    assert_eq!(second, Err(SessionError::SubmissionInProgress));
}

#[tokio::test]
async fn test_slow_ledger_times_out_submit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/scores/submitted-rounds"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])).set_delay(Duration::from_secs(2)))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/scores/submit-score"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let session = create_session(&mock_server, AuthContext::new("tok")).with_ledger_timeout(Duration::from_millis(100));
    session.select_round(Round(2)).unwrap();
    session.select_team("T1").unwrap();
    fill_round_two(&session);

    assert!(matches!(
        session.submit().await,
        Err(SessionError::LedgerUnavailable(_))
    ));
    assert_eq!(session.draft().value("uiuxD"), Some("15"));
}

#[tokio::test]
async fn test_missing_token_denied_without_requests() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let session = create_session(&mock_server, AuthContext::anonymous());
    session.select_round(Round(2)).unwrap();
    session.select_team("T1").unwrap();
    fill_round_two(&session);

    assert_eq!(session.submit().await, Err(SessionError::AccessDenied));
    assert_eq!(session.team_board().await, Err(SessionError::AccessDenied));
}

#[tokio::test]
async fn test_rejected_submit_preserves_draft_and_allows_retry() {
    let mock_server = MockServer::start().await;
    mount_ledger(&mock_server, json!([])).await;

    Mock::given(method("POST"))
        .and(path("/api/scores/submit-score"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"message": "Judging for round 2 is closed"})))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/scores/submit-score"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let session = create_session(&mock_server, AuthContext::new("tok"));
    session.select_round(Round(2)).unwrap();
    session.select_team("T1").unwrap();
    fill_round_two(&session);

    let err = session.submit().await.unwrap_err();
    assert_eq!(err, SessionError::SubmitRejected("Judging for round 2 is closed".to_string()));
    assert_eq!(session.state(), SessionState::Failed(err));

    let draft = session.draft();
    assert_eq!(draft.team(), Some("T1"));
    assert_eq!(draft.value("technicalC"), Some("28"));
    assert_eq!(draft.value("collaborationP"), Some("22"));

    assert!(session.submit().await.is_ok());
}

#[tokio::test]
async fn test_team_board_from_server() {
    let mock_server = MockServer::start().await;
    mount_ledger(
        &mock_server,
        json!([{"teamID": "T1", "round": 1}, {"teamID": "T2", "round": 2}]),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/api/teams"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"teamID": "T1", "teamName": "Alpha"},
            {"teamID": "T2", "teamName": "Beta"},
            {"teamID": "T3", "teamName": "Gamma"}
        ])))
        .mount(&mock_server)
        .await;

    let session = create_session(&mock_server, AuthContext::new("tok"));
    session.select_round(Round(2)).unwrap();

    let board = session.team_board().await.expect("board failed");
    assert!(board.find("T2").unwrap().scored);
    assert!(!board.find("T1").unwrap().scored);
    assert_eq!(board.remaining, 2);
    assert_eq!(session.ledger_status(), LedgerStatus::Ready { scored: 1 });
}

#[tokio::test]
async fn test_unavailable_ledger_still_allows_submit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/scores/submitted-rounds"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/scores/submit-score"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = create_session(&mock_server, AuthContext::new("tok"));
    session.select_round(Round(2)).unwrap();
    session.select_team("T1").unwrap();
    fill_round_two(&session);

    assert!(session.submit().await.is_ok());
    assert!(matches!(
        session.ledger_status(),
        LedgerStatus::Unavailable { scored: 1, .. }
    ));
}
