//! End-to-end submissions through the intake workflow with mocked providers

use std::sync::Arc;

use twolife_core::config::{http_client, IntakeConfig, NotificationConfig, VerificationConfig};
use twolife_core::{IntakeError, LeadIntake, LeadStore, LeadSubmission, RejectionReason, SqliteStore};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn juan() -> LeadSubmission {
    LeadSubmission::new("Juan", "juan@example.com", "Busco un sedán")
        .with_accepted_terms(true)
        .with_token("valid-token")
}

async fn mount_siteverify(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/siteverify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn intake(server: &MockServer, store: Arc<SqliteStore>) -> LeadIntake {
    let verification = VerificationConfig::new()
        .with_shared_secret("s3cret")
        .with_verify_url(format!("{}/siteverify", server.uri()));
    let notification = NotificationConfig::new().with_chat_webhook(format!("{}/hook", server.uri()));

    LeadIntake::from_config(
        store,
        IntakeConfig::new(),
        &verification,
        &notification,
        http_client(2).expect("client"),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn accepted_submission_is_stored_and_announced() {
    let server = MockServer::start().await;
    mount_siteverify(&server, serde_json::json!({"success": true})).await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(body_string_contains("Juan"))
        .and(body_string_contains("juan@example.com"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(SqliteStore::in_memory().expect("store"));
    let workflow = intake(&server, store.clone());

    let (lead, fanout) = workflow.submit_and_dispatch(juan()).await.expect("submit");
    fanout.await.expect("fan-out task");

    let stored = store.list().await.expect("list");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, lead.id);
    assert_eq!(stored[0].name, "Juan");
    assert_eq!(stored[0].email, "juan@example.com");
    assert_eq!(stored[0].message, "Busco un sedán");
    assert_eq!(stored[0].created_at, lead.created_at);

    server.verify().await;
}

#[tokio::test]
async fn expired_token_creates_nothing() {
    let server = MockServer::start().await;
    mount_siteverify(
        &server,
        serde_json::json!({"success": false, "error-codes": ["timeout-or-duplicate"]}),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(SqliteStore::in_memory().expect("store"));
    let err = intake(&server, store.clone()).submit(juan()).await.unwrap_err();

    match err {
        IntakeError::Verification(reason) => {
            assert_eq!(reason, RejectionReason::ExpiredOrDuplicate);
            assert!(reason.user_message().contains("expired"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(store.list().await.expect("list").is_empty());
    server.verify().await;
}

#[tokio::test]
async fn chat_outage_does_not_fail_submission() {
    let server = MockServer::start().await;
    mount_siteverify(&server, serde_json::json!({"success": true})).await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = Arc::new(SqliteStore::in_memory().expect("store"));
    let (lead, fanout) = intake(&server, store.clone())
        .submit_and_dispatch(juan())
        .await
        .expect("submit");
    fanout.await.expect("fan-out task");

    assert_eq!(store.get(&lead.id).await.expect("get"), Some(lead));
}
