//! Provider adapters against mocked HTTP endpoints

use twolife_core::config::{http_client, NotificationConfig};
use twolife_core::lead::{Lead, LeadFields};
use twolife_core::notify::{ChatWebhook, EmailClient, LeadMailer, TeamChannel};
use twolife_core::verification::risk_assessment::RiskAssessmentVerifier;
use twolife_core::verification::{RejectionReason, SharedSecretVerifier, Verifier, VerifierError};
use twolife_core::NotificationError;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> reqwest::Client {
    http_client(2).expect("client")
}

fn juan() -> Lead {
    Lead::create(LeadFields {
        name: "Juan".into(),
        email: "juan@example.com".into(),
        message: "Busco un sedán".into(),
    })
}

#[tokio::test]
async fn shared_secret_accepts_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/siteverify"))
        .and(body_string_contains("secret=s3cret"))
        .and(body_string_contains("response=tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "hostname": "twolifecar.com"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let verifier =
        SharedSecretVerifier::new("s3cret", format!("{}/siteverify", server.uri()), client());
    let result = verifier.verify("tok", "submit_lead", 0.5).await.expect("verify");

    assert!(result.accepted);
    assert_eq!(result.score, Some(1.0));
    server.verify().await;
}

#[tokio::test]
async fn shared_secret_maps_timeout_or_duplicate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": false,
            "error-codes": ["timeout-or-duplicate"]
        })))
        .mount(&server)
        .await;

    let verifier = SharedSecretVerifier::new("s3cret", server.uri(), client());
    let result = verifier.verify("tok", "submit_lead", 0.5).await.expect("verify");

    assert!(!result.accepted);
    assert_eq!(result.reason, Some(RejectionReason::ExpiredOrDuplicate));
}

#[tokio::test]
async fn shared_secret_provider_error_is_not_a_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let verifier = SharedSecretVerifier::new("s3cret", server.uri(), client());
    let err = verifier.verify("tok", "submit_lead", 0.5).await.unwrap_err();

    assert!(matches!(err, VerifierError::Provider { status: 500, .. }));
}

#[tokio::test]
async fn risk_assessment_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/projects/twolife/assessments"))
        .and(query_param("key", "api-key"))
        .and(body_partial_json(serde_json::json!({
            "event": {"token": "tok", "siteKey": "site", "expectedAction": "submit_lead"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "tokenProperties": {"valid": true, "action": "submit_lead"},
            "riskAnalysis": {"score": 0.9, "reasons": []}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let verifier = RiskAssessmentVerifier::new("twolife", "site", "api-key", server.uri(), client());
    let result = verifier.verify("tok", "submit_lead", 0.5).await.expect("verify");

    assert!(result.accepted);
    assert_eq!(result.score, Some(0.9));
    server.verify().await;
}

#[tokio::test]
async fn risk_assessment_low_score_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "tokenProperties": {"valid": true, "action": "submit_lead"},
            "riskAnalysis": {"score": 0.1}
        })))
        .mount(&server)
        .await;

    let verifier = RiskAssessmentVerifier::new("twolife", "site", "api-key", server.uri(), client());
    let result = verifier.verify("tok", "submit_lead", 0.5).await.expect("verify");

    assert!(!result.accepted);
    assert!(matches!(result.reason, Some(RejectionReason::ScoreTooLow { .. })));
}

#[tokio::test]
async fn chat_webhook_posts_lead_embed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(body_string_contains("Juan"))
        .and(body_string_contains("juan@example.com"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let webhook = ChatWebhook::new(format!("{}/hook", server.uri()), "TwoLifeCar", client());
    webhook.send_lead(&juan()).await.expect("send");
    server.verify().await;
}

#[tokio::test]
async fn chat_webhook_reports_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad embed"))
        .mount(&server)
        .await;

    let webhook = ChatWebhook::new(server.uri(), "TwoLifeCar", client());
    let err = webhook.send_custom("t", "m", 0x0099ff).await.unwrap_err();
    assert!(matches!(
        err,
        NotificationError::Rejected { channel: "chat", status: 400, .. }
    ));
}

#[tokio::test]
async fn email_sends_with_bearer_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/emails"))
        .and(header("authorization", "Bearer re_test"))
        .and(body_partial_json(serde_json::json!({
            "from": "leads@twolifecar.com",
            "to": ["juan@example.com"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "1"})))
        .expect(2)
        .mount(&server)
        .await;

    let config = NotificationConfig::new().with_email(
        format!("{}/emails", server.uri()),
        "re_test",
        "leads@twolifecar.com",
    );
    let email = EmailClient::from_config(&config, client()).expect("configured");

    email.send_confirmation(&juan()).await.expect("confirmation");
    email
        .send_reply(&juan(), "Re: sedán", "Tenemos dos disponibles")
        .await
        .expect("reply");
    server.verify().await;
}
