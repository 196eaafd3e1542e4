use rt_assistant::Error;
use rt_assistant::transport::backend::{Credential, CredentialBroker, HttpCredentialBroker};
use rt_assistant::transport::peer::{SdpType, SessionDescription};
use rt_assistant::transport::rest::SignalingClient;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn broker(server: &MockServer) -> HttpCredentialBroker {
    HttpCredentialBroker::new(&server.uri(), Duration::from_secs(5)).expect("broker")
}

#[tokio::test]
async fn session_credential_reads_client_secret() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": { "id": "sess_1", "client_secret": { "value": "ek_abc", "expires_at": 1_700_000_000 } }
        })))
        .mount(&server)
        .await;

    let credential = broker(&server).session_credential().await.unwrap();
    assert_eq!(credential.expose(), "ek_abc");
}

#[tokio::test]
async fn session_without_secret_is_credential_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": {} })))
        .mount(&server)
        .await;

    let err = broker(&server).session_credential().await.unwrap_err();
    assert!(matches!(err, Error::Credential(_)));
}

#[tokio::test]
async fn backend_failure_status_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = broker(&server).session_credential().await.unwrap_err();
    assert!(matches!(err, Error::Http(_)));
}

#[tokio::test]
async fn api_key_reads_rapid_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api-keys"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "rapidApiKey": "rk_live" })))
        .mount(&server)
        .await;

    let key = broker(&server).api_key().await.unwrap();
    assert_eq!(key.expose(), "rk_live");
}

#[tokio::test]
async fn exchange_returns_answer_sdp() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/realtimertc"))
        .respond_with(ResponseTemplate::new(201).set_body_string("v=0 remote"))
        .mount(&server)
        .await;

    let client = SignalingClient::new(&format!("{}/v1/realtimertc", server.uri()), "gpt-realtime").unwrap();
    let answer = client
        .exchange(&SessionDescription::offer("v=0 local"), &Credential::new("ek_1"))
        .await
        .unwrap();
    assert_eq!(answer.kind, SdpType::Answer);
    assert_eq!(answer.sdp, "v=0 remote");
}

#[tokio::test]
async fn exchange_rejection_keeps_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/realtimertc"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let client = SignalingClient::new(&format!("{}/v1/realtimertc", server.uri()), "gpt-realtime").unwrap();
    let err = client
        .exchange(&SessionDescription::offer("v=0 local"), &Credential::new("ek_1"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Signaling { status: 401, ref body } if body == "bad key"));
}
