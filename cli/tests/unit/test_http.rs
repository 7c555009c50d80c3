//! REST client and live log transport tests against a mock platform

use std::sync::{Arc, Mutex};

use api_client::models::DeploymentState;
use futures::StreamExt;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use clever_cli::errors::CliError;
use clever_cli::http::logs::LogQuery;
use clever_cli::http::HttpClient;
use clever_cli::stream::StreamFactory;
use clever_cli::watch::relay::{LiveRelay, RelayOptions, RelayOutcome, StreamEnvelope};
use clever_cli::watch::{AppTarget, DeploymentApi, LogStreams};

use crate::fakes::app;

fn token() -> SecretString {
    SecretString::from("s3cr3t")
}

const SSE_BODY: &str = "event: APPLICATION_LOG\n\
data: {\"_source\": {\"@timestamp\": \"2024-05-01T10:00:00Z\", \"@message\": \"build started\"}}\n\
\n\
event: PING\n\
data: \n\
\n";

#[tokio::test]
async fn test_list_deployments() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/organisations/orga_1/applications/app_1/deployments"))
        .and(query_param("limit", "5"))
        .and(header("Authorization", "Bearer s3cr3t"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "uuid": "d1", "commit": "abc123", "state": "WIP", "action": "DEPLOY", "cause": "git", "date": 1714557600000_i64 },
            { "uuid": "d0", "commit": "abc123", "state": "CANCELLED" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri(), token()).unwrap();
    let deployments = client.list_deployments(&app(), Some(5)).await.unwrap();

    assert_eq!(deployments.len(), 2);
    assert_eq!(deployments[0].id, "d1");
    assert_eq!(deployments[0].state, DeploymentState::Wip);
    assert!(deployments[0].date.is_some());
    assert_eq!(deployments[1].state, DeploymentState::Cancelled);
}

#[tokio::test]
async fn test_user_owned_application_paths() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/self/applications/app_1/deployments/d1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(
            { "uuid": "d1", "commit": "abc123", "state": "OK" }
        )))
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri(), token()).unwrap();
    let deployment = client
        .get_deployment(&AppTarget::new("user_1", "app_1"), "d1")
        .await
        .unwrap();

    assert_eq!(deployment.state, DeploymentState::Ok);
}

#[tokio::test]
async fn test_redeploy_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/organisations/orga_1/applications/app_1/instances"))
        .and(query_param("commit", "abc123"))
        .and(query_param("useCache", "no"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "deploymentId": "d9" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri(), token()).unwrap();
    let response = client.redeploy(&app(), Some("abc123"), false).await.unwrap();

    assert_eq!(response.deployment_id, "d9");
}

#[tokio::test]
async fn test_application_commit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/organisations/orga_1/applications/app_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(
            { "id": "app_1", "name": "shop", "commitId": "abc123" }
        )))
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri(), token()).unwrap();
    let application = client.get_application(&app()).await.unwrap();

    assert_eq!(application.name, "shop");
    assert_eq!(application.commit_id.as_deref(), Some("abc123"));
}

#[tokio::test]
async fn test_api_errors_are_not_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!(
            { "id": 2001, "message": "Unauthorized", "type": "error" }
        )))
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri(), token()).unwrap();
    let err = client.list_deployments(&app(), None).await.unwrap_err();

    assert!(matches!(&err, CliError::ApiError { status: 401, message } if message == "Unauthorized"));
    assert!(!err.is_transient());
    assert!(!err.is_reconnectable());
}

#[tokio::test]
async fn test_unreachable_api_is_transient() {
    let client = HttpClient::new("http://127.0.0.1:1", token()).unwrap();
    let err = client.list_deployments(&app(), None).await.unwrap_err();

    assert!(matches!(err, CliError::NetworkError(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_old_logs_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/logs/app_1"))
        .and(query_param("filter", "error"))
        .and(query_param("deployment_id", "d1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "_source": { "@timestamp": "2024-05-01T10:00:01Z", "@message": "second" } },
            { "_source": { "@timestamp": "2024-05-01T10:00:00Z", "@message": "first" } }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri(), token()).unwrap();
    let query = LogQuery {
        filter: Some("error".to_string()),
        deployment_id: Some("d1".to_string()),
        ..LogQuery::default()
    };
    let lines = client.get_old_logs("app_1", &query).await.unwrap();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].message(), "second");
}

#[tokio::test]
async fn test_sse_deployment_logs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/logs/logs-sse/app_1"))
        .and(query_param("deployment_id", "d1"))
        .and(header("Accept", "text/event-stream"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/event-stream")
                .set_body_string(SSE_BODY),
        )
        .expect(1)
        .mount(&server)
        .await;

    let streams = StreamFactory::new(&server.uri(), token()).unwrap();
    let connector = streams.deployment_logs(&app(), "d1");
    let envelopes: Vec<_> = connector.connect().await.unwrap().collect().await;

    assert_eq!(envelopes.len(), 2);
    assert!(matches!(&envelopes[0], Ok(StreamEnvelope::Log(line)) if line.message() == "build started"));
    assert!(matches!(envelopes[1], Ok(StreamEnvelope::Ping)));
}

#[tokio::test]
async fn test_sse_rejected_connection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&server)
        .await;

    let streams = StreamFactory::new(&server.uri(), token()).unwrap();
    let err = match streams.deployment_logs(&app(), "d1").connect().await {
        Ok(_) => panic!("connection should be rejected"),
        Err(e) => e,
    };

    assert!(matches!(err, CliError::ApiError { status: 403, .. }));
    assert!(!err.is_reconnectable());
}

#[tokio::test]
async fn test_relay_over_sse_stops_when_closed_by_handler() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/logs/logs-sse/app_1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/event-stream")
                .set_body_string(SSE_BODY),
        )
        .mount(&server)
        .await;

    let streams = StreamFactory::new(&server.uri(), token()).unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();

    let relay = LiveRelay::open(
        streams.app_logs("app_1", &LogQuery::default()),
        RelayOptions::default(),
        move |envelope, closer| {
            if let StreamEnvelope::Log(line) = envelope {
                sink.lock().unwrap().push(line.message().to_string());
                closer.close("got one");
            }
        },
    );

    assert!(matches!(relay.join().await, RelayOutcome::Closed(reason) if reason == "got one"));
    assert_eq!(*seen.lock().unwrap(), vec!["build started"]);
}
