//! Client integration tests against a mock notipy server

use std::fs;
use std::path::Path;

use notipy::{
    BackendType, ClientConfig, Error, ErrorKind, MessageBody, Notification, NotificationPayload,
    Notifier, NotipyClient,
};
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEND_PATH: &str = "/api/v1/notifications/send";

fn client_for(server: &MockServer, template_dir: Option<&Path>) -> NotipyClient {
    let address = server.address();
    let mut config = ClientConfig::new(address.ip().to_string(), address.port());
    if let Some(dir) = template_dir {
        config = config.with_template_dir(dir);
    }
    NotipyClient::new(config)
}

async fn expect_payload(server: &MockServer, payload: serde_json::Value, status: u16, body: &str) {
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .and(header("content-type", "application/json"))
        .and(body_json(payload))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_send_posts_payload() {
    let server = MockServer::start().await;
    expect_payload(
        &server,
        json!({ "backend": "telegram", "recipient": "foouser", "message": "hello" }),
        200,
        r#"{"message":"ok"}"#,
    )
    .await;

    let client = client_for(&server, None);
    client
        .send(&BackendType::Telegram, "foouser", "hello")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_send_custom_backend_uses_wire_value() {
    let server = MockServer::start().await;
    expect_payload(
        &server,
        json!({ "backend": "matrix", "recipient": "@ops", "message": "disk full" }),
        200,
        "{}",
    )
    .await;

    let client = client_for(&server, None);
    client
        .send(&BackendType::Custom("matrix".into()), "@ops", "disk full")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_send_fails_on_server_error() {
    let server = MockServer::start().await;
    expect_payload(
        &server,
        json!({ "backend": "telegram", "recipient": "foouser", "message": "hello" }),
        500,
        r#"{"message": "boom"}"#,
    )
    .await;

    let client = client_for(&server, None);
    let err = client
        .send(&BackendType::Telegram, "foouser", "hello")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Api);
    assert!(err.to_string().contains("boom"));
}

#[tokio::test]
async fn test_send_notification_request_posts_serialized_payload() {
    let server = MockServer::start().await;
    expect_payload(
        &server,
        json!({ "backend": "telegram_group", "recipient": "team", "message": "deploy done" }),
        200,
        "{}",
    )
    .await;

    let client = client_for(&server, None);
    let payload = NotificationPayload::new(&BackendType::TelegramGroup, "team", "deploy done");
    client.send_notification_request(&payload).await.unwrap();
}

#[tokio::test]
async fn test_send_templated_posts_rendered_message() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("greeting.tmpl"), "Hello {{ name }}.\n").unwrap();

    let server = MockServer::start().await;
    expect_payload(
        &server,
        json!({ "backend": "telegram", "recipient": "foouser", "message": "Hello Jon." }),
        200,
        "{}",
    )
    .await;

    let client = client_for(&server, Some(dir.path()));
    client
        .send_templated(
            &BackendType::Telegram,
            "foouser",
            "greeting",
            &json!({ "name": "Jon" }),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_send_templated_propagates_render_error() {
    let dir = tempdir().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server, Some(dir.path()));
    let err = client
        .send_templated(&BackendType::Telegram, "foouser", "missing", &json!({}))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::TemplateNotFound(_)));
}

#[tokio::test]
async fn test_send_templated_without_template_dir_is_not_wrapped() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client
        .send_templated(
            &BackendType::Telegram,
            "foouser",
            "greeting",
            &json!({ "name": "Jon" }),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::TemplateDirNotSet));
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[tokio::test]
async fn test_send_templated_fails_on_server_error() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("alert.tmpl"), "{{ level }}: {{ text }}").unwrap();

    let server = MockServer::start().await;
    expect_payload(
        &server,
        json!({ "backend": "telegram", "recipient": "ops", "message": "warn: cpu hot" }),
        400,
        r#"{"message": "unknown recipient"}"#,
    )
    .await;

    let client = client_for(&server, Some(dir.path()));
    let err = client
        .send_templated(
            &BackendType::Telegram,
            "ops",
            "alert",
            &json!({ "level": "warn", "text": "cpu hot" }),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NotificationSend { .. }));
    assert!(err.to_string().contains("unknown recipient"));
}

#[tokio::test]
async fn test_notify_dispatches_text_and_template_bodies() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("build.tmpl"), "Build {{ id }} {{ result }}").unwrap();

    let server = MockServer::start().await;
    expect_payload(
        &server,
        json!({ "backend": "telegram", "recipient": "ci", "message": "plain" }),
        200,
        "{}",
    )
    .await;
    expect_payload(
        &server,
        json!({ "backend": "telegram", "recipient": "ci", "message": "Build 7 passed" }),
        200,
        "{}",
    )
    .await;

    let client = client_for(&server, Some(dir.path()));
    client
        .notify(Notification {
            backend: BackendType::Telegram,
            recipient: "ci".into(),
            body: MessageBody::Text("plain".into()),
        })
        .await
        .unwrap();
    client
        .notify(Notification {
            backend: BackendType::Telegram,
            recipient: "ci".into(),
            body: MessageBody::Template {
                name: "build".into(),
                variables: json!({ "id": 7, "result": "passed" }),
            },
        })
        .await
        .unwrap();
}

#[test]
fn test_render_template_reads_tmpl_file() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("hello.tmpl"), "Hello {{ name }}.").unwrap();

    let client = NotipyClient::new(ClientConfig::new("foo", 1234).with_template_dir(dir.path()));
    let rendered = client
        .render_template("hello", &json!({ "name": "Jon" }))
        .unwrap();

    assert_eq!(rendered, "Hello Jon.");
}

#[test]
fn test_render_template_drops_trailing_newline_of_file() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("hello.tmpl"), "Hello {{ name }}.\n").unwrap();

    let client = NotipyClient::new(ClientConfig::new("foo", 1234).with_template_dir(dir.path()));
    let rendered = client
        .render_template("hello", &json!({ "name": "Jon" }))
        .unwrap();

    assert_eq!(rendered, "Hello Jon.");
}

#[test]
fn test_render_template_missing_dir_is_not_found() {
    let client = NotipyClient::new(ClientConfig::new("foo", 1234).with_template_dir("/foobarfoo"));
    let err = client.render_template("nonexistent", &()).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_render_template_dir_must_be_a_directory() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("not-a-dir");
    fs::write(&file, "x").unwrap();

    let client = NotipyClient::new(ClientConfig::new("foo", 1234).with_template_dir(&file));
    let err = client.render_template("bar", &()).unwrap_err();

    assert!(matches!(err, Error::InvalidTemplateDir(_)));
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_render_template_checks_dir_before_name() {
    let client = NotipyClient::new(ClientConfig::new("foo", 1234));
    let err = client.render_template("", &()).unwrap_err();

    assert!(matches!(err, Error::TemplateDirNotSet));
}
