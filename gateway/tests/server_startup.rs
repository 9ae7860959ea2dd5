//! Server Startup Tests
//!
//! Tests for configuration loading and the plain HTTP surface of the app.
//! Requests are driven through the router with `oneshot`, no socket is bound.

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use tower::util::ServiceExt;

use waav_call_bridge::config::YamlConfig;
use waav_call_bridge::{AppState, ConfigError, GreetingPolicy, ServerConfig, create_app};

const BODY_LIMIT: usize = 64 * 1024;

fn config_from_yaml(yaml: &str) -> ServerConfig {
    ServerConfig::from_sources(Some(YamlConfig::parse(yaml).unwrap()), |_| None).unwrap()
}

fn minimal_config() -> ServerConfig {
    config_from_yaml(
        r#"
openai:
  api_key: "sk-test"
"#,
    )
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), BODY_LIMIT).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[test]
fn test_minimal_config_defaults() {
    let config = minimal_config();

    assert_eq!(config.address(), "0.0.0.0:3000");
    assert!(!config.is_tls_enabled());
    assert_eq!(config.media_stream_path, "/twilio-media-stream");
    assert_eq!(config.greeting, GreetingPolicy::WhenNoAgent);
    assert!(!config.loopback_enabled);
}

#[test]
fn test_missing_api_key_rejected() {
    let err = ServerConfig::from_sources(None, |_| None).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::MissingCredential {
            name: "OPENAI_API_KEY"
        }
    ));
}

#[test]
fn test_env_key_is_enough_to_start() {
    let config = ServerConfig::from_sources(None, |name| {
        (name == "OPENAI_API_KEY").then(|| "sk-env".to_string())
    })
    .unwrap();
    assert_eq!(config.openai_api_key, "sk-env");
}

#[test]
fn test_unknown_yaml_key_rejected() {
    assert!(YamlConfig::parse("metrics:\n  enabled: true\n").is_err());
}

#[tokio::test]
async fn test_health_check() {
    let app = create_app(AppState::new(minimal_config()));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
        "nosniff"
    );
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn test_voice_webhook_uses_host_header() {
    let app = create_app(AppState::new(minimal_config()));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/voice")
                .header(header::HOST, "bridge.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/xml"
    );
    let body = body_text(response).await;
    assert!(
        body.contains(r#"<Stream url="wss://bridge.example.com/twilio-media-stream"/>"#),
        "{body}"
    );
}

#[tokio::test]
async fn test_voice_webhook_prefers_public_host() {
    let config = config_from_yaml(
        r#"
openai:
  api_key: "sk-test"
bridge:
  public_host: "calls.example.org"
  media_stream_path: "/media"
"#,
    );
    let app = create_app(AppState::new(config));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/voice")
                .header(header::HOST, "internal:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let body = body_text(response).await;
    assert!(body.contains(r#"url="wss://calls.example.org/media""#), "{body}");
    assert!(!body.contains("internal"));
}

#[tokio::test]
async fn test_unknown_path_refused_with_close() {
    let app = create_app(AppState::new(minimal_config()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/nothing-here")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers().get(header::CONNECTION).unwrap(), "close");
}

#[tokio::test]
async fn test_media_path_requires_websocket_upgrade() {
    let app = create_app(AppState::new(minimal_config()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/twilio-media-stream?mode=loopback")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error(), "{}", response.status());
    assert_ne!(response.status(), StatusCode::NOT_FOUND);
}
