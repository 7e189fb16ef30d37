use serde_json::json;
use tfstate_lookup::backends::http::HttpBackend;
use tfstate_lookup::backends::{Backend, BackendConfig};
use tfstate_lookup::{BackendError, BackendRegistry, TfState, TfstateError};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn http_shell(config: serde_json::Value) -> Vec<u8> {
    json!({"version": 3, "backend": {"type": "http", "config": config}})
        .to_string()
        .into_bytes()
}

fn remote_state() -> serde_json::Value {
    json!({
        "version": 4,
        "resources": [{
            "mode": "managed",
            "type": "aws_lb",
            "name": "public",
            "instances": [{"attributes": {"dns_name": "public-123.elb.amazonaws.com"}}]
        }]
    })
}

#[tokio::test]
async fn test_read_state_through_http_backend() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/state/app"))
        .respond_with(ResponseTemplate::new(200).set_body_json(remote_state()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let shell = http_shell(json!({"address": format!("{}/state/app", mock_server.uri())}));
    let state = TfState::read(&shell, None, &BackendRegistry::default())
        .await
        .unwrap();

    assert_eq!(
        state.lookup("aws_lb.public.dns_name").unwrap().to_string(),
        "public-123.elb.amazonaws.com"
    );
}

#[tokio::test]
async fn test_http_backend_basic_auth() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/state"))
        .and(header("authorization", "Basic YWRtaW46c2VjcmV0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(remote_state()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config: BackendConfig = serde_json::from_value(json!({
        "type": "http",
        "config": {
            "address": format!("{}/state", mock_server.uri()),
            "username": "admin",
            "password": "secret",
            "skip_cert_verification": false
        }
    }))
    .unwrap();

    let backend = HttpBackend::new().unwrap();
    let bytes = backend.read_state(&config, "default").await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, remote_state());
}

#[tokio::test]
async fn test_http_backend_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/state"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let shell = http_shell(json!({"address": format!("{}/state", mock_server.uri())}));
    let result = TfState::read(&shell, None, &BackendRegistry::default()).await;

    match result {
        Err(TfstateError::Backend(BackendError::Http { status, .. })) => assert_eq!(status, 404),
        other => panic!("expected Http error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_http_backend_rejects_workspaces() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(remote_state()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let shell = http_shell(json!({"address": mock_server.uri()}));
    let result = TfState::read(&shell, Some("staging"), &BackendRegistry::default()).await;

    assert!(matches!(
        result,
        Err(TfstateError::Backend(BackendError::WorkspacesUnsupported { .. }))
    ));
}

#[tokio::test]
async fn test_http_backend_requires_address() {
    let shell = http_shell(json!({"username": "admin"}));
    let result = TfState::read(&shell, None, &BackendRegistry::default()).await;

    assert!(matches!(
        result,
        Err(TfstateError::Backend(BackendError::Configuration(_)))
    ));
}
