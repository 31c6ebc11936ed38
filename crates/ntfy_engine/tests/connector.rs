use std::time::Duration;

use ntfy_engine::{EngineSettings, ReqwestConnector, StreamConnector, TransportError};
use tokio::io::AsyncReadExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn connector() -> ReqwestConnector {
    ReqwestConnector::new(&EngineSettings::default()).expect("client")
}

async fn open_err(url: &str, timeout: Option<Duration>) -> TransportError {
    match connector().open(url, timeout).await {
        Ok(_) => panic!("expected {url} to fail"),
        Err(err) => err,
    }
}

#[tokio::test]
async fn connector_returns_streaming_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/alerts/json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("{\"id\":\"a\"}\n{\"id\":\"b\"}\n"),
        )
        .mount(&server)
        .await;

    let url = format!("{}/alerts/json", server.uri());
    let mut reader = connector().open(&url, None).await.expect("open ok");
    let mut body = String::new();
    reader.read_to_string(&mut body).await.expect("read body");
    assert_eq!(body, "{\"id\":\"a\"}\n{\"id\":\"b\"}\n");
}

#[tokio::test]
async fn connector_fails_on_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing/json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let url = format!("{}/missing/json", server.uri());
    assert_eq!(open_err(&url, None).await, TransportError::HttpStatus(404));
}

#[tokio::test]
async fn bounded_requests_time_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(500))
                .set_body_string("slow"),
        )
        .mount(&server)
        .await;

    let url = format!("{}/slow/json", server.uri());
    assert_eq!(
        open_err(&url, Some(Duration::from_millis(50))).await,
        TransportError::Timeout
    );
}

#[tokio::test]
async fn refused_connections_are_connect_errors() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let url = format!("http://127.0.0.1:{port}/alerts/json");
    assert!(matches!(
        open_err(&url, None).await,
        TransportError::Connect(_)
    ));
}

#[tokio::test]
async fn invalid_urls_are_rejected_before_connecting() {
    assert!(matches!(
        open_err("not a url/json", None).await,
        TransportError::InvalidUrl(_)
    ));
}
