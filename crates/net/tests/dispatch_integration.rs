//! End-to-end dispatch pipeline tests against a mock HTTP server.

mod support;

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use relay_net::{
    Config, Dispatcher, Method, MultipartField, MultipartForm, NetworkError, RefreshOptions,
    TracingSink,
};
use support::{RecordingSink, TestEndpoint};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn dispatcher_with_sink(sink: Arc<RecordingSink>) -> Dispatcher {
    Dispatcher::builder()
        .config(Config::new("test-service").timeout(Duration::from_secs(5)))
        .event_sink(sink)
        .build()
}

#[tokio::test]
async fn successful_request_returns_body_and_event_pair() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let sink = RecordingSink::new();
    let dispatcher = dispatcher_with_sink(sink.clone());

    let body = dispatcher.send(&TestEndpoint::get(&server.uri(), "/v1/users")).await.unwrap();

    assert_eq!(body, b"ok");
    assert_eq!(sink.kinds(), vec!["initial", "request", "response:200"]);
}

#[tokio::test]
async fn non_success_status_carries_a_response_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
        .expect(1)
        .mount(&server)
        .await;

    let sink = RecordingSink::new();
    let dispatcher = dispatcher_with_sink(sink.clone());

    let err = dispatcher.send(&TestEndpoint::get(&server.uri(), "/v1/users")).await.unwrap_err();

    let snapshot = err.response().expect("snapshot");
    assert_eq!(snapshot.status, 404);
    assert_eq!(snapshot.body, b"missing");
    assert_eq!(sink.kinds(), vec!["initial", "request", "response:404", "error"]);
}

#[tokio::test]
async fn endpoint_headers_override_config_extras() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::builder()
        .config(
            Config::new("test-service")
                .extra_header("Authorization", "config-token")
                .extra_header("X-Trace", "trace-1"),
        )
        .build();

    let endpoint =
        TestEndpoint::get(&server.uri(), "/v1/users").header("Authorization", "endpoint-token");
    dispatcher.send(&endpoint).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let received = &requests[0];
    assert_eq!(received.headers.get("Authorization").unwrap().to_str().unwrap(), "endpoint-token");
    assert_eq!(received.headers.get("X-Trace").unwrap().to_str().unwrap(), "trace-1");
}

#[tokio::test]
async fn connection_failure_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener); // release the port so the request fails with ECONNREFUSED

    let sink = RecordingSink::new();
    let dispatcher = dispatcher_with_sink(sink.clone());
    let endpoint = TestEndpoint::get(&format!("http://{addr}"), "/v1/users");

    let err = dispatcher.send(&endpoint).await.unwrap_err();

    assert!(matches!(err, NetworkError::Transport(_)));
    assert_eq!(sink.kinds(), vec!["initial", "request", "error"]);
}

#[tokio::test]
async fn multipart_request_reaches_the_server_intact() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let mut endpoint = TestEndpoint::post(&server.uri(), "/upload");
    endpoint.multipart = Some(MultipartForm::new(vec![
        MultipartField::text("caption", "holiday"),
        MultipartField::file("file", vec![0x89, 0x50, 0x4E, 0x47], "pic.png", "image/png"),
    ]));

    let dispatcher = Dispatcher::new(Config::new("test-service"));
    dispatcher.send(&endpoint).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let received = &requests[0];
    let content_type = received.headers.get("Content-Type").unwrap().to_str().unwrap();
    assert!(content_type.starts_with("multipart/form-data; boundary="));

    let boundary = content_type.split("boundary=").nth(1).unwrap();
    let body = String::from_utf8_lossy(&received.body);
    assert!(body.contains(&format!("--{boundary}\r\n")));
    assert!(body.contains("name=\"caption\""));
    assert!(body.contains("filename=\"pic.png\""));
    assert!(body.ends_with(&format!("--{boundary}--\r\n")));
}

#[tokio::test]
async fn first_attempt_success_never_touches_the_refresh_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/protected"))
        .respond_with(ResponseTemplate::new(200).set_body_string("fine"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/refresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::builder()
        .config(Config::new("test-service"))
        .refresh(
            RefreshOptions::new(TestEndpoint::post(&server.uri(), "/refresh"))
                .cooldown(Duration::from_millis(10)),
        )
        .build();

    let body = dispatcher.send(&TestEndpoint::get(&server.uri(), "/protected")).await.unwrap();
    assert_eq!(body, b"fine");
}

#[tokio::test]
async fn tracing_sink_observes_a_full_request_cycle() {
    // try_init: another test in the binary may have installed a subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter("relay_net=debug")
        .with_test_writer()
        .try_init();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"ok"}"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::builder()
        .config(Config::new("traced-service"))
        .event_sink(Arc::new(TracingSink::new()))
        .build();

    let body = dispatcher.send(&TestEndpoint::get(&server.uri(), "/ok")).await.unwrap();
    assert_eq!(body, br#"{"status":"ok"}"#);

    let err = dispatcher.send(&TestEndpoint::get(&server.uri(), "/missing")).await.unwrap_err();
    assert_eq!(err.response().map(|snapshot| snapshot.status), Some(404));
}

#[tokio::test]
async fn query_values_are_percent_encoded_on_the_wire() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let endpoint = TestEndpoint::get(&server.uri(), "/search");
    let mut query = relay_net::QueryMap::new();
    query.insert("q".into(), "a b".into());
    let endpoint = QueryEndpoint { inner: endpoint, query };

    let dispatcher = Dispatcher::new(Config::new("test-service"));
    dispatcher.send(&endpoint).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), Some("q=a%20b"));
}

struct QueryEndpoint {
    inner: TestEndpoint,
    query: relay_net::QueryMap,
}

impl relay_net::Endpoint for QueryEndpoint {
    fn scheme(&self) -> relay_net::Scheme {
        self.inner.scheme
    }

    fn host(&self) -> &str {
        &self.inner.host
    }

    fn path(&self) -> &str {
        &self.inner.path
    }

    fn port(&self) -> Option<u16> {
        self.inner.port
    }

    fn method(&self) -> Method {
        self.inner.method
    }

    fn query(&self) -> Option<relay_net::QueryMap> {
        Some(self.query.clone())
    }
}
