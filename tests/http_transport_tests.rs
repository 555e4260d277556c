// HttpTransport against a local HTTP server

use std::io::Read;
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use testomat_reporter::api::{ApiError, Credential, HttpTransport, ReportingClient};
use testomat_reporter::session::{ReportingSession, StartOutcome};

/// What the server saw of one request
#[derive(Debug)]
struct Captured {
    method: String,
    url: String,
    content_type: Option<String>,
    body: String,
}

/// Serve `replies` in order, one request each, and hand back what was received
fn serve(replies: Vec<(u16, &'static str)>) -> (String, mpsc::Receiver<Captured>) {
    let server = tiny_http::Server::http("127.0.0.1:0").expect("bind test server");
    let addr = server
        .server_addr()
        .to_ip()
        .expect("test server listens on an IP address");
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for (status, body) in replies {
            let Ok(mut request) = server.recv() else {
                return;
            };
            let mut received = String::new();
            request
                .as_reader()
                .read_to_string(&mut received)
                .expect("read request body");
            let content_type = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Content-Type"))
                .map(|h| h.value.as_str().to_string());
            let captured = Captured {
                method: request.method().to_string(),
                url: request.url().to_string(),
                content_type,
                body: received,
            };
            let response = tiny_http::Response::from_string(body).with_status_code(status);
            request.respond(response).expect("send response");
            if tx.send(captured).is_err() {
                return;
            }
        }
    });

    (format!("http://{}", addr), rx)
}

fn client(url: &str) -> ReportingClient<HttpTransport> {
    ReportingClient::new(
        url,
        Credential::new("K"),
        HttpTransport::new(Duration::from_secs(5)),
    )
    .expect("valid service url")
}

#[test]
fn test_create_run_over_http() {
    // Arrange
    let (url, seen) = serve(vec![(200, r#"{"uid":"abc"}"#)]);

    // Act
    let body = client(&url).create_run("Run1").expect("create run");

    // Assert
    assert_eq!(body.as_deref(), Some(r#"{"uid":"abc"}"#));
    let request = seen.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(request.method, "POST");
    assert_eq!(request.url, "/api/reporter?api_key=K");
    assert_eq!(request.content_type.as_deref(), Some("application/json"));
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&request.body).unwrap(),
        serde_json::json!({"title": "Run1"})
    );
}

#[test]
fn test_session_lifecycle_over_http() {
    // Arrange
    let (url, seen) = serve(vec![
        (200, r#"{"uid":"abc"}"#),
        (200, "{}"),
        (200, "{}"),
    ]);
    let session = ReportingSession::new(client(&url));
    let event = testomat_reporter::state::TestEvent {
        name: "math::adds".into(),
        meta: Default::default(),
        suite_title: "math".into(),
        file: "src/math.rs".into(),
        outcome: testomat_reporter::state::TestOutcome::Success,
    };

    // Act
    let started = session.start(Some("Run1")).unwrap();
    session.report(&event).unwrap();
    let duration = session.finish().unwrap();

    // Assert
    assert_eq!(started, StartOutcome::Created { uid: "abc".into() });
    assert!(duration.is_some_and(|d| d >= 0.0));
    let urls: Vec<(String, String)> = (0..3)
        .map(|_| seen.recv_timeout(Duration::from_secs(5)).unwrap())
        .map(|c| (c.method, c.url))
        .collect();
    assert_eq!(
        urls,
        [
            ("POST".to_string(), "/api/reporter?api_key=K".to_string()),
            ("POST".to_string(), "/api/reporter/abc/testrun?api_key=K".to_string()),
            ("PUT".to_string(), "/api/reporter/abc?api_key=K".to_string()),
        ]
    );
}

#[test]
fn test_server_error_status() {
    let (url, _seen) = serve(vec![(500, "internal error")]);

    let err = client(&url).create_run("Run1").unwrap_err();

    assert!(matches!(err, ApiError::Server { status: 500, ref body } if body == "internal error"));
}

#[test]
fn test_client_error_status() {
    let (url, _seen) = serve(vec![(403, "forbidden")]);

    let err = client(&url).finish_run("abc", 1.0).unwrap_err();

    assert_eq!(err.status(), Some(403));
    assert!(err.is_client_error());
}

#[test]
fn test_connection_refused_is_transport_error() {
    // Arrange: grab a free port, then release it
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    // Act
    let err = client(&format!("http://127.0.0.1:{}", port))
        .create_run("Run1")
        .unwrap_err();

    // Assert
    assert!(matches!(err, ApiError::Transport(_)));
    assert_eq!(err.status(), None);
}

#[test]
fn test_transport_error_does_not_carry_api_key() {
    // Arrange
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = ReportingClient::new(
        &format!("http://127.0.0.1:{}", port),
        Credential::new("SUPERSECRET"),
        HttpTransport::default(),
    )
    .unwrap();

    // Act
    let err = client.create_run("Run1").unwrap_err();

    // Assert
    assert!(matches!(err, ApiError::Transport(_)));
    assert!(!err.to_string().contains("SUPERSECRET"));
    assert!(!format!("{:?}", err).contains("SUPERSECRET"));
    assert!(!format!("{:#}", anyhow::Error::new(err)).contains("SUPERSECRET"));
}
