/// HTTP client tests against a local `tiny_http` panel stub.
///
/// Each test serves exactly one canned response and checks both what the
/// client sent and how it read the answer.
use std::io::Read;
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use smartsni_panel::api::{HealthStatus, HttpPanelClient, NewUser, PanelApi, SESSION_HEADER};
use smartsni_panel::error::ApiError;
use tiny_http::{Header, Response, Server};

/// What the stub saw of the one request it served.
#[derive(Debug)]
struct Seen {
    method: String,
    url: String,
    session: Option<String>,
    body: String,
}

/// Serve one request with `status` and `body`, returning the client's base
/// URL and a handle yielding the captured request.
fn serve_once(status: u16, body: &'static str) -> (String, JoinHandle<Seen>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();

    let handle = thread::spawn(move || {
        let mut request = server.recv().unwrap();
        let session = request
            .headers()
            .iter()
            .find(|h| h.field.equiv(SESSION_HEADER))
            .map(|h| h.value.as_str().to_string());
        let mut received = String::new();
        request.as_reader().read_to_string(&mut received).unwrap();

        let seen = Seen {
            method: request.method().as_str().to_string(),
            url: request.url().to_string(),
            session,
            body: received,
        };
        let content_type = Header::from_bytes("Content-Type", "application/json").unwrap();
        let response = Response::from_string(body)
            .with_status_code(status)
            .with_header(content_type);
        request.respond(response).unwrap();
        seen
    });

    (format!("http://{addr}"), handle)
}

fn client(base_url: &str) -> HttpPanelClient {
    HttpPanelClient::new(base_url, Duration::from_secs(5))
}

#[test]
fn login_posts_credentials_without_session_header() {
    let (url, handle) = serve_once(200, r#"{"session_id":"abc","username":"admin"}"#);

    let resp = client(&url).login("admin", "pw").unwrap();
    let seen = handle.join().unwrap();

    assert_eq!(resp.session_id, "abc");
    assert_eq!(resp.username.as_deref(), Some("admin"));
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.url, "/panel/api/login");
    assert_eq!(seen.session, None);
    let body: serde_json::Value = serde_json::from_str(&seen.body).unwrap();
    assert_eq!(body, serde_json::json!({"username": "admin", "password": "pw"}));
}

#[test]
fn authenticated_requests_send_session_header() {
    let (url, handle) = serve_once(
        200,
        r#"{"doh_queries":1234,"dot_queries":5,"sni_connections":6,"cache_hits":3,"cache_misses":1}"#,
    );

    let metrics = client(&url).metrics(Some("sess-1")).unwrap();
    let seen = handle.join().unwrap();

    assert_eq!(seen.method, "GET");
    assert_eq!(seen.url, "/panel/api/metrics");
    assert_eq!(seen.session.as_deref(), Some("sess-1"));
    assert_eq!(metrics.doh_queries, 1234);
    assert_eq!(metrics.errors, 0);
    assert_eq!(metrics.hit_rate_display(), "75.0%");
}

#[test]
fn empty_session_sends_no_header() {
    let (url, handle) = serve_once(401, r#"{"error":"Unauthorized"}"#);

    let _ = client(&url).domains(Some(""));
    let seen = handle.join().unwrap();

    assert_eq!(seen.session, None);
}

#[test]
fn error_field_becomes_the_message() {
    let (url, handle) = serve_once(401, r#"{"error":"Invalid credentials"}"#);

    let err = client(&url).login("admin", "wrong").unwrap_err();
    handle.join().unwrap();

    assert_eq!(
        err,
        ApiError::Status {
            status: 401,
            message: "Invalid credentials".to_string()
        }
    );
}

#[test]
fn plain_text_error_body_is_kept() {
    let (url, handle) = serve_once(500, "database is locked");

    let err = client(&url).reload(Some("sess-1")).unwrap_err();
    handle.join().unwrap();

    assert_eq!(
        err,
        ApiError::Status {
            status: 500,
            message: "database is locked".to_string()
        }
    );
}

#[test]
fn empty_error_body_uses_fallback() {
    let (url, handle) = serve_once(404, "");

    let err = client(&url).remove_domain(Some("sess-1"), "gone.example").unwrap_err();
    let seen = handle.join().unwrap();

    assert_eq!(err.status(), Some(404));
    assert_eq!(
        err,
        ApiError::Status {
            status: 404,
            message: "Failed to remove domain".to_string()
        }
    );
    assert_eq!(seen.url, "/panel/api/domains/remove");
    assert!(seen.body.contains("gone.example"));
}

#[test]
fn closed_port_is_a_transport_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let err = client(&format!("http://127.0.0.1:{port}"))
        .health(None)
        .unwrap_err();

    assert!(matches!(err, ApiError::Transport(_)));
    assert_eq!(err.status(), None);
}

#[test]
fn health_reads_uptime_and_status() {
    let (url, handle) = serve_once(
        200,
        r#"{"version":"1.4.0","uptime":90061.5,"status":"healthy"}"#,
    );

    let health = client(&url).health(Some("sess-1")).unwrap();
    handle.join().unwrap();

    assert_eq!(health.version, "1.4.0");
    assert_eq!(health.status, HealthStatus::Healthy);
    assert!((health.uptime_seconds - 90_061.5).abs() < f64::EPSILON);
}

#[test]
fn null_user_list_reads_as_empty() {
    let (url, handle) = serve_once(200, r#"{"users":null,"count":0}"#);

    let users = client(&url).users(Some("sess-1")).unwrap();
    handle.join().unwrap();

    assert!(users.is_empty());
}

#[test]
fn create_user_sends_form_fields() {
    let (url, handle) = serve_once(
        200,
        r#"{"user":{"id":"u1","name":"alice","description":"laptop","ips":null,"max_ips":3,
            "expires_at":"2026-07-01T00:00:00Z","is_active":true,"usage_count":0},
            "register_url":"/register?token=u1"}"#,
    );

    let created = client(&url)
        .create_user(
            Some("sess-1"),
            &NewUser {
                name: "alice".to_string(),
                description: "laptop".to_string(),
                max_ips: 3,
                valid_days: 30,
            },
        )
        .unwrap();
    let seen = handle.join().unwrap();

    assert_eq!(created.user.id, "u1");
    assert!(created.user.ips.is_empty());
    assert_eq!(seen.url, "/panel/api/users/create");
    let body: serde_json::Value = serde_json::from_str(&seen.body).unwrap();
    assert_eq!(
        body,
        serde_json::json!({"name": "alice", "description": "laptop", "max_ips": 3, "valid_days": 30})
    );
}

#[test]
fn ack_endpoints_accept_any_success_body() {
    let (url, handle) = serve_once(200, r#"{"success":true,"message":"Domain added"}"#);

    client(&url).add_domain(Some("sess-1"), "example.org").unwrap();
    handle.join().unwrap();
}

#[test]
fn trailing_slash_in_base_url_is_ignored() {
    let (url, handle) = serve_once(200, r#"{"username":"admin"}"#);

    let resp = client(&format!("{url}/")).validate(Some("sess-1")).unwrap();
    let seen = handle.join().unwrap();

    assert_eq!(resp.username, "admin");
    assert_eq!(seen.url, "/panel/api/validate");
}
