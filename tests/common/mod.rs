//! Common test utilities
//!
//! The client is blocking, so tests are plain `#[test]` functions. The mock
//! server is started and configured through a tokio runtime owned by the
//! harness; the client itself runs on the test thread.

#![allow(dead_code)]

use nessus_result::api::Session;
use nessus_result::config::Credentials;
use serde_json::{json, Value};
use tokio::runtime::Runtime;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SESSION_COOKIE: &str = "token=3f9a1c";

pub struct MockApi {
    // declared first so it is dropped (and verified) while the runtime lives
    pub server: MockServer,
    rt: Runtime,
}

impl MockApi {
    pub fn start() -> Self {
        let rt = Runtime::new().expect("tokio runtime");
        let server = rt.block_on(MockServer::start());
        MockApi { server, rt }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn mount(&self, mock: Mock) {
        self.rt.block_on(mock.mount(&self.server));
    }

    /// Accept any login and hand out the session cookie.
    pub fn mount_login(&self) {
        self.mount(
            Mock::given(method("POST"))
                .and(path("/login"))
                .respond_with(
                    reply(json!({ "token": "3f9a1c" }))
                        .insert_header("Set-Cookie", format!("{SESSION_COOKIE}; Path=/")),
                ),
        );
    }

    pub fn login(&self) -> Session {
        self.mount_login();
        Session::login(&self.uri(), &credentials(), false).expect("login")
    }

    pub fn mount_folders(&self, folders: Value) {
        self.mount(
            Mock::given(method("POST"))
                .and(path("/tag/list"))
                .respond_with(reply(json!({ "tags": folders }))),
        );
    }

    pub fn mount_results(&self, results: Value) {
        self.mount(
            Mock::given(method("POST"))
                .and(path("/result/list"))
                .respond_with(reply(json!({ "result": results }))),
        );
    }
}

pub fn credentials() -> Credentials {
    Credentials {
        username: "admin".into(),
        password: "s3cret".into(),
    }
}

/// Wrap `contents` in the server's reply envelope.
pub fn reply(contents: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "reply": { "status": "OK", "contents": contents }
    }))
}

pub fn sample_folders() -> Value {
    json!([
        { "id": 2, "name": "My Scans" },
        { "id": 5, "name": "DMZ" },
    ])
}

/// Three completed results and one still running.
pub fn sample_results() -> Value {
    json!([
        {
            "id": "r-1", "name": "weekly-dmz", "timestamp": 1380000000,
            "status": "completed", "tags": [5]
        },
        {
            "id": "r-2", "name": "weekly-lan", "timestamp": "1380086400",
            "status": "completed", "tags": [{ "id": 2 }]
        },
        {
            "id": "r-3", "name": "adhoc", "timestamp": 1380172800,
            "status": "completed", "tags": [2]
        },
        {
            "id": "r-4", "name": "nightly", "timestamp": 1380259200,
            "status": "running", "tags": [2]
        },
    ])
}
