use axum::http::StatusCode;
use axum_test::{TestResponse, TestServer};
use rusqlite::Connection;
use serde_json::json;

use crate::{AppState, auth::TokenResponse, build_router, endpoints};

/// The password used for every user created by [register_and_log_in].
pub(crate) const TEST_PASSWORD: &str = "hunter2";

/// Create app state backed by an in-memory database.
///
/// Uses the cheapest bcrypt cost to keep the tests fast.
pub(crate) fn get_test_state() -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not create in-memory SQLite database");

    AppState::new(
        connection,
        "foobar",
        "Etc/UTC",
        std::env::temp_dir().join("ledger_rs_test_uploads"),
    )
    .expect("Could not create app state")
    .with_hash_cost(4)
}

pub(crate) fn get_test_server(state: AppState) -> TestServer {
    TestServer::new(build_router(state))
}

/// Register `username` with [TEST_PASSWORD] and return a bearer token for them.
pub(crate) async fn register_and_log_in(server: &TestServer, username: &str) -> String {
    server
        .post(endpoints::REGISTER)
        .json(&json!({
            "username": username,
            "password": TEST_PASSWORD,
            "repeat_password": TEST_PASSWORD,
        }))
        .await
        .assert_status_ok();

    let response = server
        .post(endpoints::LOG_IN)
        .form(&[("username", username), ("password", TEST_PASSWORD)])
        .await;
    response.assert_status_ok();

    response.json::<TokenResponse>().access_token
}

/// Assert that `response` is an error with the status `status` and the message `detail`.
#[track_caller]
pub(crate) fn assert_detail(response: &TestResponse, status: StatusCode, detail: &str) {
    response.assert_status(status);
    response.assert_json(&json!({ "detail": detail }));
}

/// Assert that `response` is a JSON error with `status` whose detail mentions `needle`.
pub(crate) fn assert_detail_contains(response: &TestResponse, status: StatusCode, needle: &str) {
    response.assert_status(status);
    let body: serde_json::Value = response.json();
    let detail = body["detail"].as_str().unwrap_or_default();
    assert!(
        detail.contains(needle),
        "want a detail containing {needle:?}, got {body}"
    );
}
