//! This file defines the route for handling log-in requests.
//! The rest of the auth module handles the lower level password and token logic.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    auth::{PasswordHash, TokenKeys, encode_token},
    db::lock_connection,
    extract::{Form, Json},
    user::{User, get_user_by_username, update_password},
};

/// The state needed to perform a login.
#[derive(Clone)]
pub struct LoginState {
    /// The keys for signing bearer tokens.
    pub token_keys: TokenKeys,
    /// The duration for which issued tokens are valid.
    pub token_duration: Duration,
    /// The bcrypt cost used when upgrading legacy password hashes.
    pub hash_cost: u32,
    /// The connection to the application's database.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            token_keys: state.token_keys.clone(),
            token_duration: state.token_duration,
            hash_cost: state.hash_cost,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The raw data entered by the user in the log-in form.
///
/// The password is stored as a plain string. There is no need for validation here since
/// it will be compared against the password hash in the database.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInData {
    /// The name of a registered user.
    pub username: String,
    /// The user's password in plain text.
    pub password: String,
}

/// The response body for a successful log-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// A signed JWT to send as `Authorization: Bearer <token>`.
    pub access_token: String,
    /// Always "bearer".
    pub token_type: String,
}

/// Handler for log-in requests via the POST method.
///
/// On success, a bearer token for the user is returned. Legacy password hashes
/// are replaced with a bcrypt hash of the same password.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The username does not exist or the password is not correct.
/// - An internal error occurred when verifying the password.
pub async fn post_log_in(
    State(state): State<LoginState>,
    Form(user_data): Form<LogInData>,
) -> Result<Json<TokenResponse>, Error> {
    let user = verify_credentials(&user_data, &state)?;
    let access_token = encode_token(&user.username, state.token_duration, &state.token_keys)?;

    tracing::info!("User {} logged in", user.id);

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_owned(),
    }))
}

fn verify_credentials(user_data: &LogInData, state: &LoginState) -> Result<User, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let user = match get_user_by_username(user_data.username.trim(), &connection) {
        Ok(user) => user,
        Err(Error::NotFound) => return Err(Error::InvalidCredentials),
        Err(error) => return Err(error),
    };

    if !user.password_hash.verify(&user_data.password)? {
        return Err(Error::InvalidCredentials);
    }

    if user.password_hash.is_legacy() {
        let upgraded_hash = PasswordHash::from_raw_password(&user_data.password, state.hash_cost)?;
        update_password(user.id, &upgraded_hash, &connection)?;
        tracing::info!("Upgraded legacy password hash for user {}", user.id);
    }

    Ok(user)
}

#[cfg(test)]
mod log_in_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{
        auth::{DEFAULT_TOKEN_DURATION, PasswordHash, TokenKeys, decode_token},
        db::initialize,
        user::{create_user, get_user_by_username},
    };

    use super::{LogInData, LoginState, TokenResponse, post_log_in};

    const TEST_COST: u32 = 4;

    fn get_test_state() -> LoginState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        create_user(
            "alice",
            PasswordHash::from_raw_password("hunter2", TEST_COST).unwrap(),
            &conn,
        )
        .unwrap();
        // SHA-256 of "legacy-password"
        create_user(
            "bob",
            PasswordHash::new_unchecked(
                "6bed82f7da9a703f86f1d89288910edc2681b26d010db89c3666807d364e68a6",
            ),
            &conn,
        )
        .unwrap();

        LoginState {
            token_keys: TokenKeys::from_secret("foobar"),
            token_duration: DEFAULT_TOKEN_DURATION,
            hash_cost: TEST_COST,
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    fn get_test_server(state: LoginState) -> TestServer {
        let app = Router::new()
            .route("/api/login", post(post_log_in))
            .with_state(state);

        TestServer::new(app)
    }

    fn form(username: &str, password: &str) -> LogInData {
        LogInData {
            username: username.to_owned(),
            password: password.to_owned(),
        }
    }

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let state = get_test_state();
        let keys = state.token_keys.clone();
        let server = get_test_server(state);

        let response = server
            .post("/api/login")
            .form(&form("alice", "hunter2"))
            .await;

        response.assert_status_ok();
        let body: TokenResponse = response.json();
        assert_eq!(body.token_type, "bearer");
        assert_eq!(decode_token(&body.access_token, &keys).unwrap().sub, "alice");
    }

    #[tokio::test]
    async fn log_in_fails_with_wrong_password() {
        let server = get_test_server(get_test_state());

        let response = server
            .post("/api/login")
            .form(&form("alice", "wrong"))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json_contains(
            &serde_json::json!({ "detail": "Incorrect username or password" }),
        );
    }

    #[tokio::test]
    async fn log_in_fails_with_unknown_username() {
        let server = get_test_server(get_test_state());

        server
            .post("/api/login")
            .form(&form("mallory", "hunter2"))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn log_in_upgrades_legacy_hash() {
        let state = get_test_state();
        let db_connection = state.db_connection.clone();
        let server = get_test_server(state);

        server
            .post("/api/login")
            .form(&form("bob", "legacy-password"))
            .await
            .assert_status_ok();

        let user = get_user_by_username("bob", &db_connection.lock().unwrap()).unwrap();
        assert!(!user.password_hash.is_legacy());
        assert!(user.password_hash.verify("legacy-password").unwrap());
    }
}
