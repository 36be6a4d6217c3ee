//! The endpoint for registering a new user.

use std::sync::{Arc, Mutex};

use axum::extract::{FromRef, State};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::{PasswordHash, ValidatedPassword},
    db::lock_connection,
    extract::Json,
    user::{create_user, validate_username},
};

/// The state needed to register a user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The bcrypt cost for hashing the new password.
    pub hash_cost: u32,
    /// The connection to the application's database.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            hash_cost: state.hash_cost,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The data submitted to the registration endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterForm {
    /// The name to log in with, must not be blank.
    pub username: String,
    /// The new password, must not be empty.
    pub password: String,
    /// Must be the same as `password`.
    pub repeat_password: String,
}

/// A JSON body containing a single message for the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailResponse {
    /// A message describing the outcome of the request.
    pub detail: String,
}

/// Create a new user from the registration data.
///
/// # Errors
///
/// Responds with 400 if the username or password is empty or the passwords
/// do not match, and 409 if the username is taken.
pub async fn register_user(
    State(state): State<RegistrationState>,
    Json(user_data): Json<RegisterForm>,
) -> Result<Json<DetailResponse>, Error> {
    if user_data.password != user_data.repeat_password {
        return Err(Error::PasswordMismatch);
    }

    let username = validate_username(&user_data.username)?;
    let validated_password = ValidatedPassword::new(&user_data.password)?;
    let password_hash = PasswordHash::new(validated_password, state.hash_cost)?;

    let user = create_user(
        &username,
        password_hash,
        &*lock_connection(&state.db_connection)?,
    )?;

    tracing::info!("Registered user {} with ID {}", user.username, user.id);

    Ok(Json(DetailResponse {
        detail: "User registered successfully".to_owned(),
    }))
}

#[cfg(test)]
mod register_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{
        db::initialize,
        user::{count_users, get_user_by_username},
    };

    use super::{RegistrationState, register_user};

    fn get_test_server() -> (TestServer, Arc<Mutex<Connection>>) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let db_connection = Arc::new(Mutex::new(conn));

        let state = RegistrationState {
            hash_cost: 4,
            db_connection: db_connection.clone(),
        };
        let app = Router::new()
            .route("/api/register", post(register_user))
            .with_state(state);

        (
            TestServer::new(app),
            db_connection,
        )
    }

    #[tokio::test]
    async fn create_user_succeeds() {
        let (server, db_connection) = get_test_server();

        let response = server
            .post("/api/register")
            .json(&json!({
                "username": "alice",
                "password": "averysafeandsecurepassword",
                "repeat_password": "averysafeandsecurepassword",
            }))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({ "detail": "User registered successfully" }));

        let user = get_user_by_username("alice", &db_connection.lock().unwrap()).unwrap();
        assert!(user.password_hash.verify("averysafeandsecurepassword").unwrap());
    }

    #[tokio::test]
    async fn create_user_fails_with_existing_user() {
        let (server, db_connection) = get_test_server();
        let body = json!({
            "username": "alice",
            "password": "hunter2",
            "repeat_password": "hunter2",
        });
        server.post("/api/register").json(&body).await.assert_status_ok();

        let response = server.post("/api/register").json(&body).await;

        response.assert_status(StatusCode::CONFLICT);
        response.assert_json(&json!({ "detail": "Username already exists" }));
        assert_eq!(count_users(&db_connection.lock().unwrap()), Ok(1));
    }

    #[tokio::test]
    async fn create_user_fails_when_passwords_do_not_match() {
        let (server, db_connection) = get_test_server();

        let response = server
            .post("/api/register")
            .json(&json!({
                "username": "alice",
                "password": "hunter2",
                "repeat_password": "hunter3",
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "detail": "Passwords do not match" }));
        assert_eq!(count_users(&db_connection.lock().unwrap()), Ok(0));
    }

    #[tokio::test]
    async fn create_user_fails_when_password_is_empty() {
        let (server, _) = get_test_server();

        server
            .post("/api/register")
            .json(&json!({
                "username": "alice",
                "password": "",
                "repeat_password": "",
            }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_user_fails_when_username_is_blank() {
        let (server, _) = get_test_server();

        let response = server
            .post("/api/register")
            .json(&json!({
                "username": "   ",
                "password": "hunter2",
                "repeat_password": "hunter2",
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "detail": "Username cannot be empty" }));
    }

    #[tokio::test]
    async fn create_user_without_password_gets_json_detail() {
        let (server, db_connection) = get_test_server();

        let response = server
            .post("/api/register")
            .json(&json!({ "username": "alice", "repeat_password": "hunter2" }))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: serde_json::Value = response.json();
        assert!(
            body["detail"]
                .as_str()
                .is_some_and(|detail| detail.contains("password")),
            "got {body}"
        );
        assert_eq!(count_users(&db_connection.lock().unwrap()), Ok(0));
    }
}
