//! Authentication middleware that validates bearer tokens and attaches the user to the request.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::{TokenKeys, decode_token},
    db::lock_connection,
    user::{User, get_user_by_username},
};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The keys for verifying bearer tokens.
    pub token_keys: TokenKeys,
    /// The database connection for looking up the token's user.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            token_keys: state.token_keys.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Middleware function that checks for a valid bearer token in the `Authorization` header.
/// The token's user is placed into the request and the request executed normally if the token is valid,
/// otherwise a 401 Unauthorized response is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(user): Extension<User>` to receive the user.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let bearer =
        match TypedHeader::<Authorization<Bearer>>::from_request_parts(&mut parts, &state).await {
            Ok(TypedHeader(Authorization(bearer))) => bearer,
            Err(error) => {
                tracing::debug!("Request without a valid authorization header: {error}");
                return Error::MissingToken.into_response();
            }
        };

    let user = match authenticate(bearer.token(), &state) {
        Ok(user) => user,
        Err(error) => return error.into_response(),
    };

    parts.extensions.insert(user);
    let request = Request::from_parts(parts, body);

    next.run(request).await
}

fn authenticate(token: &str, state: &AuthState) -> Result<User, Error> {
    let claims = decode_token(token, &state.token_keys)?;
    let connection = lock_connection(&state.db_connection)?;

    get_user_by_username(&claims.sub, &connection).map_err(|error| match error {
        Error::NotFound => {
            tracing::debug!("Token subject {} is not a registered user", claims.sub);
            Error::InvalidToken
        }
        error => error,
    })
}
