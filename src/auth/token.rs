//! Defines the claims carried by bearer tokens and how to encode/decode them as JSON Web Tokens.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::Error;

/// How long a bearer token is valid for unless configured otherwise.
pub const DEFAULT_TOKEN_DURATION: Duration = Duration::minutes(30);

/// The keys for signing and verifying bearer tokens, derived from the server secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenKeys {
    /// Create HS256 signing keys from a shared `secret`.
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// The contents of a JSON Web Token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The username of the user the token was issued to.
    pub sub: String,
    /// The time the token was issued, as a unix timestamp.
    pub iat: i64,
    /// The expiry time of the token, as a unix timestamp.
    pub exp: i64,
}

/// Create a signed token for `username` that expires `duration` from now.
///
/// # Errors
///
/// Returns [Error::TokenCreation] if the token could not be encoded.
pub fn encode_token(username: &str, duration: Duration, keys: &TokenKeys) -> Result<String, Error> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        sub: username.to_owned(),
        iat: now.unix_timestamp(),
        exp: (now + duration).unix_timestamp(),
    };

    encode(&Header::default(), &claims, &keys.encoding_key)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Verify the signature and expiry of `token` and return its claims.
///
/// # Errors
///
/// Returns [Error::InvalidToken] if the token is malformed, was signed with a
/// different key, or has expired.
pub fn decode_token(token: &str, keys: &TokenKeys) -> Result<Claims, Error> {
    let mut validation = Validation::default();
    validation.leeway = 0;

    decode::<Claims>(token, &keys.decoding_key, &validation)
        .map(|token_data| token_data.claims)
        .map_err(|error| {
            tracing::debug!("Rejected bearer token: {error}");
            Error::InvalidToken
        })
}
