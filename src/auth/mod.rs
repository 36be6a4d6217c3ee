//! Password hashing, bearer tokens and the routes and middleware that use them.

mod log_in;
mod middleware;
mod password;
mod token;

pub use log_in::post_log_in;
pub use middleware::auth_guard;
pub use password::{PasswordHash, ValidatedPassword};
pub use token::{DEFAULT_TOKEN_DURATION, TokenKeys, decode_token, encode_token};

#[cfg(test)]
pub use log_in::TokenResponse;
