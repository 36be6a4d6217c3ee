//! Ledger is a web app for keeping track of personal finances.
//!
//! This library provides a JSON REST API for recording income and expenses,
//! keeping ledgers, and setting monthly budgets. Clients authenticate with a
//! bearer token obtained from the log in endpoint.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod app_state;
mod auth;
mod budget;
mod database_id;
mod db;
mod endpoints;
mod error;
mod extract;
mod ledger;
mod logging;
mod pagination;
mod routing;
mod timestamp;
mod timezone;
mod transaction;
mod upload;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{PasswordHash, ValidatedPassword};
pub use budget::{BudgetForm, upsert_budget};
pub use db::initialize as initialize_db;
pub use error::Error;
pub use ledger::{LedgerForm, create_ledger};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use transaction::{Transaction, TransactionType, create_transaction};
pub use user::{User, UserID, create_user, get_user_by_username, update_password};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
