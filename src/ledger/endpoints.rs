//! Route handlers for listing, creating, editing and deleting ledgers.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    database_id::LedgerId,
    db::lock_connection,
    extract::{Json, Path, Query},
    ledger::core::{
        Ledger, LedgerForm, count_ledgers, create_ledger, delete_ledger, get_ledger, get_ledgers,
        update_ledger,
    },
    pagination::{Page, Pagination, PaginationQuery},
    timezone::local_now,
    user::User,
};

/// The state needed to manage ledgers.
#[derive(Debug, Clone)]
pub struct LedgerState {
    /// The connection to the application's database.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for LedgerState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// List the current user's ledgers, newest first, one page at a time.
pub async fn get_ledgers_endpoint(
    State(state): State<LedgerState>,
    Extension(user): Extension<User>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Page<Ledger>>, Error> {
    let pagination = Pagination::from(&query);
    let connection = lock_connection(&state.db_connection)?;

    let items = get_ledgers(user.id, pagination, &connection)?;
    let total = count_ledgers(user.id, &connection)?;

    Ok(Json(Page::new(items, total, pagination)))
}

/// Create a ledger for the current user.
///
/// # Errors
///
/// Responds with 400 if the name is blank.
pub async fn create_ledger_endpoint(
    State(state): State<LedgerState>,
    Extension(user): Extension<User>,
    Json(form): Json<LedgerForm>,
) -> Result<Json<Ledger>, Error> {
    let now = local_now(&state.local_timezone)?;
    let connection = lock_connection(&state.db_connection)?;

    create_ledger(user.id, form, now, &connection).map(Json)
}

/// Get one of the current user's ledgers.
///
/// # Errors
///
/// Responds with 404 if the ledger does not exist or belongs to another user.
pub async fn get_ledger_endpoint(
    State(state): State<LedgerState>,
    Extension(user): Extension<User>,
    Path(ledger_id): Path<LedgerId>,
) -> Result<Json<Ledger>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_ledger(ledger_id, user.id, &connection).map(Json)
}

/// Replace the name and description of one of the current user's ledgers.
///
/// # Errors
///
/// Responds with 400 if the name is blank, and 404 if the ledger does not
/// exist or belongs to another user.
pub async fn edit_ledger_endpoint(
    State(state): State<LedgerState>,
    Extension(user): Extension<User>,
    Path(ledger_id): Path<LedgerId>,
    Json(form): Json<LedgerForm>,
) -> Result<Json<Ledger>, Error> {
    let now = local_now(&state.local_timezone)?;
    let connection = lock_connection(&state.db_connection)?;

    update_ledger(ledger_id, user.id, form, now, &connection).map(Json)
}

/// Delete one of the current user's ledgers.
///
/// Responds with 204 No Content on success.
pub async fn delete_ledger_endpoint(
    State(state): State<LedgerState>,
    Extension(user): Extension<User>,
    Path(ledger_id): Path<LedgerId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_ledger(ledger_id, user.id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
