//! Route handlers for monthly budgets.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    budget::{
        core::{
            Budget, BudgetForm, BudgetStatus, delete_budget, get_budget_statuses, get_budgets,
            upsert_budget,
        },
        month::BudgetMonth,
    },
    database_id::BudgetId,
    db::lock_connection,
    extract::{Json, Path, Query},
    timezone::local_now,
    user::User,
};

/// The state needed to manage budgets.
#[derive(Debug, Clone)]
pub struct BudgetState {
    /// The connection to the application's database.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for BudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The query parameters selecting which month's budgets to use.
#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    /// The month in the format "YYYY-MM", defaults to the current month.
    pub month: Option<String>,
}

impl MonthQuery {
    fn resolve(&self, local_timezone: &str) -> Result<BudgetMonth, Error> {
        match self.month.as_deref() {
            Some(month) if !month.trim().is_empty() => BudgetMonth::parse(month),
            _ => local_now(local_timezone).map(BudgetMonth::containing),
        }
    }
}

/// List the current user's budgets for a month.
///
/// # Errors
///
/// Responds with 400 if the month is not of the form "YYYY-MM".
pub async fn get_budgets_endpoint(
    State(state): State<BudgetState>,
    Extension(user): Extension<User>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Vec<Budget>>, Error> {
    let month = query.resolve(&state.local_timezone)?;
    let connection = lock_connection(&state.db_connection)?;

    get_budgets(user.id, month, &connection).map(Json)
}

/// Create the budget for a category and month, or replace its amount if it exists.
pub async fn set_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user): Extension<User>,
    Json(form): Json<BudgetForm>,
) -> Result<Json<Budget>, Error> {
    let now = local_now(&state.local_timezone)?;
    let connection = lock_connection(&state.db_connection)?;

    upsert_budget(user.id, form, now, &connection).map(Json)
}

/// Report how much has been spent against each of the current user's budgets
/// for a month, and how much remains.
///
/// # Errors
///
/// Responds with 400 if the month is not of the form "YYYY-MM".
pub async fn get_budget_status_endpoint(
    State(state): State<BudgetState>,
    Extension(user): Extension<User>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Vec<BudgetStatus>>, Error> {
    let month = query.resolve(&state.local_timezone)?;
    let connection = lock_connection(&state.db_connection)?;

    get_budget_statuses(user.id, month, &connection).map(Json)
}

/// Delete one of the current user's budgets.
///
/// Responds with 204 No Content on success.
pub async fn delete_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user): Extension<User>,
    Path(budget_id): Path<BudgetId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_budget(budget_id, user.id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
