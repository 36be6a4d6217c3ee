//! Defines the endpoints for totalling a user's transactions.

use axum::{Extension, extract::State};

use crate::{
    Error,
    db::lock_connection,
    extract::{Json, Query},
    transaction::{
        get_endpoint::{TransactionQuery, TransactionReadState},
        query::{CategoryTotal, TransactionSummary, get_category_totals, get_summary},
    },
    user::User,
};

/// A route handler for the current user's total income, expenses and balance.
///
/// Only the `start_date` and `end_date` query parameters are used.
pub async fn get_statistics_endpoint(
    State(state): State<TransactionReadState>,
    Extension(user): Extension<User>,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<TransactionSummary>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_summary(user.id, query.start_date, query.end_date, &connection).map(Json)
}

/// A route handler for the current user's totals per category and type.
pub async fn get_category_totals_endpoint(
    State(state): State<TransactionReadState>,
    Extension(user): Extension<User>,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<Vec<CategoryTotal>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_category_totals(user.id, &query.filter(), &connection).map(Json)
}
