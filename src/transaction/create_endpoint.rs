//! Defines the endpoint for creating a new transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use crate::{
    AppState, Error,
    db::lock_connection,
    extract::Json,
    timestamp,
    timezone::local_now,
    transaction::{Transaction, TransactionBuilder, TransactionType, core::create_transaction},
    user::User,
};

/// The state needed to create or edit a transaction.
#[derive(Debug, Clone)]
pub struct TransactionWriteState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for TransactionWriteState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The request body for creating or replacing a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionForm {
    /// The amount of money, must be greater than zero.
    pub amount: f64,
    /// Either "income" or "expense".
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// What the money was earned or spent on, e.g. "Food". Must not be blank.
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
    /// When the transaction happened, e.g. "2025-01-31T18:30:00".
    #[serde(default, with = "timestamp::option_serde_format")]
    pub date: Option<PrimitiveDateTime>,
}

impl From<TransactionForm> for TransactionBuilder {
    fn from(form: TransactionForm) -> Self {
        let builder = Transaction::build(form.amount, form.transaction_type, &form.category)
            .description(form.description.as_deref())
            .image_path(form.image_path.as_deref());

        match form.date {
            Some(date) => builder.date(date),
            None => builder,
        }
    }
}

/// A route handler for creating a new transaction, responds with the created transaction.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionWriteState>,
    Extension(user): Extension<User>,
    Json(form): Json<TransactionForm>,
) -> Result<Json<Transaction>, Error> {
    let now = local_now(&state.local_timezone)?;
    let connection = lock_connection(&state.db_connection)?;

    let transaction = create_transaction(user.id, form.into(), now, &connection)?;

    tracing::debug!("User {} created transaction {}", user.id, transaction.id);

    Ok(Json(transaction))
}
