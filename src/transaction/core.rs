//! Defines the core data models and database queries for transactions.

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use crate::{
    Error,
    database_id::{DatabaseId, TransactionId},
    timestamp,
    user::UserID,
};

// ============================================================================
// MODELS
// ============================================================================

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    /// The name stored in the database and used in the JSON API.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(FromSqlError::Other(
                format!("unknown transaction type {other:?}").into(),
            )),
        }
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that recorded the transaction.
    pub user_id: UserID,
    /// The amount of money spent or earned, always greater than zero.
    pub amount: f64,
    /// Whether the money was spent or earned.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// A free-form category, e.g. "Groceries".
    pub category: String,
    pub description: Option<String>,
    /// A path to a photo of the receipt, e.g. "/uploads/abc.png".
    pub image_path: Option<String>,
    /// When the transaction happened, in local time.
    #[serde(with = "timestamp::serde_format")]
    pub date: PrimitiveDateTime,
    #[serde(with = "timestamp::serde_format")]
    pub created_at: PrimitiveDateTime,
    #[serde(with = "timestamp::serde_format")]
    pub updated_at: PrimitiveDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        amount: f64,
        transaction_type: TransactionType,
        category: &str,
    ) -> TransactionBuilder {
        TransactionBuilder {
            amount,
            transaction_type,
            category: category.to_owned(),
            description: None,
            image_path: None,
            date: None,
        }
    }
}

/// A builder for creating and updating [Transaction] rows.
///
/// Use [TransactionBuilder::validate] before writing to the database.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The amount of money, must be finite and greater than zero.
    pub amount: f64,
    pub transaction_type: TransactionType,
    /// The category, must not be blank.
    pub category: String,
    pub description: Option<String>,
    pub image_path: Option<String>,
    /// When the transaction happened.
    ///
    /// Defaults to the current local time on creation and is left unchanged on update.
    pub date: Option<PrimitiveDateTime>,
}

impl TransactionBuilder {
    pub fn description(mut self, description: Option<&str>) -> Self {
        self.description = description.map(ToOwned::to_owned);
        self
    }

    pub fn image_path(mut self, image_path: Option<&str>) -> Self {
        self.image_path = image_path.map(ToOwned::to_owned);
        self
    }

    pub fn date(mut self, date: PrimitiveDateTime) -> Self {
        self.date = Some(date);
        self
    }

    /// Check the amount and trim the category.
    ///
    /// # Errors
    /// Returns [Error::InvalidAmount] if the amount is not a finite number greater than zero,
    /// or [Error::EmptyCategory] if the category is blank.
    pub fn validate(mut self) -> Result<Self, Error> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(Error::InvalidAmount(self.amount));
        }

        let category = self.category.trim();
        if category.is_empty() {
            return Err(Error::EmptyCategory);
        }
        self.category = category.to_owned();

        Ok(self)
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const TRANSACTION_COLUMNS: &str = "id, user_id, amount, type, category, description, image_path, date, created_at, updated_at";

/// Create a new transaction for `user_id` from a builder.
///
/// `now` is used for the timestamps and as the date if the builder has none.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] or [Error::EmptyCategory] if the builder is invalid,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    user_id: UserID,
    builder: TransactionBuilder,
    now: PrimitiveDateTime,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let builder = builder.validate()?;
    let date = builder.date.unwrap_or(now);
    let now = timestamp::format(now);

    connection
        .prepare(&format!(
            "INSERT INTO \"transaction\" (user_id, amount, type, category, description, image_path, date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                user_id.as_i64(),
                builder.amount,
                builder.transaction_type,
                builder.category,
                builder.description,
                builder.image_path,
                timestamp::format(date),
                now,
            ),
            map_transaction_row,
        )
        .map_err(Error::from)
}

/// Retrieve the transaction `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::TransactionNotFound] if `id` does not refer to a transaction owned by the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = :id AND user_id = :user_id"
        ))?
        .query_row(
            &[(":id", &id), (":user_id", &user_id.as_i64())],
            map_transaction_row,
        )
        .map_err(|error| match Error::from(error) {
            Error::NotFound => Error::TransactionNotFound,
            error => error,
        })
}

/// Overwrite the transaction `id` owned by `user_id` with the values in `builder`.
///
/// The date is kept if the builder does not set one.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] or [Error::EmptyCategory] if the builder is invalid,
/// - [Error::TransactionNotFound] if `id` does not refer to a transaction owned by the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    user_id: UserID,
    builder: TransactionBuilder,
    now: PrimitiveDateTime,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let builder = builder.validate()?;

    connection
        .prepare(&format!(
            "UPDATE \"transaction\"
             SET amount = ?1, type = ?2, category = ?3, description = ?4, image_path = ?5,
                 date = COALESCE(?6, date), updated_at = ?7
             WHERE id = ?8 AND user_id = ?9
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                builder.amount,
                builder.transaction_type,
                builder.category,
                builder.description,
                builder.image_path,
                builder.date.map(timestamp::format),
                timestamp::format(now),
                id,
                user_id.as_i64(),
            ),
            map_transaction_row,
        )
        .map_err(|error| match Error::from(error) {
            Error::NotFound => Error::TransactionNotFound,
            error => error,
        })
}

/// Delete the transaction `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::TransactionNotFound] if `id` does not refer to a transaction owned by the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::TransactionNotFound);
    }

    Ok(())
}

/// Delete every transaction owned by `user_id`, returning the number deleted.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn delete_transactions_for_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<usize, Error> {
    connection
        .execute(
            "DELETE FROM \"transaction\" WHERE user_id = ?1",
            (user_id.as_i64(),),
        )
        .map_err(Error::from)
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                amount REAL NOT NULL CHECK (amount > 0),
                type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
                category TEXT NOT NULL,
                description TEXT,
                image_path TEXT,
                date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES users(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Listing, filtering and summaries all scope by user and date range.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
///
/// The row must contain the columns in the same order as `TRANSACTION_COLUMNS`.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id: DatabaseId = row.get(0)?;
    let user_id = UserID::new(row.get(1)?);

    Ok(Transaction {
        id,
        user_id,
        amount: row.get(2)?,
        transaction_type: row.get(3)?,
        category: row.get(4)?,
        description: row.get(5)?,
        image_path: row.get(6)?,
        date: timestamp::get_from_row(row, 7)?,
        created_at: timestamp::get_from_row(row, 8)?,
        updated_at: timestamp::get_from_row(row, 9)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
