/*! This module creates the application's database schema and provides access to the shared connection. */

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, Row, Transaction as SqlTransaction, types::Type};

use crate::{
    Error,
    budget::create_budget_table,
    ledger::create_ledger_table,
    transaction::create_transaction_table,
    user::{create_profile_table, create_user_table},
};

/// Create the tables for all the domain models if they do not already exist.
///
/// Foreign key enforcement is switched on for `connection`.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_profile_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_ledger_table(&transaction)?;
    create_budget_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Acquire the lock on the shared database connection.
///
/// The guard must not be held across an `.await`.
///
/// # Errors
/// Returns [Error::DatabaseLockError] if the lock is poisoned.
pub fn lock_connection(
    db_connection: &Arc<Mutex<Connection>>,
) -> Result<MutexGuard<'_, Connection>, Error> {
    db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })
}

/// Read the `COUNT(..)` in column `index` of `row`.
///
/// SQLite stores integers as `i64`, so the count is read as one and converted.
pub fn get_count(row: &Row, index: usize) -> Result<u64, rusqlite::Error> {
    let count: i64 = row.get(index)?;

    u64::try_from(count).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Integer, Box::new(error))
    })
}
