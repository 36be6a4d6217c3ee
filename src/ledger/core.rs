//! The ledger model and its database queries.
//!
//! A ledger is a named book that a user keeps their records in, e.g. "Household" or "Travel".

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use crate::{
    Error, database_id::LedgerId, db::get_count, pagination::Pagination, timestamp, user::UserID,
};

/// A named collection of records owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub id: LedgerId,
    pub user_id: UserID,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "timestamp::serde_format")]
    pub created_at: PrimitiveDateTime,
    #[serde(with = "timestamp::serde_format")]
    pub updated_at: PrimitiveDateTime,
}

/// The request body for creating or replacing a ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerForm {
    /// The ledger's name, must not be blank.
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl LedgerForm {
    /// Trim the name and check that it is not blank.
    ///
    /// # Errors
    /// Returns [Error::EmptyLedgerName] if the name is blank.
    pub fn validate(self) -> Result<Self, Error> {
        let name = self.name.trim();

        if name.is_empty() {
            return Err(Error::EmptyLedgerName);
        }

        Ok(Self {
            name: name.to_owned(),
            description: self.description,
        })
    }
}

/// Create the ledger table.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_ledger_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS ledger (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                description TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES users(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

fn map_ledger_row(row: &Row) -> Result<Ledger, rusqlite::Error> {
    Ok(Ledger {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        name: row.get(2)?,
        description: row.get(3)?,
        created_at: timestamp::get_from_row(row, 4)?,
        updated_at: timestamp::get_from_row(row, 5)?,
    })
}

/// Create a ledger for `user_id`, timestamped with `now`.
///
/// # Errors
/// Returns [Error::EmptyLedgerName] if the name is blank, or [Error::SqlError]
/// if there is an SQL error.
pub fn create_ledger(
    user_id: UserID,
    form: LedgerForm,
    now: PrimitiveDateTime,
    connection: &Connection,
) -> Result<Ledger, Error> {
    let form = form.validate()?;

    connection
        .prepare(
            "INSERT INTO ledger (user_id, name, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             RETURNING id, user_id, name, description, created_at, updated_at",
        )?
        .query_row(
            (
                user_id.as_i64(),
                form.name,
                form.description,
                timestamp::format(now),
            ),
            map_ledger_row,
        )
        .map_err(Error::from)
}

/// Get the ledger `id` owned by `user_id`.
///
/// # Errors
/// Returns [Error::LedgerNotFound] if the ledger does not exist or belongs to
/// another user, or [Error::SqlError] if there is an SQL error.
pub fn get_ledger(id: LedgerId, user_id: UserID, connection: &Connection) -> Result<Ledger, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, description, created_at, updated_at
             FROM ledger WHERE id = ?1 AND user_id = ?2",
        )?
        .query_row((id, user_id.as_i64()), map_ledger_row)
        .map_err(|error| match Error::from(error) {
            Error::NotFound => Error::LedgerNotFound,
            error => error,
        })
}

/// Get one page of the ledgers owned by `user_id`, most recently created first.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_ledgers(
    user_id: UserID,
    pagination: Pagination,
    connection: &Connection,
) -> Result<Vec<Ledger>, Error> {
    let (limit, offset) = pagination.as_sql_params();

    connection
        .prepare(
            "SELECT id, user_id, name, description, created_at, updated_at
             FROM ledger WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3",
        )?
        .query_map((user_id.as_i64(), limit, offset), map_ledger_row)?
        .map(|ledger_result| ledger_result.map_err(Error::SqlError))
        .collect()
}

/// Count the ledgers owned by `user_id`.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn count_ledgers(user_id: UserID, connection: &Connection) -> Result<u64, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM ledger WHERE user_id = ?1",
            (user_id.as_i64(),),
            |row| get_count(row, 0),
        )
        .map_err(Error::from)
}

/// Replace the name and description of the ledger `id` owned by `user_id`.
///
/// # Errors
/// Returns [Error::EmptyLedgerName] if the name is blank, [Error::LedgerNotFound]
/// if the ledger does not exist or belongs to another user, or [Error::SqlError]
/// if there is an SQL error.
pub fn update_ledger(
    id: LedgerId,
    user_id: UserID,
    form: LedgerForm,
    now: PrimitiveDateTime,
    connection: &Connection,
) -> Result<Ledger, Error> {
    let form = form.validate()?;

    connection
        .prepare(
            "UPDATE ledger SET name = ?1, description = ?2, updated_at = ?3
             WHERE id = ?4 AND user_id = ?5
             RETURNING id, user_id, name, description, created_at, updated_at",
        )?
        .query_row(
            (
                form.name,
                form.description,
                timestamp::format(now),
                id,
                user_id.as_i64(),
            ),
            map_ledger_row,
        )
        .map_err(|error| match Error::from(error) {
            Error::NotFound => Error::LedgerNotFound,
            error => error,
        })
}

/// Delete the ledger `id` owned by `user_id`.
///
/// # Errors
/// Returns [Error::LedgerNotFound] if the ledger does not exist or belongs to
/// another user, or [Error::SqlError] if there is an SQL error.
pub fn delete_ledger(id: LedgerId, user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM ledger WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::LedgerNotFound);
    }

    Ok(())
}

/// Delete every ledger owned by `user_id`, returning the number deleted.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn delete_ledgers_for_user(user_id: UserID, connection: &Connection) -> Result<usize, Error> {
    connection
        .execute("DELETE FROM ledger WHERE user_id = ?1", (user_id.as_i64(),))
        .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::{Duration, macros::datetime};

    use crate::{
        Error,
        auth::PasswordHash,
        db::initialize,
        pagination::Pagination,
        user::{UserID, create_user},
    };

    use super::{
        LedgerForm, count_ledgers, create_ledger, delete_ledger, delete_ledgers_for_user,
        get_ledger, get_ledgers, update_ledger,
    };

    fn get_test_connection() -> (Connection, UserID, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let alice = create_user("alice", PasswordHash::new_unchecked("hunter2"), &conn).unwrap();
        let bob = create_user("bob", PasswordHash::new_unchecked("hunter2"), &conn).unwrap();

        (conn, alice.id, bob.id)
    }

    fn form(name: &str) -> LedgerForm {
        LedgerForm {
            name: name.to_owned(),
            description: None,
        }
    }

    #[test]
    fn create_and_get_ledger() {
        let (conn, alice, _) = get_test_connection();
        let now = datetime!(2025-06-01 10:00:00);

        let ledger = create_ledger(alice, form("  Household "), now, &conn).unwrap();

        assert_eq!(ledger.name, "Household");
        assert_eq!(ledger.created_at, now);
        assert_eq!(get_ledger(ledger.id, alice, &conn), Ok(ledger));
    }

    #[test]
    fn create_fails_on_blank_name() {
        let (conn, alice, _) = get_test_connection();

        let result = create_ledger(alice, form(" "), datetime!(2025-06-01 10:00:00), &conn);

        assert_eq!(result, Err(Error::EmptyLedgerName));
    }

    #[test]
    fn ledgers_are_listed_newest_first_and_paged() {
        let (conn, alice, bob) = get_test_connection();
        let start = datetime!(2025-06-01 10:00:00);
        let ledgers: Vec<_> = (0..4)
            .map(|i| {
                create_ledger(
                    alice,
                    form(&format!("Ledger {i}")),
                    start + Duration::hours(i),
                    &conn,
                )
                .unwrap()
            })
            .collect();
        create_ledger(bob, form("Bob's"), start, &conn).unwrap();

        let got = get_ledgers(alice, Pagination::new(Some(1), Some(2)), &conn).unwrap();

        assert_eq!(got, vec![ledgers[2].clone(), ledgers[1].clone()]);
        assert_eq!(count_ledgers(alice, &conn), Ok(4));
    }

    #[test]
    fn update_changes_name_and_timestamp() {
        let (conn, alice, bob) = get_test_connection();
        let created_at = datetime!(2025-06-01 10:00:00);
        let updated_at = datetime!(2025-06-02 10:00:00);
        let ledger = create_ledger(alice, form("Household"), created_at, &conn).unwrap();

        let updated = update_ledger(
            ledger.id,
            alice,
            LedgerForm {
                name: "Home".to_owned(),
                description: Some("Shared costs".to_owned()),
            },
            updated_at,
            &conn,
        )
        .unwrap();

        assert_eq!(updated.name, "Home");
        assert_eq!(updated.description.as_deref(), Some("Shared costs"));
        assert_eq!(updated.created_at, created_at);
        assert_eq!(updated.updated_at, updated_at);
        assert_eq!(
            update_ledger(ledger.id, bob, form("Mine"), updated_at, &conn),
            Err(Error::LedgerNotFound)
        );
    }

    #[test]
    fn delete_only_removes_own_ledger() {
        let (conn, alice, bob) = get_test_connection();
        let now = datetime!(2025-06-01 10:00:00);
        let ledger = create_ledger(alice, form("Household"), now, &conn).unwrap();
        create_ledger(alice, form("Travel"), now, &conn).unwrap();

        assert_eq!(delete_ledger(ledger.id, bob, &conn), Err(Error::LedgerNotFound));
        assert_eq!(delete_ledger(ledger.id, alice, &conn), Ok(()));
        assert_eq!(get_ledger(ledger.id, alice, &conn), Err(Error::LedgerNotFound));
        assert_eq!(delete_ledgers_for_user(alice, &conn), Ok(1));
    }
}
