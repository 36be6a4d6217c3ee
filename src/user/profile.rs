//! The user profile table, which stores the avatar shown for a user.

use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::DatabaseId, user::UserID};

/// Extra, optional details about a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// The ID of the profile.
    pub id: DatabaseId,
    /// The user the profile belongs to.
    pub user_id: UserID,
    /// A URL or path to the user's avatar image, e.g. "/uploads/abc.png".
    pub avatar_url: Option<String>,
}

/// Create the user profile table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_profile_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user_profile (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL UNIQUE,
                avatar_url TEXT,
                FOREIGN KEY(user_id) REFERENCES users(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

fn map_profile_row(row: &Row) -> Result<UserProfile, rusqlite::Error> {
    Ok(UserProfile {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        avatar_url: row.get(2)?,
    })
}

/// Get the profile for `user_id`, or `None` if the user has not set one up yet.
///
/// # Errors
///
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn get_profile(user_id: UserID, connection: &Connection) -> Result<Option<UserProfile>, Error> {
    connection
        .prepare("SELECT id, user_id, avatar_url FROM user_profile WHERE user_id = :user_id")?
        .query_row(&[(":user_id", &user_id.as_i64())], map_profile_row)
        .optional()
        .map_err(Error::from)
}

/// Set the avatar for `user_id`, creating the profile if it does not exist.
///
/// # Errors
///
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn upsert_avatar(
    user_id: UserID,
    avatar_url: Option<&str>,
    connection: &Connection,
) -> Result<UserProfile, Error> {
    connection
        .prepare(
            "INSERT INTO user_profile (user_id, avatar_url) VALUES (?1, ?2)
             ON CONFLICT(user_id) DO UPDATE SET avatar_url = excluded.avatar_url
             RETURNING id, user_id, avatar_url",
        )?
        .query_row((user_id.as_i64(), avatar_url), map_profile_row)
        .map_err(Error::from)
}

/// Delete the profile of `user_id`, returning the number of rows deleted.
///
/// # Errors
///
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn delete_profile(user_id: UserID, connection: &Connection) -> Result<usize, Error> {
    connection
        .execute(
            "DELETE FROM user_profile WHERE user_id = ?1",
            (user_id.as_i64(),),
        )
        .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        auth::PasswordHash,
        db::initialize,
        user::{
            UserID, create_user,
            profile::{delete_profile, get_profile, upsert_avatar},
        },
    };

    fn get_test_connection() -> (Connection, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user("alice", PasswordHash::new_unchecked("hunter2"), &conn).unwrap();

        (conn, user.id)
    }

    #[test]
    fn missing_profile_is_none() {
        let (conn, user_id) = get_test_connection();

        assert_eq!(get_profile(user_id, &conn), Ok(None));
    }

    #[test]
    fn upsert_creates_then_updates() {
        let (conn, user_id) = get_test_connection();

        let created = upsert_avatar(user_id, Some("/uploads/a.png"), &conn).unwrap();
        let updated = upsert_avatar(user_id, Some("/uploads/b.png"), &conn).unwrap();

        assert_eq!(created.id, updated.id);
        assert_eq!(updated.avatar_url.as_deref(), Some("/uploads/b.png"));
        assert_eq!(get_profile(user_id, &conn), Ok(Some(updated)));
    }

    #[test]
    fn upsert_can_clear_avatar() {
        let (conn, user_id) = get_test_connection();
        upsert_avatar(user_id, Some("/uploads/a.png"), &conn).unwrap();

        let cleared = upsert_avatar(user_id, None, &conn).unwrap();

        assert_eq!(cleared.avatar_url, None);
    }

    #[test]
    fn delete_removes_profile() {
        let (conn, user_id) = get_test_connection();
        upsert_avatar(user_id, Some("/uploads/a.png"), &conn).unwrap();

        assert_eq!(delete_profile(user_id, &conn), Ok(1));
        assert_eq!(get_profile(user_id, &conn), Ok(None));
    }
}
