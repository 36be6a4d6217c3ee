//! Endpoints for the logged-in user to view and manage their own account.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::{PasswordHash, ValidatedPassword},
    budget::delete_budgets_for_user,
    db::lock_connection,
    extract::Json,
    ledger::delete_ledgers_for_user,
    transaction::delete_transactions_for_user,
    user::{
        DetailResponse, User, UserID, delete_user,
        profile::{delete_profile, get_profile, upsert_avatar},
        update_password,
    },
};

/// The state needed to manage the current user's account.
#[derive(Debug, Clone)]
pub struct AccountState {
    /// The bcrypt cost for hashing new passwords.
    pub hash_cost: u32,
    /// The connection to the application's database.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            hash_cost: state.hash_cost,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The public details of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    /// The user's ID.
    pub id: UserID,
    /// The name the user logs in with.
    pub username: String,
    /// Where the user's avatar image is served from, if they have set one.
    pub avatar_url: Option<String>,
}

/// The request body for updating the current user's profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileForm {
    /// The new avatar, e.g. a URL returned by the upload endpoint. `null` removes the avatar.
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// The request body for changing the current user's password.
#[derive(Clone, Serialize, Deserialize)]
pub struct ChangePasswordForm {
    /// The user's current password.
    pub old_password: String,
    /// The password to replace it with, must not be empty.
    pub new_password: String,
    /// Must be the same as `new_password`.
    pub repeat_password: String,
}

/// Get the current user's details.
pub async fn get_current_user(
    State(state): State<AccountState>,
    Extension(user): Extension<User>,
) -> Result<Json<UserResponse>, Error> {
    let profile = get_profile(user.id, &*lock_connection(&state.db_connection)?)?;

    Ok(Json(UserResponse {
        id: user.id,
        username: user.username,
        avatar_url: profile.and_then(|profile| profile.avatar_url),
    }))
}

/// Set the current user's avatar, responds with the updated user details.
pub async fn update_current_user(
    State(state): State<AccountState>,
    Extension(user): Extension<User>,
    Json(form): Json<ProfileForm>,
) -> Result<Json<UserResponse>, Error> {
    let avatar_url = form
        .avatar_url
        .as_deref()
        .map(str::trim)
        .filter(|avatar_url| !avatar_url.is_empty());

    let profile = upsert_avatar(
        user.id,
        avatar_url,
        &*lock_connection(&state.db_connection)?,
    )?;

    Ok(Json(UserResponse {
        id: user.id,
        username: user.username,
        avatar_url: profile.avatar_url,
    }))
}

/// Change the current user's password after checking their old password.
///
/// # Errors
///
/// Responds with 401 if the old password is wrong, and 400 if the new password
/// is empty or does not match the repeated password.
pub async fn change_password(
    State(state): State<AccountState>,
    Extension(user): Extension<User>,
    Json(form): Json<ChangePasswordForm>,
) -> Result<Json<DetailResponse>, Error> {
    if !user.password_hash.verify(&form.old_password)? {
        return Err(Error::InvalidCredentials);
    }

    if form.new_password != form.repeat_password {
        return Err(Error::PasswordMismatch);
    }

    let password_hash =
        PasswordHash::new(ValidatedPassword::new(&form.new_password)?, state.hash_cost)?;
    update_password(
        user.id,
        &password_hash,
        &*lock_connection(&state.db_connection)?,
    )?;

    tracing::info!("User {} changed their password", user.id);

    Ok(Json(DetailResponse {
        detail: "Password updated successfully".to_owned(),
    }))
}

/// Delete the current user and everything they own, responds with 204 No Content.
pub async fn delete_current_user(
    State(state): State<AccountState>,
    Extension(user): Extension<User>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_account(user.id, &connection)?;
    tracing::info!("Deleted account of user {}", user.id);

    Ok(StatusCode::NO_CONTENT)
}

/// Delete the user `user_id` along with their profile, budgets, ledgers and
/// transactions. Either everything is deleted or nothing is.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user does not exist, or [Error::SqlError]
/// if there is an SQL error.
pub fn delete_account(user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    delete_profile(user_id, &transaction)?;
    delete_budgets_for_user(user_id, &transaction)?;
    delete_ledgers_for_user(user_id, &transaction)?;
    delete_transactions_for_user(user_id, &transaction)?;
    delete_user(user_id, &transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod delete_account_tests {
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        Error,
        auth::PasswordHash,
        budget::{BudgetForm, upsert_budget},
        db::initialize,
        ledger::{LedgerForm, create_ledger},
        transaction::{Transaction, TransactionType, create_transaction},
        user::{
            UserID, count_users, create_user, get_user_by_id,
            profile::{get_profile, upsert_avatar},
        },
    };

    use super::delete_account;

    fn count(conn: &Connection, table: &str, user_id: UserID) -> i64 {
        conn.query_row(
            &format!("SELECT COUNT(*) FROM \"{table}\" WHERE user_id = ?1"),
            (user_id.as_i64(),),
            |row| row.get(0),
        )
        .unwrap()
    }

    fn seed(conn: &Connection, username: &str) -> UserID {
        let now = datetime!(2025-03-01 09:00:00);
        let user_id = create_user(username, PasswordHash::new_unchecked("hunter2"), conn)
            .unwrap()
            .id;
        upsert_avatar(user_id, Some("/uploads/a.png"), conn).unwrap();
        create_transaction(
            user_id,
            Transaction::build(1.0, TransactionType::Expense, "Food"),
            now,
            conn,
        )
        .unwrap();
        create_ledger(
            user_id,
            LedgerForm {
                name: "Household".to_owned(),
                description: None,
            },
            now,
            conn,
        )
        .unwrap();
        upsert_budget(
            user_id,
            BudgetForm {
                amount: 10.0,
                category: None,
                month: "2025-03".to_owned(),
            },
            now,
            conn,
        )
        .unwrap();

        user_id
    }

    #[test]
    fn delete_account_removes_everything_owned_by_user() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let alice = seed(&conn, "alice");
        let bob = seed(&conn, "bob");

        delete_account(alice, &conn).unwrap();

        assert_eq!(get_user_by_id(alice, &conn), Err(Error::NotFound));
        assert_eq!(get_profile(alice, &conn), Ok(None));
        for table in ["transaction", "ledger", "budget", "user_profile"] {
            assert_eq!(count(&conn, table, alice), 0, "{table} rows left for alice");
            assert_eq!(count(&conn, table, bob), 1, "{table} rows missing for bob");
        }
        assert_eq!(count_users(&conn), Ok(1));
    }

    #[test]
    fn delete_missing_account_rolls_back() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        assert_eq!(delete_account(UserID::new(42), &conn), Err(Error::NotFound));
    }
}
