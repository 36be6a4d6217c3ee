//! The monthly budget model and its database queries.

use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use crate::{
    Error, budget::month::BudgetMonth, database_id::BudgetId, timestamp,
    transaction::sum_expenses, user::UserID,
};

/// A spending limit for one month, either for a single category or overall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: BudgetId,
    pub user_id: UserID,
    /// The category the limit applies to, or `None` for the overall budget.
    pub category: Option<String>,
    /// The month in the format "YYYY-MM".
    pub month: String,
    pub amount: f64,
    #[serde(with = "timestamp::serde_format")]
    pub created_at: PrimitiveDateTime,
    #[serde(with = "timestamp::serde_format")]
    pub updated_at: PrimitiveDateTime,
}

/// The request body for setting a budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetForm {
    /// The spending limit, must not be negative.
    pub amount: f64,
    /// A blank or missing category sets the overall budget.
    #[serde(default)]
    pub category: Option<String>,
    /// The month the budget applies to, in the format "YYYY-MM".
    pub month: String,
}

/// A budget along with how much has been spent against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetStatus {
    #[serde(flatten)]
    pub budget: Budget,
    /// The total of the month's expenses in the budget's category, or of all
    /// expenses for the overall budget.
    pub spent: f64,
    /// The budget amount minus the amount spent, negative when overspent.
    pub remaining: f64,
}

/// Create the budget table.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                category TEXT,
                month TEXT NOT NULL,
                amount REAL NOT NULL CHECK (amount >= 0),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES users(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // NULL categories are distinct in a plain UNIQUE constraint.
    connection.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_budget_user_category_month
         ON budget(user_id, COALESCE(category, ''), month)",
        (),
    )?;

    Ok(())
}

fn map_budget_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        category: row.get(2)?,
        month: row.get(3)?,
        amount: row.get(4)?,
        created_at: timestamp::get_from_row(row, 5)?,
        updated_at: timestamp::get_from_row(row, 6)?,
    })
}

/// Set the budget of `user_id` for the form's category and month, replacing
/// the amount of an existing budget.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidBudgetAmount] if the amount is negative or not finite,
/// - [Error::InvalidMonth] if the month is not in the format "YYYY-MM",
/// - or [Error::SqlError] if there is an SQL error.
pub fn upsert_budget(
    user_id: UserID,
    form: BudgetForm,
    now: PrimitiveDateTime,
    connection: &Connection,
) -> Result<Budget, Error> {
    if !form.amount.is_finite() || form.amount < 0.0 {
        return Err(Error::InvalidBudgetAmount(form.amount));
    }

    let month = BudgetMonth::parse(&form.month)?.to_string();
    let category = form
        .category
        .as_deref()
        .map(str::trim)
        .filter(|category| !category.is_empty());
    let now = timestamp::format(now);

    let existing_id: Option<BudgetId> = connection
        .query_row(
            "SELECT id FROM budget WHERE user_id = ?1 AND category IS ?2 AND month = ?3",
            (user_id.as_i64(), category, &month),
            |row| row.get(0),
        )
        .optional()?;

    let budget = match existing_id {
        Some(id) => connection
            .prepare(
                "UPDATE budget SET amount = ?1, updated_at = ?2 WHERE id = ?3
                 RETURNING id, user_id, category, month, amount, created_at, updated_at",
            )?
            .query_row((form.amount, &now, id), map_budget_row)?,
        None => connection
            .prepare(
                "INSERT INTO budget (user_id, category, month, amount, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                 RETURNING id, user_id, category, month, amount, created_at, updated_at",
            )?
            .query_row(
                (user_id.as_i64(), category, &month, form.amount, &now),
                map_budget_row,
            )?,
    };

    Ok(budget)
}

/// Get the budgets of `user_id` for `month`, the overall budget first and
/// then by category.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_budgets(
    user_id: UserID,
    month: BudgetMonth,
    connection: &Connection,
) -> Result<Vec<Budget>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, category, month, amount, created_at, updated_at
             FROM budget WHERE user_id = ?1 AND month = ?2
             ORDER BY category IS NOT NULL, category ASC",
        )?
        .query_map((user_id.as_i64(), month.to_string()), map_budget_row)?
        .map(|budget_result| budget_result.map_err(Error::SqlError))
        .collect()
}

/// Get the budgets of `user_id` for `month` along with how much has been spent.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_budget_statuses(
    user_id: UserID,
    month: BudgetMonth,
    connection: &Connection,
) -> Result<Vec<BudgetStatus>, Error> {
    get_budgets(user_id, month, connection)?
        .into_iter()
        .map(|budget| {
            let spent = sum_expenses(
                user_id,
                budget.category.as_deref(),
                month.start(),
                month.end(),
                connection,
            )?;

            Ok(BudgetStatus {
                remaining: budget.amount - spent,
                spent,
                budget,
            })
        })
        .collect()
}

/// Delete the budget `id` owned by `user_id`.
///
/// # Errors
/// Returns [Error::BudgetNotFound] if the budget does not exist or belongs to
/// another user, or [Error::SqlError] if there is an SQL error.
pub fn delete_budget(id: BudgetId, user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM budget WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::BudgetNotFound);
    }

    Ok(())
}

/// Delete every budget owned by `user_id`, returning the number deleted.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn delete_budgets_for_user(user_id: UserID, connection: &Connection) -> Result<usize, Error> {
    connection
        .execute("DELETE FROM budget WHERE user_id = ?1", (user_id.as_i64(),))
        .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        Error,
        auth::PasswordHash,
        budget::month::BudgetMonth,
        db::initialize,
        transaction::{Transaction, TransactionType, create_transaction},
        user::{UserID, create_user},
    };

    use super::{
        BudgetForm, delete_budget, delete_budgets_for_user, get_budget_statuses, get_budgets,
        upsert_budget,
    };

    fn get_test_connection() -> (Connection, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user("alice", PasswordHash::new_unchecked("hunter2"), &conn).unwrap();

        (conn, user.id)
    }

    fn form(amount: f64, category: Option<&str>, month: &str) -> BudgetForm {
        BudgetForm {
            amount,
            category: category.map(ToOwned::to_owned),
            month: month.to_owned(),
        }
    }

    #[test]
    fn upsert_creates_then_replaces_amount() {
        let (conn, user_id) = get_test_connection();
        let created_at = datetime!(2025-03-01 09:00:00);
        let updated_at = datetime!(2025-03-05 09:00:00);

        let created = upsert_budget(user_id, form(100.0, Some("Food"), "2025-03"), created_at, &conn)
            .unwrap();
        let updated = upsert_budget(user_id, form(150.0, Some("Food"), "2025-03"), updated_at, &conn)
            .unwrap();

        assert_eq!(created.id, updated.id);
        assert_eq!(updated.amount, 150.0);
        assert_eq!(updated.created_at, created_at);
        assert_eq!(updated.updated_at, updated_at);
        let month = BudgetMonth::parse("2025-03").unwrap();
        assert_eq!(get_budgets(user_id, month, &conn), Ok(vec![updated]));
    }

    #[test]
    fn overall_budget_is_unique_per_month() {
        let (conn, user_id) = get_test_connection();
        let now = datetime!(2025-03-01 09:00:00);

        let first = upsert_budget(user_id, form(500.0, None, "2025-03"), now, &conn).unwrap();
        let second = upsert_budget(user_id, form(600.0, Some("  "), "2025-03"), now, &conn).unwrap();
        upsert_budget(user_id, form(700.0, None, "2025-04"), now, &conn).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.category, None);
        let month = BudgetMonth::parse("2025-03").unwrap();
        assert_eq!(get_budgets(user_id, month, &conn).unwrap().len(), 1);
    }

    #[test]
    fn overall_budget_is_listed_first() {
        let (conn, user_id) = get_test_connection();
        let now = datetime!(2025-03-01 09:00:00);
        upsert_budget(user_id, form(50.0, Some("Transport"), "2025-03"), now, &conn).unwrap();
        upsert_budget(user_id, form(500.0, None, "2025-03"), now, &conn).unwrap();
        upsert_budget(user_id, form(100.0, Some("Food"), "2025-03"), now, &conn).unwrap();

        let month = BudgetMonth::parse("2025-03").unwrap();
        let categories: Vec<_> = get_budgets(user_id, month, &conn)
            .unwrap()
            .into_iter()
            .map(|budget| budget.category)
            .collect();

        assert_eq!(
            categories,
            vec![None, Some("Food".to_owned()), Some("Transport".to_owned())]
        );
    }

    #[test]
    fn upsert_rejects_invalid_input() {
        let (conn, user_id) = get_test_connection();
        let now = datetime!(2025-03-01 09:00:00);

        assert_eq!(
            upsert_budget(user_id, form(-1.0, None, "2025-03"), now, &conn),
            Err(Error::InvalidBudgetAmount(-1.0))
        );
        assert_eq!(
            upsert_budget(user_id, form(1.0, None, "March"), now, &conn),
            Err(Error::InvalidMonth("March".to_owned()))
        );
    }

    #[test]
    fn status_sums_expenses_in_month() {
        let (conn, user_id) = get_test_connection();
        let now = datetime!(2025-03-01 09:00:00);
        upsert_budget(user_id, form(500.0, None, "2025-03"), now, &conn).unwrap();
        upsert_budget(user_id, form(100.0, Some("Food"), "2025-03"), now, &conn).unwrap();
        for (amount, transaction_type, category, date) in [
            (40.0, TransactionType::Expense, "Food", datetime!(2025-03-02 12:00:00)),
            (80.0, TransactionType::Expense, "Food", datetime!(2025-03-31 23:59:59)),
            (200.0, TransactionType::Expense, "Rent", datetime!(2025-03-15 12:00:00)),
            (999.0, TransactionType::Income, "Food", datetime!(2025-03-15 12:00:00)),
            (999.0, TransactionType::Expense, "Food", datetime!(2025-04-01 00:00:00)),
        ] {
            create_transaction(
                user_id,
                Transaction::build(amount, transaction_type, category).date(date),
                now,
                &conn,
            )
            .unwrap();
        }

        let month = BudgetMonth::parse("2025-03").unwrap();
        let statuses = get_budget_statuses(user_id, month, &conn).unwrap();

        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[0].budget.category, None);
        assert_eq!(statuses[0].spent, 320.0);
        assert_eq!(statuses[0].remaining, 180.0);
        assert_eq!(statuses[1].budget.category.as_deref(), Some("Food"));
        assert_eq!(statuses[1].spent, 120.0);
        assert_eq!(statuses[1].remaining, -20.0);
    }

    #[test]
    fn delete_budget_checks_owner() {
        let (conn, alice) = get_test_connection();
        let bob = create_user("bob", PasswordHash::new_unchecked("hunter2"), &conn)
            .unwrap()
            .id;
        let now = datetime!(2025-03-01 09:00:00);
        let budget = upsert_budget(alice, form(1.0, None, "2025-03"), now, &conn).unwrap();
        upsert_budget(alice, form(1.0, None, "2025-04"), now, &conn).unwrap();

        assert_eq!(delete_budget(budget.id, bob, &conn), Err(Error::BudgetNotFound));
        assert_eq!(delete_budget(budget.id, alice, &conn), Ok(()));
        assert_eq!(delete_budget(budget.id, alice, &conn), Err(Error::BudgetNotFound));
        assert_eq!(delete_budgets_for_user(alice, &conn), Ok(1));
    }
}
