//! Database queries for listing and summarising a user's transactions.

use rusqlite::{Connection, params_from_iter, types::Value};
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use crate::{Error, db::get_count, pagination::Pagination, timestamp, user::UserID};

use super::core::{Transaction, TransactionType, map_transaction_row};

/// Optional conditions that transactions must match.
///
/// Date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub transaction_type: Option<TransactionType>,
    pub category: Option<String>,
    pub start_date: Option<PrimitiveDateTime>,
    pub end_date: Option<PrimitiveDateTime>,
}

/// Total income and expenses over a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionSummary {
    /// The sum of all matching income.
    pub total_income: f64,
    /// The sum of all matching expenses.
    pub total_expense: f64,
    /// Income minus expenses.
    pub balance: f64,
}

/// The total amount and number of transactions in one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    /// The category of the transactions.
    pub category: String,
    /// Whether the transactions are income or expenses.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The sum of the transactions' amounts.
    pub total: f64,
    /// How many transactions were summed.
    pub count: u64,
}

/// Build the `WHERE` clause and its parameters for the transactions of `user_id` matching `filter`.
fn where_clause(user_id: UserID, filter: &TransactionFilter) -> (String, Vec<Value>) {
    let mut where_clause_parts = vec!["user_id = ?1".to_owned()];
    let mut query_parameters = vec![Value::Integer(user_id.as_i64())];

    if let Some(transaction_type) = filter.transaction_type {
        query_parameters.push(Value::Text(transaction_type.as_str().to_owned()));
        where_clause_parts.push(format!("type = ?{}", query_parameters.len()));
    }

    if let Some(category) = &filter.category {
        query_parameters.push(Value::Text(category.clone()));
        where_clause_parts.push(format!("category = ?{}", query_parameters.len()));
    }

    if let Some(start_date) = filter.start_date {
        query_parameters.push(Value::Text(timestamp::format(start_date)));
        where_clause_parts.push(format!("date >= ?{}", query_parameters.len()));
    }

    if let Some(end_date) = filter.end_date {
        query_parameters.push(Value::Text(timestamp::format(end_date)));
        where_clause_parts.push(format!("date <= ?{}", query_parameters.len()));
    }

    (
        format!("WHERE {}", where_clause_parts.join(" AND ")),
        query_parameters,
    )
}

/// Get one page of the transactions of `user_id` that match `filter`, newest first.
///
/// # Errors
/// This function will return a [Error::SqlError] there is a SQL error.
pub fn query_transactions(
    user_id: UserID,
    filter: &TransactionFilter,
    pagination: Pagination,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let (where_clause, mut query_parameters) = where_clause(user_id, filter);
    let (limit, offset) = pagination.as_sql_params();
    query_parameters.push(Value::Integer(limit));
    query_parameters.push(Value::Integer(offset));

    // Sort by date, and then ID to keep transaction order stable after updates
    let query_string = format!(
        "SELECT id, user_id, amount, type, category, description, image_path, date, created_at, updated_at \
         FROM \"transaction\" {where_clause} \
         ORDER BY date DESC, id DESC LIMIT ?{} OFFSET ?{}",
        query_parameters.len() - 1,
        query_parameters.len(),
    );

    connection
        .prepare(&query_string)?
        .query_map(params_from_iter(query_parameters.iter()), map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::SqlError))
        .collect()
}

/// Count the transactions of `user_id` that match `filter`.
///
/// # Errors
/// This function will return a [Error::SqlError] there is a SQL error.
pub fn count_transactions(
    user_id: UserID,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<u64, Error> {
    let (where_clause, query_parameters) = where_clause(user_id, filter);

    connection
        .query_row(
            &format!("SELECT COUNT(id) FROM \"transaction\" {where_clause}"),
            params_from_iter(query_parameters.iter()),
            |row| get_count(row, 0),
        )
        .map_err(Error::from)
}

/// Sum the income and expenses of `user_id` between the optional, inclusive date bounds.
///
/// Missing totals are reported as zero.
///
/// # Errors
/// This function will return a [Error::SqlError] there is a SQL error.
pub fn get_summary(
    user_id: UserID,
    start_date: Option<PrimitiveDateTime>,
    end_date: Option<PrimitiveDateTime>,
    connection: &Connection,
) -> Result<TransactionSummary, Error> {
    let filter = TransactionFilter {
        start_date,
        end_date,
        ..Default::default()
    };
    let (where_clause, query_parameters) = where_clause(user_id, &filter);

    let (total_income, total_expense): (f64, f64) = connection.query_row(
        &format!(
            "SELECT \
                COALESCE(SUM(CASE WHEN type = 'income' THEN amount END), 0.0), \
                COALESCE(SUM(CASE WHEN type = 'expense' THEN amount END), 0.0) \
             FROM \"transaction\" {where_clause}"
        ),
        params_from_iter(query_parameters.iter()),
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    Ok(TransactionSummary {
        total_income,
        total_expense,
        balance: total_income - total_expense,
    })
}

/// Total the transactions of `user_id` matching `filter` by category and type,
/// largest total first.
///
/// The category in `filter` is ignored.
///
/// # Errors
/// This function will return a [Error::SqlError] there is a SQL error.
pub fn get_category_totals(
    user_id: UserID,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<CategoryTotal>, Error> {
    let filter = TransactionFilter {
        category: None,
        ..filter.clone()
    };
    let (where_clause, query_parameters) = where_clause(user_id, &filter);

    connection
        .prepare(&format!(
            "SELECT category, type, SUM(amount) AS total, COUNT(id) \
             FROM \"transaction\" {where_clause} \
             GROUP BY category, type ORDER BY total DESC, category ASC"
        ))?
        .query_map(params_from_iter(query_parameters.iter()), |row| {
            Ok(CategoryTotal {
                category: row.get(0)?,
                transaction_type: row.get(1)?,
                total: row.get(2)?,
                count: get_count(row, 3)?,
            })
        })?
        .map(|total_result| total_result.map_err(Error::SqlError))
        .collect()
}

/// Sum the expenses of `user_id` dated in `[start, end)`, optionally limited to one category.
///
/// # Errors
/// This function will return a [Error::SqlError] there is a SQL error.
pub fn sum_expenses(
    user_id: UserID,
    category: Option<&str>,
    start: PrimitiveDateTime,
    end: PrimitiveDateTime,
    connection: &Connection,
) -> Result<f64, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(amount), 0.0) FROM \"transaction\" \
             WHERE user_id = ?1 AND type = 'expense' AND date >= ?2 AND date < ?3 \
             AND (?4 IS NULL OR category = ?4)",
            (
                user_id.as_i64(),
                timestamp::format(start),
                timestamp::format(end),
                category,
            ),
            |row| row.get(0),
        )
        .map_err(Error::from)
}
