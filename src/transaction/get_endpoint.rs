//! Defines the endpoints for listing a user's transactions and fetching a single transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::Deserialize;
use time::PrimitiveDateTime;

use crate::{
    AppState, Error,
    database_id::TransactionId,
    db::lock_connection,
    extract::{Json, Path, Query},
    pagination::{Page, Pagination},
    timestamp,
    transaction::{
        Transaction, TransactionType,
        core::get_transaction,
        query::{TransactionFilter, count_transactions, query_transactions},
    },
    user::User,
};

/// The state needed to read transactions.
#[derive(Debug, Clone)]
pub struct TransactionReadState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionReadState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters for listing and summarising transactions.
///
/// Dates may be given as "YYYY-MM-DD" or "YYYY-MM-DDTHH:MM:SS".
#[derive(Debug, Default, Deserialize)]
pub struct TransactionQuery {
    /// How many transactions to skip, defaults to zero.
    pub skip: Option<u64>,
    /// How many transactions to return, defaults to 100 and is capped at 1000.
    pub limit: Option<u64>,
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    /// Only list transactions in this category. A blank category matches every category.
    pub category: Option<String>,
    #[serde(default, with = "timestamp::option_serde_format")]
    pub start_date: Option<PrimitiveDateTime>,
    #[serde(default, with = "timestamp::option_serde_format")]
    pub end_date: Option<PrimitiveDateTime>,
}

impl TransactionQuery {
    /// The filter conditions in the query. A blank category matches every category.
    pub fn filter(&self) -> TransactionFilter {
        TransactionFilter {
            transaction_type: self.transaction_type,
            category: self
                .category
                .as_deref()
                .map(str::trim)
                .filter(|category| !category.is_empty())
                .map(ToOwned::to_owned),
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

/// A route handler for listing the current user's transactions, newest first.
pub async fn get_transactions_endpoint(
    State(state): State<TransactionReadState>,
    Extension(user): Extension<User>,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<Page<Transaction>>, Error> {
    let pagination = Pagination::new(query.skip, query.limit);
    let filter = query.filter();
    let connection = lock_connection(&state.db_connection)?;

    let items = query_transactions(user.id, &filter, pagination, &connection)?;
    let total = count_transactions(user.id, &filter, &connection)?;

    Ok(Json(Page::new(items, total, pagination)))
}

/// A route handler for getting one of the current user's transactions.
pub async fn get_transaction_endpoint(
    State(state): State<TransactionReadState>,
    Extension(user): Extension<User>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<Transaction>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_transaction(transaction_id, user.id, &connection).map(Json)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;

    use crate::{
        endpoints::{self, format_endpoint},
        pagination::Page,
        test_utils::{
            assert_detail, assert_detail_contains, get_test_server, get_test_state,
            register_and_log_in,
        },
        transaction::Transaction,
    };

    async fn create(server: &TestServer, token: &str, amount: f64, kind: &str, date: &str) -> Transaction {
        server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(token)
            .json(&json!({
                "amount": amount,
                "type": kind,
                "category": "Food",
                "date": date,
            }))
            .await
            .json()
    }

    #[tokio::test]
    async fn list_returns_page_newest_first() {
        let server = get_test_server(get_test_state());
        let token = register_and_log_in(&server, "alice").await;
        let oldest = create(&server, &token, 1.0, "expense", "2025-01-01T00:00:00").await;
        let newest = create(&server, &token, 2.0, "expense", "2025-01-03T00:00:00").await;
        let middle = create(&server, &token, 3.0, "income", "2025-01-02T00:00:00").await;

        let response = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .await;

        response.assert_status_ok();
        let page: Page<Transaction> = response.json();
        assert_eq!(page.items, vec![newest, middle, oldest]);
        assert_eq!(page.total, 3);
        assert_eq!(page.skip, 0);
        assert_eq!(page.limit, 100);
    }

    #[tokio::test]
    async fn list_applies_query_parameters() {
        let server = get_test_server(get_test_state());
        let token = register_and_log_in(&server, "alice").await;
        create(&server, &token, 1.0, "expense", "2025-01-01T00:00:00").await;
        let want = create(&server, &token, 2.0, "expense", "2025-01-03T00:00:00").await;
        create(&server, &token, 3.0, "expense", "2025-01-05T00:00:00").await;
        create(&server, &token, 4.0, "income", "2025-01-03T00:00:00").await;

        let response = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .add_query_param("type", "expense")
            .add_query_param("start_date", "2025-01-02")
            .add_query_param("end_date", "2025-01-04")
            .add_query_param("limit", 5000)
            .await;

        response.assert_status_ok();
        let page: Page<Transaction> = response.json();
        assert_eq!(page.items, vec![want]);
        assert_eq!(page.total, 1);
        assert_eq!(page.limit, 1000);
    }

    #[tokio::test]
    async fn list_rejects_unknown_type_with_json_detail() {
        let server = get_test_server(get_test_state());
        let token = register_and_log_in(&server, "alice").await;

        let response = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .add_query_param("type", "bogus")
            .await;

        assert_detail_contains(&response, StatusCode::BAD_REQUEST, "bogus");
    }

    #[tokio::test]
    async fn get_transaction_rejects_non_numeric_id_with_json_detail() {
        let server = get_test_server(get_test_state());
        let token = register_and_log_in(&server, "alice").await;

        let response = server
            .get("/api/transactions/abc")
            .authorization_bearer(&token)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert!(body["detail"].is_string(), "got {body}");
    }

    #[tokio::test]
    async fn list_only_shows_own_transactions() {
        let server = get_test_server(get_test_state());
        let alice = register_and_log_in(&server, "alice").await;
        let bob = register_and_log_in(&server, "bob").await;
        create(&server, &alice, 1.0, "expense", "2025-01-01T00:00:00").await;

        let page: Page<Transaction> = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(&bob)
            .await
            .json();

        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn get_transaction_succeeds() {
        let server = get_test_server(get_test_state());
        let token = register_and_log_in(&server, "alice").await;
        let transaction = create(&server, &token, 1.0, "expense", "2025-01-01T00:00:00").await;

        let response = server
            .get(&format_endpoint(endpoints::TRANSACTION, transaction.id))
            .authorization_bearer(&token)
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Transaction>(), transaction);
    }

    #[tokio::test]
    async fn get_other_users_transaction_is_not_found() {
        let server = get_test_server(get_test_state());
        let alice = register_and_log_in(&server, "alice").await;
        let bob = register_and_log_in(&server, "bob").await;
        let transaction = create(&server, &alice, 1.0, "expense", "2025-01-01T00:00:00").await;

        let response = server
            .get(&format_endpoint(endpoints::TRANSACTION, transaction.id))
            .authorization_bearer(&bob)
            .await;

        assert_detail(&response, StatusCode::NOT_FOUND, "Transaction not found");
    }
}
