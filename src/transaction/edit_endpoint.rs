//! Defines the endpoint for replacing the details of a transaction.

use axum::{Extension, extract::State};

use crate::{
    Error,
    database_id::TransactionId,
    db::lock_connection,
    extract::{Json, Path},
    timezone::local_now,
    transaction::{
        Transaction,
        core::update_transaction,
        create_endpoint::{TransactionForm, TransactionWriteState},
    },
    user::User,
};

/// A route handler for updating one of the current user's transactions.
///
/// The transaction keeps its date if the request does not include one.
pub async fn edit_transaction_endpoint(
    State(state): State<TransactionWriteState>,
    Extension(user): Extension<User>,
    Path(transaction_id): Path<TransactionId>,
    Json(form): Json<TransactionForm>,
) -> Result<Json<Transaction>, Error> {
    let now = local_now(&state.local_timezone)?;
    let connection = lock_connection(&state.db_connection)?;

    update_transaction(transaction_id, user.id, form.into(), now, &connection).map(Json)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::{
        endpoints::{self, format_endpoint},
        test_utils::{assert_detail, get_test_server, get_test_state, register_and_log_in},
        transaction::{Transaction, TransactionType},
    };

    #[tokio::test]
    async fn edit_transaction_succeeds() {
        let server = get_test_server(get_test_state());
        let token = register_and_log_in(&server, "alice").await;
        let created: Transaction = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .json(&json!({
                "amount": 1.0,
                "type": "expense",
                "category": "Food",
                "date": "2025-01-01T09:00:00",
            }))
            .await
            .json();

        let response = server
            .put(&format_endpoint(endpoints::TRANSACTION, created.id))
            .authorization_bearer(&token)
            .json(&json!({
                "amount": 42.0,
                "type": "income",
                "category": "Refund",
                "description": "Returned shoes",
            }))
            .await;

        response.assert_status_ok();
        let updated: Transaction = response.json();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.amount, 42.0);
        assert_eq!(updated.transaction_type, TransactionType::Income);
        assert_eq!(updated.category, "Refund");
        assert_eq!(updated.description.as_deref(), Some("Returned shoes"));
        assert_eq!(updated.date, created.date);
    }

    #[tokio::test]
    async fn edit_missing_transaction_is_not_found() {
        let server = get_test_server(get_test_state());
        let token = register_and_log_in(&server, "alice").await;

        let response = server
            .put(&format_endpoint(endpoints::TRANSACTION, 999))
            .authorization_bearer(&token)
            .json(&json!({ "amount": 1.0, "type": "expense", "category": "Food" }))
            .await;

        assert_detail(&response, StatusCode::NOT_FOUND, "Transaction not found");
    }
}
