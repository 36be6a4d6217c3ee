//! Defines the endpoint for deleting a transaction.

use axum::{
    Extension,
    extract::State,
    http::StatusCode,
};

use crate::{
    Error,
    database_id::TransactionId,
    db::lock_connection,
    extract::Path,
    transaction::{core::delete_transaction, get_endpoint::TransactionReadState},
    user::User,
};

/// A route handler for deleting one of the current user's transactions, responds with 204 No Content.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionReadState>,
    Extension(user): Extension<User>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_transaction(transaction_id, user.id, &connection)?;
    tracing::debug!("User {} deleted transaction {transaction_id}", user.id);

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::{
        endpoints::{self, format_endpoint},
        test_utils::{assert_detail, get_test_server, get_test_state, register_and_log_in},
        transaction::Transaction,
    };

    #[tokio::test]
    async fn delete_transaction_succeeds() {
        let server = get_test_server(get_test_state());
        let token = register_and_log_in(&server, "alice").await;
        let transaction: Transaction = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .json(&json!({ "amount": 1.0, "type": "expense", "category": "Food" }))
            .await
            .json();
        let path = format_endpoint(endpoints::TRANSACTION, transaction.id);

        server
            .delete(&path)
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let response = server.get(&path).authorization_bearer(&token).await;
        assert_detail(&response, StatusCode::NOT_FOUND, "Transaction not found");
    }

    #[tokio::test]
    async fn delete_other_users_transaction_is_not_found() {
        let server = get_test_server(get_test_state());
        let alice = register_and_log_in(&server, "alice").await;
        let bob = register_and_log_in(&server, "bob").await;
        let transaction: Transaction = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&alice)
            .json(&json!({ "amount": 1.0, "type": "expense", "category": "Food" }))
            .await
            .json();
        let path = format_endpoint(endpoints::TRANSACTION, transaction.id);

        let response = server.delete(&path).authorization_bearer(&bob).await;

        assert_detail(&response, StatusCode::NOT_FOUND, "Transaction not found");
        server
            .get(&path)
            .authorization_bearer(&alice)
            .await
            .assert_status_ok();
    }
}
