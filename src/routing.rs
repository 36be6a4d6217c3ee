//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde_json::json;
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{auth_guard, post_log_in},
    budget::{
        delete_budget_endpoint, get_budget_status_endpoint, get_budgets_endpoint,
        set_budget_endpoint,
    },
    endpoints,
    ledger::{
        create_ledger_endpoint, delete_ledger_endpoint, edit_ledger_endpoint, get_ledger_endpoint,
        get_ledgers_endpoint,
    },
    logging::logging_middleware,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, edit_transaction_endpoint,
        get_category_totals_endpoint, get_statistics_endpoint, get_transaction_endpoint,
        get_transactions_endpoint,
    },
    upload::{UPLOAD_BODY_LIMIT, upload_file},
    user::{
        change_password, delete_current_user, get_current_user, register_user,
        update_current_user,
    },
};

/// Return a router with all the app's routes.
///
/// Every route under `/api` except log in and registration requires a bearer token.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::REGISTER, post(register_user));

    let protected_routes = Router::new()
        .route(
            endpoints::CURRENT_USER,
            get(get_current_user)
                .put(update_current_user)
                .delete(delete_current_user),
        )
        .route(endpoints::CURRENT_USER_PASSWORD, put(change_password))
        .route(
            endpoints::UPLOAD,
            post(upload_file).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            endpoints::TRANSACTIONS,
            get(get_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .put(edit_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION_STATISTICS,
            get(get_statistics_endpoint),
        )
        .route(
            endpoints::TRANSACTION_CATEGORIES,
            get(get_category_totals_endpoint),
        )
        .route(
            endpoints::LEDGERS,
            get(get_ledgers_endpoint).post(create_ledger_endpoint),
        )
        .route(
            endpoints::LEDGER,
            get(get_ledger_endpoint)
                .put(edit_ledger_endpoint)
                .delete(delete_ledger_endpoint),
        )
        .route(
            endpoints::BUDGETS,
            get(get_budgets_endpoint).post(set_budget_endpoint),
        )
        .route(endpoints::BUDGET_STATUS, get(get_budget_status_endpoint))
        .route(endpoints::BUDGET, delete(delete_budget_endpoint))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    let upload_dir = state.upload_dir.clone();

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::UPLOADS, ServeDir::new(upload_dir))
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

async fn get_404_not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not Found" }))).into_response()
}
