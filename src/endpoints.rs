//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/ledgers/{ledger_id}', use [format_endpoint].

/// The route for uploaded files.
pub const UPLOADS: &str = "/uploads";

/// The route for logging in a user.
pub const LOG_IN: &str = "/api/login";
/// The route for registering a new user.
pub const REGISTER: &str = "/api/register";
/// The route to access the current user.
pub const CURRENT_USER: &str = "/api/users/me";
/// The route to change the current user's password.
pub const CURRENT_USER_PASSWORD: &str = "/api/users/me/password";
/// The route to upload an image.
pub const UPLOAD: &str = "/api/upload";
/// The route to access transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route for the income, expense and balance totals.
pub const TRANSACTION_STATISTICS: &str = "/api/transactions/summary/statistics";
/// The route for the totals per category.
pub const TRANSACTION_CATEGORIES: &str = "/api/transactions/summary/categories";
/// The route to access ledgers.
pub const LEDGERS: &str = "/api/ledgers";
/// The route to access a single ledger.
pub const LEDGER: &str = "/api/ledgers/{ledger_id}";
/// The route to access monthly budgets.
pub const BUDGETS: &str = "/api/budgets";
/// The route to access a single budget.
pub const BUDGET: &str = "/api/budgets/{budget_id}";
/// The route for how much of each budget has been spent.
pub const BUDGET_STATUS: &str = "/api/budgets/status";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
#[cfg(test)]
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
