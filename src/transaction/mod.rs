//! Transaction management for the budgeting application.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing, querying, and summarising transactions
//! - Route handlers for the transaction API

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod get_endpoint;
mod query;
mod summary_endpoint;

pub use core::{
    Transaction, TransactionBuilder, TransactionType, create_transaction,
    create_transaction_table, delete_transactions_for_user,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use get_endpoint::{get_transaction_endpoint, get_transactions_endpoint};
pub use query::sum_expenses;
pub use summary_endpoint::{get_category_totals_endpoint, get_statistics_endpoint};

#[cfg(test)]
pub use core::{delete_transaction, get_transaction, update_transaction};
