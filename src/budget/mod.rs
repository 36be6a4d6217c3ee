//! Monthly spending limits, per category or overall, and how much of them has been spent.

mod core;
mod endpoints;
mod month;

pub use core::{BudgetForm, create_budget_table, delete_budgets_for_user, upsert_budget};
pub use endpoints::{
    delete_budget_endpoint, get_budget_status_endpoint, get_budgets_endpoint, set_budget_endpoint,
};

#[cfg(test)]
pub use core::{Budget, BudgetStatus};
#[cfg(test)]
pub use month::BudgetMonth;
