//! Ledgers: named books that a user keeps their records in.

mod core;
mod endpoints;

pub use core::{LedgerForm, create_ledger, create_ledger_table, delete_ledgers_for_user};
pub use endpoints::{
    create_ledger_endpoint, delete_ledger_endpoint, edit_ledger_endpoint, get_ledger_endpoint,
    get_ledgers_endpoint,
};

#[cfg(test)]
pub use core::Ledger;
