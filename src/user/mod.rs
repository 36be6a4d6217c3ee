//! User accounts: registration, the current user's profile, password changes
//! and account deletion.

mod account;
mod core;
pub mod profile;
mod register;

pub use account::{change_password, delete_current_user, get_current_user, update_current_user};
pub use core::{
    User, UserID, create_user, create_user_table, delete_user, get_user_by_username,
    update_password, validate_username,
};
pub use profile::create_profile_table;
pub use register::{DetailResponse, register_user};

#[cfg(test)]
pub use core::{count_users, get_user_by_id};
