#![allow(missing_docs)]

pub(crate) mod server;

pub(crate) use server::{
    TEST_PASSWORD, assert_detail, assert_detail_contains, get_test_server, get_test_state, register_and_log_in,
};
