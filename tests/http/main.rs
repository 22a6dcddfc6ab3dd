//! End-to-end tests: TransactionManager over HttpEngine against a local server.

#[path = "../common/mod.rs"]
mod common;

mod concurrent_submitters;
mod failures;
mod get_and_post;
