//! Integration test suite.
//!
//! 1. End-to-end load and query
//! 2. Session façade over external clients
//! 3. Identity checkout and seed persistence

pub mod end_to_end_tests;
pub mod helpers;
pub mod identity_tests;
pub mod session_tests;
