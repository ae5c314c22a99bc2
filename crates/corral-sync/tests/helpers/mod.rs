//! Test helpers for the reconciliation integration tests.

pub mod mock_directory;
