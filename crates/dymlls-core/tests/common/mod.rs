//! Shared helpers for integration tests.

pub mod fake_toolchain;
pub mod test_utils;
