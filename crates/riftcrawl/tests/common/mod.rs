//! Shared test utilities for riftcrawl integration tests.
//!
//! This module provides:
//! - `FakeRiot`, a scripted stats API with call counting and cancellation hooks
//! - Builders for league entries, accounts and match details

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::{FakeRiot, TestHarness};
