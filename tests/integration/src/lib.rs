//! Integration test utilities for the study-hall backend
//!
//! Provides fixtures for end-to-end tests that exercise the engines
//! against the in-memory realtime store.

pub mod fixtures;

pub use fixtures::*;
