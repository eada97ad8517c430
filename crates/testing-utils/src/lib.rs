//! # Validator Testing Utils
//!
//! Shared testing utilities for the cluster validation engine.
//! This crate provides scripted command executors, mock session connectors,
//! mock lifecycle actions and builders for the cluster text formats the
//! engine parses.
//!
//! ## Usage
//!
//! Add this crate as a dev-dependency:
//!
//! ```toml
//! [dev-dependencies]
//! validator-testing-utils = { path = "../testing-utils" }
//! ```
//!
//! Then use the mocks in your tests:
//!
//! ```rust,ignore
//! use validator_testing_utils::mocks::*;
//! use validator_testing_utils::builders::BhostsOutputBuilder;
//! ```

pub mod builders;
pub mod mocks;

// Re-export commonly used items
pub use builders::*;
pub use mocks::*;
