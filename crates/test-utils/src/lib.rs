//! Shared test utilities for the warehouse workspace.
//!
//! This crate provides common testing infrastructure including:
//! - An in-memory [`MemoryReader`] standing in for NetCDF files
//! - Time series generators for fixed-step and monthly data
//! - Fixtures that lay out dataset directories on disk
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod generators;
pub mod reader;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;
pub use reader::MemoryReader;
