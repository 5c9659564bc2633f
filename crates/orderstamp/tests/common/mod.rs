//! Shared utilities for orderstamp integration tests.
//!
//! - `TestHarness`: temp folders on disk, an in-memory database and a
//!   call-counting bridge over the local file system
//! - builders for fixture CSVs and PDFs

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::{CountingBridge, TestHarness};
