//! Core types, computations and trait definitions for sunyield.
//!
//! This crate is free of database and HTTP dependencies. Every derived table
//! is computed here as a pure function of the base facts; storage backends
//! only persist the results.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod calendar;
pub mod environment;
pub mod error;
pub mod estimate;
pub mod fact;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod rollup;
pub mod site;
pub mod store;
pub mod summary;
pub mod weather;

pub use error::{Error, Result};
