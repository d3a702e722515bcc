//! Core of a homework code viewer.
//!
//! Three pieces carry the interesting behaviour:
//!
//! - **[`navigator`]**: a directory cursor that can never leave the project root.
//! - **[`core::fold`]**: single-pass fold marker extraction over region,
//!   brace-block, and doc-comment grammars.
//! - **[`pipeline`]**: compile-then-run on a worker thread, reporting build
//!   state and failures back to the interactive loop.
//!
//! [`core`] is pure and deterministic. [`io`] holds every side effect
//! (filesystem, processes, config, UI marshalling) behind traits so tests can
//! substitute fakes. [`session`] ties navigation, documents, and folds together.

pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod navigator;
pub mod pipeline;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
