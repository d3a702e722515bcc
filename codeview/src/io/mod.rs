//! I/O adapters: filesystem, documents, toolchain processes, config, and UI marshalling.

pub mod config;
pub mod document;
pub mod fs_query;
pub mod process;
pub mod toolchain;
pub mod ui;
