//! Stable exit codes for `codeview` commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Invalid root, navigation, config, or I/O failure.
pub const INVALID: i32 = 1;
/// `codeview build`: the compile stage failed.
pub const COMPILE_FAILED: i32 = 2;
/// `codeview build`: compile passed (or was skipped over) but the run stage failed.
pub const RUN_FAILED: i32 = 3;
/// `codeview build --clean`: compile and run passed but the clean stage failed.
pub const CLEAN_FAILED: i32 = 4;
