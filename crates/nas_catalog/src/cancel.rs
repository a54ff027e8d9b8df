//! Cooperative cancellation shared by the task server, the scan loop and
//! the binary's signal handler.
//!
//! The scan polls `is_cancelled()` between files; idle loops wait on
//! `cancelled()` inside `select!`.

pub use tokio_util::sync::CancellationToken;
