//! Server internals for the roster service.
//!
//! The binary in `main.rs` wires these modules together; everything here is
//! constructed once at boot and passed by reference (no global state):
//!
//! - [`config`]: environment-driven configuration,
//! - [`store`]: the persistence gateway (PostgreSQL adapter plus an
//!   in-memory stub for tests),
//! - [`auth`]: credential verification and registration,
//! - [`collection`]: the write-through in-memory person list,
//! - [`commands`]: the command registry,
//! - [`dispatch`]: the request router,
//! - [`server`] / [`connection`]: the TCP accept loop, bounded I/O pools,
//!   and per-connection frame pipeline,
//! - [`console`]: the stdin admin console,
//! - [`state`]: the shared shutdown flag.

pub mod auth;
pub mod collection;
pub mod commands;
pub mod config;
pub mod connection;
pub mod console;
pub mod dispatch;
pub mod server;
pub mod state;
pub mod store;
