//! Client-side protocol plumbing for the roster service.
//!
//! The interactive shell is out of scope; this crate provides the
//! connection interface: connect with retry, send one framed request,
//! read one framed response.

pub mod client;

pub use client::{ClientError, ClientOptions, RosterClient};
