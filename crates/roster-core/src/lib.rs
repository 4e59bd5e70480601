//! Shared core for the roster service.
//!
//! This crate holds everything the daemon and the CLI agree on:
//!
//! - the validated domain model ([`person`], [`user`]),
//! - credential hashing and verification ([`credentials`]),
//! - the wire protocol ([`protocol`]): length-prefixed framing plus the
//!   binary `Request`/`Response` payload schema.
//!
//! Nothing in here performs I/O beyond what the codec traits require; the
//! daemon wires these pieces to sockets and the database.

pub mod credentials;
pub mod person;
pub mod protocol;
pub mod user;

pub use person::{Coordinates, Country, HairColor, Location, NewPerson, Person, ValidationError};
pub use user::UserRecord;
