//! Wire protocol shared by the daemon and the client.
//!
//! The protocol stack is two layers:
//!
//! ```text
//! +------------------------------------------+
//! |        Request / Response payloads       |  binary records (messages)
//! +------------------------------------------+
//! |                 Framing                  |  4-byte BE length prefix
//! +------------------------------------------+
//! |              TCP transport               |
//! +------------------------------------------+
//! ```
//!
//! # Wire format
//!
//! Every message in either direction is one frame:
//!
//! ```text
//! +----------------------------+------------------+
//! | Length (4 bytes, BE)       | Payload          |
//! +----------------------------+------------------+
//! ```
//!
//! - maximum frame size: 16 MiB, validated before allocation;
//! - the payload is a serialized [`messages::Request`] (client to server)
//!   or [`messages::Response`] (server to client).
//!
//! Framing failures are fatal to a connection; payload decode failures are
//! per-message and answered with a normal error response.

pub mod error;
pub mod framing;
pub mod messages;

pub use error::{ProtocolError, ProtocolResult, MAX_FRAME_SIZE};
pub use framing::FrameCodec;
pub use messages::{
    decode_request, decode_response, encode_request, encode_response, Credentials, DecodeError,
    PersonPayload, Request, Response,
};
