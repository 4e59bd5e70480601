//! Request/response payload schema.
//!
//! Payloads are explicit, field-tagged binary records (prost). The schema is
//! self-describing in the ways the protocol needs: optional fields carry a
//! present/absent marker, repeated fields are length-delimited, enum values
//! travel as their canonical string tags, and nested records are embedded
//! messages. `decode(encode(x)) == x` for every well-typed value.
//!
//! The wire structs are deliberately permissive; validation happens when a
//! payload is converted into the domain model ([`PersonPayload::to_person`],
//! [`PersonPayload::to_new_person`]), and any failure there surfaces as a
//! [`DecodeError`]. A decode failure is per-message: the server answers with
//! an error response and keeps the connection open.
//!
//! The structs also derive serde so tooling can read persons from JSON
//! fixtures; serde never touches the wire.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use prost::Message;
use serde::{Deserialize, Serialize};

use crate::person::{Coordinates, Location, NewPerson, Person, ValidationError};

/// Payload decode/validation failure. Per-message, never fatal to the
/// connection.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The bytes were not a well-formed record.
    #[error("malformed payload: {0}")]
    Malformed(#[from] prost::DecodeError),

    /// A mandatory embedded record was absent.
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    /// A field failed domain validation.
    #[error("invalid field: {0}")]
    Invalid(#[from] ValidationError),

    /// The creation timestamp was outside the representable range.
    #[error("invalid creation timestamp {0}")]
    InvalidTimestamp(i64),
}

/// Wire form of [`Coordinates`].
#[derive(Clone, Copy, PartialEq, Message, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatesPayload {
    #[prost(int32, tag = "1")]
    pub x: i32,
    #[prost(int32, tag = "2")]
    pub y: i32,
}

/// Wire form of [`Location`]. Only `x` is mandatory.
#[derive(Clone, PartialEq, Message, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationPayload {
    #[prost(float, tag = "1")]
    pub x: f32,
    #[prost(float, optional, tag = "2")]
    pub y: Option<f32>,
    #[prost(string, optional, tag = "3")]
    pub name: Option<String>,
}

/// Wire form of a person.
///
/// `id`, `owner_id` and `creation_date_ms` are informational on the way in:
/// the server assigns identity and ownership itself and ignores whatever a
/// client supplies.
#[derive(Clone, PartialEq, Message, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonPayload {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(int64, tag = "2")]
    pub owner_id: i64,
    #[prost(string, tag = "3")]
    pub name: String,
    #[prost(message, optional, tag = "4")]
    pub coordinates: Option<CoordinatesPayload>,
    /// Milliseconds since the Unix epoch.
    #[prost(int64, tag = "5")]
    pub creation_date_ms: i64,
    #[prost(int32, tag = "6")]
    pub height: i32,
    #[prost(int32, tag = "7")]
    pub weight: i32,
    /// Canonical tag, e.g. `"BLUE"`.
    #[prost(string, tag = "8")]
    pub hair_color: String,
    /// Canonical tag, e.g. `"USA"`.
    #[prost(string, tag = "9")]
    pub nationality: String,
    #[prost(message, optional, tag = "10")]
    pub location: Option<LocationPayload>,
}

/// Plaintext credentials accompanying a request.
#[derive(Clone, PartialEq, Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    #[prost(string, tag = "1")]
    pub username: String,
    #[prost(string, tag = "2")]
    pub password: String,
}

/// A client request.
#[derive(Clone, PartialEq, Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Request {
    #[prost(string, tag = "1")]
    pub command: String,
    #[prost(string, repeated, tag = "2")]
    pub args: Vec<String>,
    #[prost(message, repeated, tag = "3")]
    pub persons: Vec<PersonPayload>,
    #[prost(message, optional, tag = "4")]
    pub credentials: Option<Credentials>,
}

/// A server response.
#[derive(Clone, PartialEq, Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Response {
    #[prost(string, tag = "1")]
    pub message: String,
    #[prost(message, repeated, tag = "2")]
    pub persons: Vec<PersonPayload>,
    /// Non-empty only when the server wants the client to feed these lines
    /// back as further commands (`execute_script`).
    #[prost(string, tag = "3")]
    pub script: String,
}

impl Request {
    /// Builds a request carrying credentials.
    #[must_use]
    pub fn new(
        command: impl Into<String>,
        args: Vec<String>,
        persons: Vec<PersonPayload>,
        credentials: Option<Credentials>,
    ) -> Self {
        Self {
            command: command.into(),
            args,
            persons,
            credentials,
        }
    }
}

impl Response {
    /// An empty response (blank command).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A message-only response.
    #[must_use]
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// A response carrying a message and a snapshot of persons.
    #[must_use]
    pub fn with_persons(message: impl Into<String>, persons: &[Person]) -> Self {
        Self {
            message: message.into(),
            persons: persons.iter().map(PersonPayload::from).collect(),
            script: String::new(),
        }
    }

    /// A response whose `script` lines the client should replay.
    #[must_use]
    pub fn with_script(message: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            persons: Vec::new(),
            script: script.into(),
        }
    }
}

impl From<&Person> for PersonPayload {
    fn from(person: &Person) -> Self {
        Self {
            id: person.id,
            owner_id: person.owner_id,
            name: person.name.clone(),
            coordinates: Some(CoordinatesPayload {
                x: person.coordinates.x,
                y: person.coordinates.y,
            }),
            creation_date_ms: person.creation_date.timestamp_millis(),
            height: person.height,
            weight: person.weight,
            hair_color: person.hair_color.as_str().to_string(),
            nationality: person.nationality.as_str().to_string(),
            location: Some(LocationPayload {
                x: person.location.x,
                y: person.location.y,
                name: person.location.name.clone(),
            }),
        }
    }
}

impl PersonPayload {
    /// Converts into the pre-insert domain form, adopting `owner_id` from
    /// the authenticated session and discarding any client-supplied
    /// identity.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when a mandatory record is missing or a
    /// field fails validation.
    pub fn to_new_person(&self, owner_id: i64) -> Result<NewPerson, DecodeError> {
        let coords = self
            .coordinates
            .ok_or(DecodeError::MissingField("coordinates"))?;
        let coordinates = Coordinates::new(coords.x, coords.y)?;
        let location = self
            .location
            .as_ref()
            .ok_or(DecodeError::MissingField("location"))?;

        Ok(NewPerson::new(
            owner_id,
            self.name.clone(),
            coordinates,
            self.height,
            self.weight,
            self.hair_color.parse()?,
            self.nationality.parse()?,
            Location::new(location.x, location.y, location.name.clone()),
        )?)
    }

    /// Converts into the full domain form, trusting the carried identity.
    ///
    /// Only meaningful for payloads produced by the server, where `id`,
    /// `owner_id` and `creation_date_ms` are authoritative.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] for missing records, failed validation, or
    /// an unrepresentable timestamp.
    pub fn to_person(&self) -> Result<Person, DecodeError> {
        let new = self.to_new_person(self.owner_id)?;
        let creation_date = DateTime::<Utc>::from_timestamp_millis(self.creation_date_ms)
            .ok_or(DecodeError::InvalidTimestamp(self.creation_date_ms))?;
        Ok(Person::from_new(new, self.id, creation_date)?)
    }
}

/// Serializes a request into a frame payload.
#[must_use]
pub fn encode_request(request: &Request) -> Bytes {
    Bytes::from(request.encode_to_vec())
}

/// Deserializes a request from a frame payload.
///
/// # Errors
///
/// Returns [`DecodeError::Malformed`] when the bytes are not a well-formed
/// record.
pub fn decode_request(payload: &[u8]) -> Result<Request, DecodeError> {
    Ok(Request::decode(payload)?)
}

/// Serializes a response into a frame payload.
#[must_use]
pub fn encode_response(response: &Response) -> Bytes {
    Bytes::from(response.encode_to_vec())
}

/// Deserializes a response from a frame payload.
///
/// # Errors
///
/// Returns [`DecodeError::Malformed`] when the bytes are not a well-formed
/// record.
pub fn decode_response(payload: &[u8]) -> Result<Response, DecodeError> {
    Ok(Response::decode(payload)?)
}
