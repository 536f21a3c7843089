//! Conversion between domain entities and raw documents.
//!
//! The converter is the seam the mapping layer reads and writes entities
//! through: encode on the way into the bucket, decode on the way out, and
//! fragment decoding for partial query projections.

mod json;

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::document::{Document, RawDocument};

/// Error type for conversion failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// Encoding an entity to document content failed.
    Encode(String),
    /// Decoding document content or a fragment failed.
    Decode(String),
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::Encode(msg) => write!(f, "document encode error: {}", msg),
            ConvertError::Decode(msg) => write!(f, "document decode error: {}", msg),
        }
    }
}

impl std::error::Error for ConvertError {}

/// Converts entities to and from their stored representation.
pub trait DocumentConverter: Send + Sync {
    /// Encode an entity into a raw document keyed by the entity's id.
    fn encode<T: Document>(&self, entity: &T) -> Result<RawDocument, ConvertError>;

    /// Decode a raw document's content back into an entity.
    fn decode<T: Document>(&self, raw: &RawDocument) -> Result<T, ConvertError>;

    /// Decode a single query-selected field into a fragment type, without
    /// any document metadata involved.
    fn decode_fragment<T: DeserializeOwned>(&self, fragment: &Value)
        -> Result<T, ConvertError>;
}

pub use json::JsonConverter;
