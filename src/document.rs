use std::fmt;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Trait for types that can be stored in a bucket.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Returns the unique key of this document.
    fn id(&self) -> &str;
}

/// A document as the bucket client sees it: key, CAS token and encoded
/// JSON content.
///
/// The CAS (compare-and-swap) token is assigned by the store on every
/// mutation; a freshly encoded document carries 0.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawDocument {
    pub id: String,
    pub cas: u64,
    #[serde(with = "content_serde")]
    pub content: Vec<u8>,
}

mod content_serde {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(content: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        STANDARD.encode(content).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}

impl RawDocument {
    pub fn new(id: impl Into<String>, content: Vec<u8>) -> Self {
        RawDocument {
            id: id.into(),
            cas: 0,
            content,
        }
    }

    /// Create a raw document carrying a store-assigned CAS token.
    pub fn with_cas(id: impl Into<String>, content: Vec<u8>, cas: u64) -> Self {
        RawDocument {
            id: id.into(),
            cas,
            content,
        }
    }

    /// Get the raw content bytes.
    pub fn content_bytes(&self) -> &[u8] {
        &self.content
    }
}

impl fmt::Debug for RawDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawDocument")
            .field("id", &self.id)
            .field("cas", &self.cas)
            .field("content_len", &self.content.len())
            .finish()
    }
}
