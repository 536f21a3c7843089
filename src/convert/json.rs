use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{ConvertError, DocumentConverter};
use crate::document::{Document, RawDocument};

/// JSON converter: entities are stored as their serde_json encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonConverter;

impl JsonConverter {
    pub fn new() -> Self {
        JsonConverter
    }
}

impl DocumentConverter for JsonConverter {
    fn encode<T: Document>(&self, entity: &T) -> Result<RawDocument, ConvertError> {
        let content =
            serde_json::to_vec(entity).map_err(|e| ConvertError::Encode(e.to_string()))?;
        Ok(RawDocument::new(entity.id(), content))
    }

    fn decode<T: Document>(&self, raw: &RawDocument) -> Result<T, ConvertError> {
        serde_json::from_slice(&raw.content).map_err(|e| ConvertError::Decode(e.to_string()))
    }

    fn decode_fragment<T: DeserializeOwned>(
        &self,
        fragment: &Value,
    ) -> Result<T, ConvertError> {
        serde_json::from_value(fragment.clone())
            .map_err(|e| ConvertError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Beer {
        id: String,
        name: String,
        abv: f64,
    }

    impl Document for Beer {
        fn id(&self) -> &str {
            &self.id
        }
    }

    fn pale_ale() -> Beer {
        Beer {
            id: "beer-1".into(),
            name: "Pale Ale".into(),
            abv: 5.2,
        }
    }

    #[test]
    fn encode_keys_by_entity_id() {
        let raw = JsonConverter.encode(&pale_ale()).unwrap();
        assert_eq!(raw.id, "beer-1");
        assert_eq!(raw.cas, 0);
    }

    #[test]
    fn encode_decode_round_trip() {
        let beer = pale_ale();
        let raw = JsonConverter.encode(&beer).unwrap();
        let back: Beer = JsonConverter.decode(&raw).unwrap();
        assert_eq!(back, beer);
    }

    #[test]
    fn decode_rejects_malformed_content() {
        let raw = RawDocument::new("beer-1", b"not json".to_vec());
        let err = JsonConverter.decode::<Beer>(&raw).unwrap_err();
        assert!(matches!(err, ConvertError::Decode(_)));
    }

    #[test]
    fn decode_fragment_scalar() {
        let name: String = JsonConverter.decode_fragment(&json!("Pale Ale")).unwrap();
        assert_eq!(name, "Pale Ale");
    }

    #[test]
    fn decode_fragment_struct() {
        #[derive(Debug, PartialEq, Deserialize)]
        struct NameOnly {
            name: String,
        }

        let fragment = json!({"name": "Pale Ale"});
        let decoded: NameOnly = JsonConverter.decode_fragment(&fragment).unwrap();
        assert_eq!(
            decoded,
            NameOnly {
                name: "Pale Ale".into()
            }
        );
    }

    #[test]
    fn decode_fragment_type_mismatch() {
        let err = JsonConverter
            .decode_fragment::<u32>(&json!("not a number"))
            .unwrap_err();
        assert!(matches!(err, ConvertError::Decode(_)));
    }
}
