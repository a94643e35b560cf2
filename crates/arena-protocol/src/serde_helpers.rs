//! Serde helpers for the text encoding.

/// Byte fields travel as standard base64 strings in JSON.
pub mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Encode as a base64 string.
    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    /// Decode from a base64 string.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(&s)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Blob {
        #[serde(with = "super::base64_bytes")]
        data: Vec<u8>,
    }

    #[test]
    fn bytes_are_base64_strings() {
        let json = serde_json::to_string(&Blob {
            data: vec![0, 1, 2, 255],
        })
        .unwrap();
        assert_eq!(json, r#"{"data":"AAEC/w=="}"#);
    }

    #[test]
    fn invalid_base64_rejected() {
        assert!(serde_json::from_str::<Blob>(r#"{"data":"***"}"#).is_err());
    }
}
