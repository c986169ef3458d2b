use std::path::Path;

use serde::{Deserialize, Serialize};

use keyprobe_common::{Result, error::Error};
use keyprobe_index::{IndexWriterConfig, OpenMode, segment::format::MAX_DOCS};

use crate::key::KeyEncoding;

/// Harness settings. Every field has a default, so a JSON file only needs the
/// fields it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Number of documents (and candidate keys) per trial.
    pub doc_count: u64,
    /// Payload length in symbols.
    pub payload_len: usize,
    /// Seeds the payload generator; random when absent.
    pub payload_seed: Option<u64>,
    /// Trials to run, in order.
    pub encodings: Vec<KeyEncoding>,
    /// Buffered documents per flushed segment.
    pub max_buffered_docs: usize,
    /// Name prefix of the temporary index root.
    pub temp_prefix: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfig {
            doc_count: 1_000_000,
            payload_len: 256,
            payload_seed: None,
            encodings: KeyEncoding::ALL.to_vec(),
            max_buffered_docs: 1_000_000,
            temp_prefix: "lookup".to_string(),
        }
    }
}

impl HarnessConfig {
    pub fn from_json(json: &str) -> Result<HarnessConfig> {
        serde_json::from_str(json)
            .map_err(|e| Error::invalid_arg("config", format!("malformed JSON: {e}")))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<HarnessConfig> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("read {}", path.display()), e))?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.doc_count > MAX_DOCS {
            return Err(Error::invalid_arg(
                "doc_count",
                format!("{} exceeds the index limit of {MAX_DOCS}", self.doc_count),
            ));
        }
        if self.payload_len == 0 {
            return Err(Error::invalid_arg("payload_len", "must be positive"));
        }
        if self.encodings.is_empty() {
            return Err(Error::invalid_arg("encodings", "at least one encoding is required"));
        }
        for (i, encoding) in self.encodings.iter().enumerate() {
            if self.encodings[..i].contains(encoding) {
                return Err(Error::invalid_arg(
                    "encodings",
                    format!("{encoding} is listed more than once"),
                ));
            }
        }
        if self.max_buffered_docs == 0 {
            return Err(Error::invalid_arg("max_buffered_docs", "must be positive"));
        }
        Ok(())
    }

    pub fn writer_config(&self) -> IndexWriterConfig {
        IndexWriterConfig::default()
            .with_open_mode(OpenMode::Create)
            .with_max_buffered_docs(self.max_buffered_docs)
    }
}

#[cfg(test)]
mod tests {
    use keyprobe_common::error::ErrorKind;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::default();
        assert_eq!(config.doc_count, 1_000_000);
        assert_eq!(config.payload_len, 256);
        assert_eq!(config.encodings, vec![KeyEncoding::String, KeyEncoding::Numeric]);
        assert_eq!(config.temp_prefix, "lookup");
        config.validate().unwrap();
        assert_eq!(config.writer_config().open_mode, OpenMode::Create);
    }

    #[test]
    fn test_partial_json() {
        let config =
            HarnessConfig::from_json(r#"{"doc_count": 1000, "encodings": ["numeric"]}"#).unwrap();
        assert_eq!(config.doc_count, 1000);
        assert_eq!(config.encodings, vec![KeyEncoding::Numeric]);
        assert_eq!(config.payload_len, 256);
        assert!(HarnessConfig::from_json(r#"{"docs": 5}"#).is_err());
        assert!(HarnessConfig::from_json(r#"{"encodings": ["uuid"]}"#).is_err());

        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("harness.json");
        std::fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();
        assert_eq!(HarnessConfig::from_json_file(&path).unwrap(), config);
        let err = HarnessConfig::from_json_file(tempdir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Io { .. }));
    }

    #[test]
    fn test_validation() {
        let invalid = [
            HarnessConfig {
                payload_len: 0,
                ..Default::default()
            },
            HarnessConfig {
                encodings: Vec::new(),
                ..Default::default()
            },
            HarnessConfig {
                encodings: vec![KeyEncoding::Numeric, KeyEncoding::Numeric],
                ..Default::default()
            },
            HarnessConfig {
                max_buffered_docs: 0,
                ..Default::default()
            },
            HarnessConfig {
                doc_count: u32::MAX as u64,
                ..Default::default()
            },
        ];
        for config in invalid {
            let err = config.validate().unwrap_err();
            assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
        }
        HarnessConfig {
            doc_count: 0,
            ..Default::default()
        }
        .validate()
        .unwrap();
    }
}
