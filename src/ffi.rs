//! `UniFFI` bindings for the reading log parser
//!
//! This module exposes parsing to other platforms (iOS, Android, Python, etc.).
//! Items cross the boundary as records, or as one CBOR payload for hosts that
//! prefer to decode with their own serde-compatible tooling.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::config::{Config, Loader};
use crate::error::ReadlogError;
use crate::models::Item;
use crate::parser::{ParseManager, ParseOptions};

/// Error type for `ReadingLog` operations
#[derive(Debug, Error, uniffi::Error)]
pub enum FfiError {
    #[error("Could not read the reading log: {0}")]
    Resource(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Failed to parse the reading log: {0}")]
    Parse(String),
    #[error("Failed to encode items: {0}")]
    Serialization(String),
}

impl From<ReadlogError> for FfiError {
    fn from(err: ReadlogError) -> Self {
        match err {
            ReadlogError::Resource(err) => Self::Resource(err.to_string()),
            ReadlogError::Config(err) => Self::Config(err.to_string()),
            ReadlogError::Parse(err) => Self::Parse(err.to_string()),
        }
    }
}

/// A configured parser usable from any platform
#[derive(Debug, uniffi::Object)]
pub struct ReadingLog {
    config: Config,
}

#[uniffi::export]
impl ReadingLog {
    /// Create a parser with the default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded defaults fail to load
    #[uniffi::constructor]
    pub fn new() -> Result<Arc<Self>, FfiError> {
        let config = Config::load_defaults().map_err(ReadlogError::from)?;
        Ok(Arc::new(Self { config }))
    }

    /// Create a parser with TOML overrides layered on the defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the overrides are not valid TOML or leave the configuration unusable
    #[uniffi::constructor]
    pub fn with_overrides(toml: String) -> Result<Arc<Self>, FfiError> {
        let config = Loader::new()
            .with_toml(&toml)
            .build()
            .map_err(ReadlogError::from)?;
        Ok(Arc::new(Self { config }))
    }

    /// Parse a whole reading log held in memory
    ///
    /// # Errors
    ///
    /// Returns an error if a line fails unrecoverably
    pub fn parse(&self, text: &str) -> Result<Vec<Item>, FfiError> {
        Ok(self.manager().parse_str(text, &ParseOptions::default())?)
    }

    /// Parse the reading log stored at `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a line fails unrecoverably
    pub fn parse_file(&self, path: &str) -> Result<Vec<Item>, FfiError> {
        Ok(self
            .manager()
            .parse_path(Some(Path::new(path)), &ParseOptions::default())?)
    }

    /// Parse a reading log and encode the items as CBOR
    ///
    /// # Errors
    ///
    /// Returns an error if parsing or encoding fails
    pub fn parse_to_cbor(&self, text: &str) -> Result<Vec<u8>, FfiError> {
        let items = self.parse(text)?;
        serde_cbor::to_vec(&items).map_err(|err| FfiError::Serialization(err.to_string()))
    }
}

impl ReadingLog {
    fn manager(&self) -> ParseManager {
        ParseManager::new(self.config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\\COOKING: 📕Salt, Fat, Acid, Heat@Author Site\n4|🔊Frank Herbert - Dune\n";

    #[test]
    fn parses_text() {
        let log = ReadingLog::new().unwrap();
        let items = log.parse(LOG).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].author.as_deref(), Some("Frank Herbert"));
    }

    #[test]
    fn cbor_payload_decodes_to_the_same_items() {
        let log = ReadingLog::new().unwrap();
        let bytes = log.parse_to_cbor(LOG).unwrap();
        let decoded: Vec<Item> = serde_cbor::from_slice(&bytes).unwrap();
        assert_eq!(decoded, log.parse(LOG).unwrap());
    }

    #[test]
    fn overrides_change_the_grammar() {
        let log = ReadingLog::with_overrides("[lines]\ncolumn_separator = \";\"\n".to_string()).unwrap();
        let items = log.parse("4;📕Dune;Library").unwrap();
        assert_eq!(items[0].rating, Some(4.0));
        assert_eq!(items[0].variants[0].sources[0].name.as_deref(), Some("Library"));
    }

    #[test]
    fn errors_are_flattened() {
        let err = ReadingLog::with_overrides("[lines]\nseparator = \"\"\n".to_string()).unwrap_err();
        assert!(matches!(err, FfiError::Config(_)));

        let log = ReadingLog::new().unwrap();
        let err = log.parse("four|📕Dune").unwrap_err();
        assert!(matches!(err, FfiError::Parse(_)));

        let err = log.parse_file("/nonexistent/readlog.txt").unwrap_err();
        assert!(matches!(err, FfiError::Resource(_)));
    }
}
