#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

uniffi::setup_scaffolding!();

pub mod config;
pub mod error;
pub mod ffi;
pub mod grammar;
pub mod models;
pub mod parser;
pub mod template;

// Re-export common types for convenience
pub use config::{Config, Continuation, ErrorSink, Loader, LogErrorSink, Settings};
pub use error::{
    ConfigError, ConfigResult, InvalidItemError, ParseError, ParseResult, ReadlogError,
    ReadlogResult, ResourceError, ResourceResult,
};
pub use models::{Experience, Format, Item, Length, Series, Source, Variant};
pub use parser::{ParseManager, ParseOptions};
