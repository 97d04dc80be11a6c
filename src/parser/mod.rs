//! Line-oriented reading log parser
//!
//! A reading log is plain text, one line at a time:
//! - blank lines and comment lines are ignored
//! - compact planned lines list several planned items under one genre
//! - regular lines hold column-separated detail for one or more items
//!
//! Key design principles:
//! - The grammar is compiled once per [`Config`](crate::config::Config)
//! - Attribute extractors are small pure functions shared by both line shapes
//! - A failing line is reported and skipped; the rest of the log still parses

pub mod attributes;
pub mod classifier;
pub mod interface;
pub mod manager;
pub mod parsers;

pub use classifier::{LineKind, classify};
pub use interface::LineParser;
pub use manager::{ParseManager, ParseOptions};
pub use parsers::{CompactPlannedLineParser, RegularLineParser};
