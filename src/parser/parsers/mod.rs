//! Parsers for the two line shapes that produce items

pub mod compact_planned;
pub mod regular;

pub use compact_planned::CompactPlannedLineParser;
pub use regular::RegularLineParser;
