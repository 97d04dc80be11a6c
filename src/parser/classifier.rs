//! Line classification

use crate::config::Config;

/// The shape of a single line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    Blank,
    Comment,
    /// A genre header followed by minimal planned items
    CompactPlanned,
    Regular,
}

/// Decide what kind of line `line` is.
#[must_use]
pub fn classify(line: &str, config: &Config) -> LineKind {
    if line.trim().is_empty() {
        return LineKind::Blank;
    }

    let grammar = config.grammar();
    let comment_character = &config.settings().lines.comment_character;
    if line.starts_with(comment_character.as_str()) || grammar.comment_start.is_match(line) {
        if grammar.compact_planned_line_start.is_match(line) {
            return LineKind::CompactPlanned;
        }
        return LineKind::Comment;
    }

    LineKind::Regular
}
