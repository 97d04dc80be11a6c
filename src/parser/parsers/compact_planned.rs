//! Compact planned lines
//!
//! ```text
//! \SCIENCE: 🔊Carl Sagan - Cosmos@Libby@Hoopla, 📕A Brief History of Time
//! ```

use std::sync::Arc;

use crate::config::Config;
use crate::error::{InvalidItemError, ParseResult};
use crate::models::{Source, Variant};
use crate::template::RawItem;

use super::super::attributes::{extract_author_and_title, extract_format};
use super::super::interface::{LineParser, split_items};

/// Parser for a genre header followed by planned items
#[derive(Debug)]
pub struct CompactPlannedLineParser {
    config: Arc<Config>,
    genre: Option<String>,
}

impl CompactPlannedLineParser {
    #[must_use]
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            genre: None,
        }
    }

    fn sources(&self, text: &str) -> Vec<Source> {
        let lines = &self.config.settings().lines;
        let grammar = self.config.grammar();
        text.split(lines.compact_planned_source_prefix.as_str())
            .map(|source| {
                source
                    .trim()
                    .trim_start_matches(lines.separator.as_str())
                    .trim()
            })
            .filter_map(|source| {
                grammar
                    .compact_planned_source
                    .captures(source)
                    .and_then(|caps| caps.name("source_name"))
                    .map(|name| name.as_str().trim())
            })
            .filter(|name| !name.is_empty())
            .map(Source::named)
            .collect()
    }
}

/// Lower-case a genre written entirely in upper case; leave others as written
fn normalize_genre(genre: &str) -> String {
    if genre == genre.to_uppercase() {
        genre.to_lowercase()
    } else {
        genre.to_string()
    }
}

impl LineParser for CompactPlannedLineParser {
    fn config(&self) -> &Config {
        &self.config
    }

    fn segment_for_items(&mut self, line: &str) -> ParseResult<Vec<String>> {
        let config = Arc::clone(&self.config);
        let caps = config
            .grammar()
            .compact_planned_line_start
            .captures(line)
            .ok_or(InvalidItemError::InvalidPlannedItem)?;
        let (Some(genre), Some(first_format)) = (caps.name("genre"), caps.name("first_format"))
        else {
            return Err(InvalidItemError::InvalidPlannedItem.into());
        };

        self.genre = Some(normalize_genre(genre.as_str().trim()));
        let (chunks, _) = split_items(&config, &line[first_format.start()..])?;
        Ok(chunks)
    }

    fn build_item(&self, chunk: &str) -> ParseResult<RawItem> {
        let config = self.config.as_ref();
        let caps = config
            .grammar()
            .compact_planned_item
            .captures(chunk)
            .ok_or(InvalidItemError::InvalidPlannedItem)?;

        let (author, title) = extract_author_and_title(config, &caps["author_title"]);
        let variant = Variant {
            format: extract_format(config, &caps["format_emojis"]),
            sources: caps
                .name("sources")
                .map(|sources| self.sources(sources.as_str()))
                .unwrap_or_default(),
            ..Variant::blank()
        };

        Ok(RawItem {
            author,
            title,
            variants: vec![variant],
            genres: self.genre.iter().cloned().collect(),
            ..RawItem::default()
        })
    }

    fn reset(&mut self) {
        self.genre = None;
    }
}
