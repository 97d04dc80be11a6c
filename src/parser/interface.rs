//! Shared interface for the two line shapes

use std::collections::HashSet;

use crate::config::Config;
use crate::error::{InvalidItemError, ParseResult};
use crate::models::{Item, Progress};
use crate::template::{RawItem, normalize};

use super::attributes::extract_status;

/// One line shape that turns a line into items.
///
/// Implementors may keep line-scoped state between [`segment_for_items`] and
/// [`build_item`]; [`reset`] must return the parser to its pristine state.
/// An instance handles one line at a time.
///
/// [`segment_for_items`]: LineParser::segment_for_items
/// [`build_item`]: LineParser::build_item
/// [`reset`]: LineParser::reset
pub trait LineParser {
    fn config(&self) -> &Config;

    /// Read line-scoped data and return one chunk of text per item
    ///
    /// # Errors
    ///
    /// Returns a parsing error if the line-scoped data cannot be read
    fn segment_for_items(&mut self, line: &str) -> ParseResult<Vec<String>>;

    /// Extract everything one chunk says about its item
    ///
    /// # Errors
    ///
    /// Returns a parsing error if the chunk does not describe a valid item
    fn build_item(&self, chunk: &str) -> ParseResult<RawItem>;

    /// Forget all line-scoped state
    fn reset(&mut self);

    /// Parse one line into its items, in left-to-right order.
    ///
    /// The parser is reset afterwards whether or not parsing succeeded.
    ///
    /// # Errors
    ///
    /// Returns a parsing error if any item on the line is invalid, or if two
    /// items on the line share a title
    fn parse(&mut self, line: &str) -> ParseResult<Vec<Item>> {
        let result = parse_items(self, line);
        self.reset();
        result
    }
}

fn parse_items<P: LineParser + ?Sized>(parser: &mut P, line: &str) -> ParseResult<Vec<Item>> {
    let chunks = parser.segment_for_items(line)?;
    let template = &parser.config().settings().item.template;

    let mut titles = HashSet::new();
    let mut items = Vec::with_capacity(chunks.len());
    for chunk in &chunks {
        let item = normalize(parser.build_item(chunk)?, template)?;
        if !titles.insert(item.title.clone()) {
            return Err(InvalidItemError::DuplicateTitle.into());
        }
        items.push(item);
    }
    Ok(items)
}

/// Split text holding one or more items into per-item chunks.
///
/// A DNF marker and a progress marker are read off the first chunk. Trailing
/// commas and semicolons are trimmed. If any chunk starts with a format
/// emoji, chunks that don't are dropped.
///
/// # Errors
///
/// Returns an error if the progress marker cannot be read
pub fn split_items(config: &Config, text: &str) -> ParseResult<(Vec<String>, Option<Progress>)> {
    let grammar = config.grammar();
    let mut chunks: Vec<String> = grammar
        .split_by_formats(text)
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut progress = None;
    if let Some(first) = chunks.first_mut() {
        let (stripped, status) = extract_status(config, first)?;
        *first = stripped;
        progress = status;
    }

    let chunks: Vec<String> = chunks
        .iter()
        .map(|chunk| {
            grammar
                .trailing_punctuation
                .replace(chunk.trim(), "")
                .into_owned()
        })
        .collect();

    let (with_format, without_format): (Vec<String>, Vec<String>) = chunks
        .into_iter()
        .partition(|chunk| grammar.formats_at_start.is_match(chunk));

    let chunks = if with_format.is_empty() {
        without_format
    } else {
        with_format
    };
    Ok((chunks, progress))
}
