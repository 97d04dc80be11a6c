//! Parse manager: drives a whole reading log through the line parsers

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::config::{Config, Continuation};
use crate::error::{ParseError, ReadlogResult, ResourceError};
use crate::models::Item;

use super::classifier::{LineKind, classify};
use super::interface::LineParser;
use super::parsers::{CompactPlannedLineParser, RegularLineParser};

/// Per-run switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Consult the configured continuation function after every item
    pub selective: bool,
    /// Ignore compact planned lines as if they were comments
    pub skip_compact_planned: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            selective: true,
            skip_compact_planned: false,
        }
    }
}

/// Reads a log line by line and collects the items of every line
#[derive(Debug)]
pub struct ParseManager {
    config: Arc<Config>,
    regular: RegularLineParser,
    compact_planned: CompactPlannedLineParser,
}

impl ParseManager {
    #[must_use]
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);
        Self {
            regular: RegularLineParser::new(Arc::clone(&config)),
            compact_planned: CompactPlannedLineParser::new(Arc::clone(&config)),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Parse a single line.
    ///
    /// Recoverable failures go to the configured error sink and the line
    /// yields no items. With `errors.catch_all` on, malformed lines are
    /// reported the same way as a generic error.
    ///
    /// # Errors
    ///
    /// Returns an error if the line is malformed and `errors.catch_all` is off
    pub fn parse_line(&mut self, line: &str, options: &ParseOptions) -> ReadlogResult<Vec<Item>> {
        let kind = classify(line, &self.config);
        let result = match kind {
            LineKind::Blank | LineKind::Comment => return Ok(Vec::new()),
            LineKind::CompactPlanned if options.skip_compact_planned => return Ok(Vec::new()),
            LineKind::CompactPlanned => self.compact_planned.parse(line),
            LineKind::Regular => self.regular.parse(line),
        };

        match result {
            Ok(items) => {
                debug!(?kind, items = items.len(), "parsed line");
                Ok(items)
            }
            Err(err) => {
                let err = match err {
                    ParseError::Malformed(_) if self.config.settings().errors.catch_all => {
                        ParseError::generic()
                    }
                    other => other,
                };
                if err.is_recoverable() {
                    self.config.error_sink().handle(&err, line, &self.config);
                    Ok(Vec::new())
                } else {
                    Err(err.into())
                }
            }
        }
    }

    /// Parse every line of `feed`.
    ///
    /// Pass the feed by value to have it dropped when parsing ends, or by
    /// `&mut` to keep using it afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the feed fails or a line fails unrecoverably
    pub fn parse<R: BufRead>(&mut self, feed: R, options: &ParseOptions) -> ReadlogResult<Vec<Item>> {
        self.parse_with(feed, options, |item| item)
    }

    /// Parse every line of `feed`, passing each kept item through `transform`.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the feed fails or a line fails unrecoverably
    pub fn parse_with<R, T, F>(
        &mut self,
        feed: R,
        options: &ParseOptions,
        transform: F,
    ) -> ReadlogResult<Vec<T>>
    where
        R: BufRead,
        F: FnMut(Item) -> T,
    {
        self.run(feed, None, options, transform)
    }

    /// Parse a log held in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if a line fails unrecoverably
    pub fn parse_str(&mut self, text: &str, options: &ParseOptions) -> ReadlogResult<Vec<Item>> {
        self.parse(text.as_bytes(), options)
    }

    /// Parse the log at `path`, or at the configured `lines.path` if `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if no path is known, the file is missing or is a
    /// directory, or a line fails unrecoverably
    pub fn parse_path(
        &mut self,
        path: Option<&Path>,
        options: &ParseOptions,
    ) -> ReadlogResult<Vec<Item>> {
        let path: PathBuf = path
            .map(Path::to_path_buf)
            .or_else(|| self.config.settings().lines.path.clone())
            .ok_or(ResourceError::NoInput)?;

        if path.is_dir() {
            return Err(ResourceError::IsDirectory { path }.into());
        }
        let file = File::open(&path).map_err(|err| ResourceError::from_io(&path, &err))?;
        self.run(BufReader::new(file), Some(&path), options, |item| item)
    }

    fn run<R, T, F>(
        &mut self,
        mut feed: R,
        path: Option<&Path>,
        options: &ParseOptions,
        mut transform: F,
    ) -> ReadlogResult<Vec<T>>
    where
        R: BufRead,
        F: FnMut(Item) -> T,
    {
        let mut output = Vec::new();
        let mut buffer = Vec::new();
        let mut line_number = 0_usize;

        'lines: loop {
            buffer.clear();
            let read = feed.read_until(b'\n', &mut buffer).map_err(|err| {
                ResourceError::from_io(path.unwrap_or_else(|| Path::new("<feed>")), &err)
            })?;
            if read == 0 {
                break;
            }
            line_number += 1;

            let line = String::from_utf8_lossy(&buffer);
            let line = line.trim();
            debug!(line_number, "reading line");

            for item in self.parse_line(line, options)? {
                let decision = if options.selective {
                    self.config.selective_continue(&item)
                } else {
                    Continuation::Continue
                };
                match decision {
                    Continuation::Continue => output.push(transform(item)),
                    Continuation::SkipLast => {}
                    Continuation::Stop => {
                        output.push(transform(item));
                        debug!(line_number, "stopped by continuation");
                        break 'lines;
                    }
                }
            }
        }

        Ok(output)
    }
}
