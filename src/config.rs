//! Configuration for a parsing session.
//!
//! `defaults/readlog.default.toml` is embedded so the defaults and their
//! documentation stay in one place. Callers layer their own files, strings or
//! single keys on top via [`Loader`], then turn the resulting [`Settings`]
//! into a [`Config`], which owns the compiled [`Grammar`] for the session.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use config::builder::DefaultState;
use config::{ConfigBuilder, File, FileFormat, ValueKind};
use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult, ParseError};
use crate::grammar::Grammar;
use crate::models::{Format, Item};

const DEFAULT_TOML: &str = include_str!("../defaults/readlog.default.toml");

/// Everything that can be set from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub errors: ErrorSettings,
    pub item: ItemSettings,
    pub lines: LineSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorSettings {
    /// Turn unexpected line failures into a generic, recoverable error
    pub catch_all: bool,
    /// Source lines longer than this are truncated in error reports
    pub max_length: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemSettings {
    pub formats: Vec<FormatEmoji>,
    pub sources: SourceSettings,
    pub template: TemplateSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FormatEmoji {
    pub format: Format,
    pub emoji: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceSettings {
    /// Checked in order; the first entry whose `url` is part of a URL names the source
    pub names_from_urls: Vec<UrlName>,
    pub default_name_for_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UrlName {
    pub url: String,
    pub name: String,
}

/// Item-level defaults merged under every parsed item
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateSettings {
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub author: Option<String>,
    pub visibility: u8,
    pub genres: Vec<String>,
    pub public_notes: Vec<String>,
    pub private_notes: Vec<String>,
    #[serde(default)]
    pub blurb: Option<String>,
    pub variant_index: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LineSettings {
    /// Reading log to load when no feed is given
    #[serde(default)]
    pub path: Option<PathBuf>,
    pub columns: Columns,
    pub comment_character: String,
    pub column_separator: String,
    pub separator: String,
    pub short_separator: String,
    pub long_separator: String,
    pub date_separator: String,
    pub dnf_string: String,
    pub series_prefix: String,
    pub group_emoji: String,
    pub compact_planned_source_prefix: String,
}

/// Columns of a regular line, in the order they appear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Rating,
    Name,
    Sources,
    DatesStarted,
    DatesFinished,
    Genres,
    Length,
    PublicNotes,
    Blurb,
    PrivateNotes,
    History,
}

impl Column {
    pub const ALL: [Self; 11] = [
        Self::Rating,
        Self::Name,
        Self::Sources,
        Self::DatesStarted,
        Self::DatesFinished,
        Self::Genres,
        Self::Length,
        Self::PublicNotes,
        Self::Blurb,
        Self::PrivateNotes,
        Self::History,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Columns {
    pub rating: bool,
    pub name: bool,
    pub sources: bool,
    pub dates_started: bool,
    pub dates_finished: bool,
    pub genres: bool,
    pub length: bool,
    pub public_notes: bool,
    pub blurb: bool,
    pub private_notes: bool,
    pub history: bool,
}

impl Columns {
    #[must_use]
    pub const fn is_enabled(&self, column: Column) -> bool {
        match column {
            Column::Rating => self.rating,
            Column::Name => self.name,
            Column::Sources => self.sources,
            Column::DatesStarted => self.dates_started,
            Column::DatesFinished => self.dates_finished,
            Column::Genres => self.genres,
            Column::Length => self.length,
            Column::PublicNotes => self.public_notes,
            Column::Blurb => self.blurb,
            Column::PrivateNotes => self.private_notes,
            Column::History => self.history,
        }
    }

    /// Enabled columns in line order
    #[must_use]
    pub fn enabled(&self) -> Vec<Column> {
        Column::ALL
            .into_iter()
            .filter(|column| self.is_enabled(*column))
            .collect()
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
    /// The user layers alone, used to find tables that replace rather than merge
    overrides: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    #[must_use]
    pub fn new() -> Self {
        let builder = config::Config::builder()
            .add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self {
            builder,
            overrides: config::Config::builder(),
        }
    }

    /// Layer a configuration file. Missing files trigger an error.
    #[must_use]
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source.clone());
        self.overrides = self.overrides.add_source(source);
        self
    }

    /// Layer TOML text, e.g. settings handed over by a host application.
    #[must_use]
    pub fn with_toml(mut self, toml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(toml, FileFormat::Toml));
        self.overrides = self
            .overrides
            .add_source(File::from_str(toml, FileFormat::Toml));
        self
    }

    /// Apply a single key/value override.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is not a valid configuration path
    pub fn set_override<I>(mut self, key: &str, value: I) -> ConfigResult<Self>
    where
        I: Into<ValueKind>,
    {
        let value = value.into();
        self.builder = self.builder.set_override(key, value.clone())?;
        self.overrides = self.overrides.set_override(key, value)?;
        Ok(self)
    }

    /// Merge all layers and deserialize them.
    ///
    /// Tables are merged key by key; the format table and the URL name table
    /// are ordered lists, so a user-supplied one replaces the default whole.
    ///
    /// # Errors
    ///
    /// Returns an error if a layer cannot be read or a required key is missing
    pub fn build_settings(self) -> ConfigResult<Settings> {
        let mut settings: Settings = self.builder.build()?.try_deserialize().map_err(|err| {
            let message = err.to_string();
            if message.contains("missing field") {
                ConfigError::missing(message)
            } else {
                ConfigError::load(message)
            }
        })?;

        let overrides = self.overrides.build()?;
        if let Ok(formats) = overrides.get::<Vec<FormatEmoji>>("item.formats") {
            settings.item.formats = formats;
        }
        if let Ok(names) = overrides.get::<Vec<UrlName>>("item.sources.names_from_urls") {
            settings.item.sources.names_from_urls = names;
        }
        Ok(settings)
    }

    /// Merge all layers and compile the session [`Config`].
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be loaded or the grammar cannot be built
    pub fn build(self) -> ConfigResult<Config> {
        Config::new(self.build_settings()?)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Receives every line that was skipped because of a recoverable error,
/// together with the configuration of the run that skipped it
pub trait ErrorSink: Send + Sync {
    fn handle(&self, error: &ParseError, source_line: &str, config: &Config);
}

/// Default sink: reports skipped lines through `tracing`, shortened to
/// `errors.max_length` characters
#[derive(Debug, Clone, Copy, Default)]
pub struct LogErrorSink;

impl ErrorSink for LogErrorSink {
    fn handle(&self, error: &ParseError, source_line: &str, config: &Config) {
        let line = truncate(source_line, config.settings().errors.max_length);
        tracing::warn!(%error, line = %line, "skipped line");
    }
}

fn truncate(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        text.to_string()
    } else {
        let mut shortened: String = text.chars().take(max_length.saturating_sub(1)).collect();
        shortened.push('…');
        shortened
    }
}

/// What the driver does after an item has been produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    Continue,
    /// Stop reading; items produced so far are kept
    Stop,
    /// Drop the item just produced and keep going
    SkipLast,
}

type ContinueFn = dyn Fn(&Item) -> Continuation + Send + Sync;

/// Immutable configuration for one parsing session.
#[derive(Clone)]
pub struct Config {
    settings: Settings,
    grammar: Grammar,
    error_sink: Arc<dyn ErrorSink>,
    selective_continue: Arc<ContinueFn>,
}

impl Config {
    /// Validate `settings` and compile the grammar.
    ///
    /// # Errors
    ///
    /// Returns an error if a required key is empty or a derived pattern does not compile
    pub fn new(mut settings: Settings) -> ConfigResult<Self> {
        settings.lines.columns.name = true;
        validate(&settings)?;
        let grammar = Grammar::build(&settings)?;
        Ok(Self {
            settings,
            grammar,
            error_sink: Arc::new(LogErrorSink),
            selective_continue: Arc::new(|_| Continuation::Continue),
        })
    }

    /// Configuration built from the embedded defaults only.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded defaults fail to load
    pub fn load_defaults() -> ConfigResult<Self> {
        Loader::new().build()
    }

    #[must_use]
    pub fn with_error_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.error_sink = sink;
        self
    }

    #[must_use]
    pub fn with_selective_continue<F>(mut self, decide: F) -> Self
    where
        F: Fn(&Item) -> Continuation + Send + Sync + 'static,
    {
        self.selective_continue = Arc::new(decide);
        self
    }

    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub const fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    #[must_use]
    pub fn error_sink(&self) -> &dyn ErrorSink {
        self.error_sink.as_ref()
    }

    #[must_use]
    pub fn selective_continue(&self, item: &Item) -> Continuation {
        (self.selective_continue)(item)
    }

    /// Map an emoji back to its format
    #[must_use]
    pub fn format_for_emoji(&self, emoji: &str) -> Option<Format> {
        self.settings
            .item
            .formats
            .iter()
            .find(|entry| entry.emoji == emoji)
            .map(|entry| entry.format)
    }

    /// Name a source after its URL
    #[must_use]
    pub fn source_name_for_url(&self, url: &str) -> String {
        let sources = &self.settings.item.sources;
        sources
            .names_from_urls
            .iter()
            .find(|entry| url.contains(&entry.url))
            .map_or_else(
                || sources.default_name_for_url.clone(),
                |entry| entry.name.clone(),
            )
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

fn validate(settings: &Settings) -> ConfigResult<()> {
    if settings.item.formats.is_empty() {
        return Err(ConfigError::missing("item.formats"));
    }
    if let Some(entry) = settings.item.formats.iter().find(|e| e.emoji.is_empty()) {
        return Err(ConfigError::invalid(format!(
            "empty emoji for format {}",
            entry.format
        )));
    }

    let lines = &settings.lines;
    let required = [
        ("lines.comment_character", &lines.comment_character),
        ("lines.column_separator", &lines.column_separator),
        ("lines.separator", &lines.separator),
        ("lines.short_separator", &lines.short_separator),
        ("lines.long_separator", &lines.long_separator),
        ("lines.date_separator", &lines.date_separator),
        ("lines.dnf_string", &lines.dnf_string),
        ("lines.series_prefix", &lines.series_prefix),
        ("lines.group_emoji", &lines.group_emoji),
        ("lines.compact_planned_source_prefix", &lines.compact_planned_source_prefix),
    ];
    for (key, value) in required {
        if value.is_empty() {
            return Err(ConfigError::missing(key));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skipped_lines_are_shortened_for_logging() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("📕Frank Herbert - Dune", 6), "📕Fran…");
        LogErrorSink.handle(
            &ParseError::generic(),
            "|📕Dune, 🔊Dune",
            &Config::load_defaults().unwrap(),
        );
    }

    #[test]
    fn loads_default_config() {
        let config = Config::load_defaults().expect("defaults to load");
        let settings = config.settings();
        assert_eq!(settings.item.formats.len(), 9);
        assert_eq!(settings.lines.column_separator, "|");
        assert_eq!(settings.item.template.visibility, 3);
        assert!(!settings.errors.catch_all);
        assert_eq!(config.format_for_emoji("📕"), Some(Format::Print));
        assert_eq!(config.format_for_emoji("🔊"), Some(Format::Audiobook));
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .set_override("lines.dnf_string", "ABANDONED")
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert_eq!(config.settings().lines.dnf_string, "ABANDONED");
        assert_eq!(config.settings().lines.separator, ",");
    }

    #[test]
    fn format_table_is_replaced_not_merged() {
        let config = Loader::new()
            .with_toml(
                r#"
                [item]
                formats = [{ format = "ebook", emoji = "📱" }]
                "#,
            )
            .build()
            .expect("config to build");
        let formats = &config.settings().item.formats;
        assert_eq!(formats.len(), 1);
        assert_eq!(config.format_for_emoji("📱"), Some(Format::Ebook));
        assert_eq!(config.format_for_emoji("📕"), None);
    }

    #[test]
    fn name_column_cannot_be_disabled() {
        let config = Loader::new()
            .set_override("lines.columns.name", false)
            .unwrap()
            .set_override("lines.columns.rating", false)
            .unwrap()
            .build()
            .unwrap();
        let columns = config.settings().lines.columns;
        assert!(columns.name);
        assert_eq!(columns.enabled().first(), Some(&Column::Name));
    }

    #[test]
    fn empty_required_key_is_a_config_error() {
        let err = Loader::new()
            .set_override("lines.dnf_string", "")
            .unwrap()
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::missing("lines.dnf_string"));
    }

    #[test]
    fn source_names_follow_table_order() {
        let config = Config::load_defaults().unwrap();
        assert_eq!(
            config.source_name_for_url("https://www.youtube.com/watch?v=x"),
            "YouTube"
        );
        assert_eq!(
            config.source_name_for_url("https://archive.org/details/x"),
            "Internet Archive"
        );
        assert_eq!(config.source_name_for_url("https://example.com"), "site");
    }

    #[test]
    fn truncates_long_lines() {
        assert_eq!(truncate("abcdef", 10), "abcdef");
        assert_eq!(truncate("abcdef", 4), "abc…");
    }
}
