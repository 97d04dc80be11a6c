//! Regular expressions derived from the configuration.
//!
//! Every pattern is a pure function of [`Settings`], built once per
//! [`Config`](crate::config::Config). The `regex` crate has no lookaround, so
//! patterns that need it capture the surrounding context and callers use the
//! named group instead of the whole match (see [`remove_group`] and
//! [`Grammar::isbns`]).

use regex::{Match, Regex, escape};

use crate::config::Settings;
use crate::error::ConfigResult;

const TIME_LENGTH: &str = r"([0-9]+:[0-9][0-9])";
const PAGES_LENGTH: &str = r"p?([0-9]+)p?";
// Nine digits at most, and delimited, so ISBN digit runs never count as pages.
const PAGES_LENGTH_IN_VARIANT: &str = r"(?:\A|\s+|p)([0-9]{1,9})(?:p|\s+|\z)";
const ISBN: &str = r"(?:[0-9]{3}[-\s]?)?[A-Z0-9]{10}";

#[derive(Debug, Clone)]
pub struct Grammar {
    /// Comment character, possibly after leading whitespace
    pub comment_start: Regex,
    /// Comment character, genre, colon; `first_format` marks where items begin
    pub compact_planned_line_start: Regex,
    pub compact_planned_item: Regex,
    pub compact_planned_source: Regex,
    /// Alternation of every format emoji, longest first
    pub formats: Regex,
    pub formats_at_start: Regex,
    /// A format emoji run at the start, with surrounding whitespace
    pub formats_prefix: Regex,
    /// A separator followed by a format emoji; chunks split before the emoji
    pub formats_split: Regex,
    pub series_volume: Regex,
    pub isbn: Regex,
    /// A URL source anywhere in a fragment: name + URL, URL + name, or URL
    pub sources: Regex,
    pub url: Regex,
    pub date_added: Regex,
    pub date_started: Regex,
    pub date_finished: Regex,
    /// DNF marker; remove the `dnf` group only
    pub dnf: Regex,
    /// Progress marker; remove the `progress` group only
    pub progress: Regex,
    pub group_experience: Regex,
    pub variant_index: Regex,
    pub time_length: Regex,
    pub pages_length: Regex,
    pub pages_length_in_variant: Regex,
    pub trailing_punctuation: Regex,
    isbn_boundaries: Vec<String>,
}

impl Grammar {
    /// Derive all patterns from `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured string produces a pattern that does not compile
    pub fn build(settings: &Settings) -> ConfigResult<Self> {
        let lines = &settings.lines;
        let comment = escape(&lines.comment_character);
        let sep = escape(&lines.separator);
        let short_sep = escape(&lines.short_separator);
        let planned_prefix = escape(&lines.compact_planned_source_prefix);
        let dnf = escape(&lines.dnf_string);
        let date_sep = escape(&lines.date_separator);

        let mut emojis: Vec<&str> = settings
            .item
            .formats
            .iter()
            .map(|entry| entry.emoji.as_str())
            .collect();
        emojis.sort_by_key(|emoji| std::cmp::Reverse(emoji.len()));
        let formats = emojis
            .iter()
            .map(|emoji| escape(emoji))
            .collect::<Vec<_>>()
            .join("|");

        let genre_excluded: String = lines
            .column_separator
            .chars()
            .chain(lines.separator.chars())
            .map(|c| escape(&c.to_string()))
            .collect();

        let date = format!(r"([0-9]{{4}}{date_sep}[0-9]?[0-9]{date_sep}[0-9]?[0-9])");
        let url = format!(r"https?://[^\s{sep}]+");

        Ok(Self {
            comment_start: Regex::new(&format!(r"\A\s*{comment}"))?,
            compact_planned_line_start: Regex::new(&format!(
                r"\A\s*{comment}(?P<genre>[^a-z:{genre_excluded}]+):\s*(?P<first_format>{formats})"
            ))?,
            compact_planned_item: Regex::new(&format!(
                r"\A(?P<format_emojis>(?:{formats})+)(?P<author_title>[^{planned_prefix}]+)(?P<sources>{planned_prefix}.+)?\z"
            ))?,
            compact_planned_source: Regex::new(&format!(
                r"\A(?P<format_emojis>(?:{formats})*)(?P<source_name>.+)\z"
            ))?,
            formats: Regex::new(&formats)?,
            formats_at_start: Regex::new(&format!(r"\A(?:{formats})"))?,
            formats_prefix: Regex::new(&format!(r"\A\s*(?:{formats})+\s*"))?,
            formats_split: Regex::new(&format!(r"\s*{sep}\s*(?P<format>{formats})"))?,
            series_volume: Regex::new(r",\s*#([0-9]+)\z")?,
            isbn: Regex::new(ISBN)?,
            sources: Regex::new(&format!(
                r"(?P<pre_name>[^{sep}]+){short_sep}(?P<pre_url>{url})|(?P<post_url>{url}){short_sep}(?P<post_name>[^{sep}]+)|(?P<url>{url})"
            ))?,
            url: Regex::new(&format!(r"http[^\s{sep}]+"))?,
            date_added: Regex::new(&format!(r"{date}.*>"))?,
            date_started: Regex::new(&format!(r"{date}[^>]*\z"))?,
            date_finished: Regex::new(&date)?,
            dnf: Regex::new(&format!(r"(?:\A|>)(?P<dnf>\s*{dnf})"))?,
            progress: Regex::new(&format!(
                r"(?:\A|>|{dnf})(?P<progress>\s*(?:(?P<percent>[0-9]?[0-9])%|(?P<time>[0-9]+:[0-9][0-9])|p?(?P<pages>[0-9]+)p?)\s+)"
            ))?,
            group_experience: Regex::new(&format!(
                r"{}\s*(?P<group>.*?)\s*\z",
                escape(&lines.group_emoji)
            ))?,
            variant_index: Regex::new(r"\s+v([0-9]+)")?,
            time_length: Regex::new(TIME_LENGTH)?,
            pages_length: Regex::new(PAGES_LENGTH)?,
            pages_length_in_variant: Regex::new(PAGES_LENGTH_IN_VARIANT)?,
            trailing_punctuation: Regex::new(r"\s*[,;]\z")?,
            isbn_boundaries: vec![lines.separator.clone(), lines.column_separator.clone()],
        })
    }

    /// All ISBN/ASIN tokens in `text` that stand alone, i.e. are bounded by the
    /// ends of the text, whitespace or a separator on both sides.
    #[must_use]
    pub fn isbns<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.isbn_matches(text)
            .into_iter()
            .map(|m| m.as_str())
            .collect()
    }

    /// Like [`Grammar::isbns`], keeping where each match sits in `text`
    #[must_use]
    pub fn isbn_matches<'t>(&self, text: &'t str) -> Vec<Match<'t>> {
        let mut found = Vec::new();
        let mut pos = 0;
        while pos <= text.len() {
            let Some(m) = self.isbn.find_at(text, pos) else {
                break;
            };
            if self.is_boundary_before(text, m.start()) && self.is_boundary_after(text, m.end())
            {
                found.push(m);
                pos = m.end();
            } else {
                pos = next_char_boundary(text, m.start());
            }
        }
        found
    }

    fn is_boundary_before(&self, text: &str, index: usize) -> bool {
        let before = &text[..index];
        before.is_empty()
            || before.ends_with(char::is_whitespace)
            || self.isbn_boundaries.iter().any(|b| before.ends_with(b.as_str()))
    }

    fn is_boundary_after(&self, text: &str, index: usize) -> bool {
        let after = &text[index..];
        after.is_empty()
            || after.starts_with(char::is_whitespace)
            || self.isbn_boundaries.iter().any(|b| after.starts_with(b.as_str()))
    }

    /// Split `text` before every format emoji that follows a separator.
    #[must_use]
    pub fn split_by_formats<'t>(&self, text: &'t str) -> Vec<&'t str> {
        let mut chunks = Vec::new();
        let mut start = 0;
        for caps in self.formats_split.captures_iter(text) {
            let (Some(whole), Some(format)) = (caps.get(0), caps.name("format")) else {
                continue;
            };
            chunks.push(&text[start..whole.start()]);
            start = format.start();
        }
        chunks.push(&text[start..]);
        chunks
    }
}

/// Remove the first match of `group` in `text`, leaving the rest of the
/// match in place.
#[must_use]
pub fn remove_group(re: &Regex, group: &str, text: &str) -> String {
    match re.captures(text).and_then(|caps| caps.name(group)) {
        Some(m) => format!("{}{}", &text[..m.start()], &text[m.end()..]),
        None => text.to_string(),
    }
}

fn next_char_boundary(text: &str, index: usize) -> usize {
    text[index..]
        .chars()
        .next()
        .map_or(text.len() + 1, |c| index + c.len_utf8())
}
