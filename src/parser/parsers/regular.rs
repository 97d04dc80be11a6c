//! Regular, column-separated lines
//!
//! ```text
//! 4|📕Frank Herbert - Dune -- in Dune Chronicles|Library, 0441172717|2021/3/4 > 2021/4/1|2021/5/1|science fiction|412
//! ```

use std::sync::Arc;

use crate::config::{Column, Config};
use crate::error::{ParseError, ParseResult};
use crate::models::{DateRange, Progress, Span};
use crate::template::{RawExperience, RawItem};

use super::super::attributes::{extract_author_and_title, extract_series, extract_variants};
use super::super::interface::{LineParser, split_items};

/// Columns shared by every item on the line
#[derive(Debug, Clone, Default)]
struct SharedColumns {
    rating: Option<f64>,
    sources: String,
    length: String,
    experiences: Vec<RawExperience>,
    genres: Vec<String>,
    public_notes: Vec<String>,
    blurb: Option<String>,
    private_notes: Vec<String>,
}

/// Parser for regular lines
#[derive(Debug)]
pub struct RegularLineParser {
    config: Arc<Config>,
    shared: SharedColumns,
}

impl RegularLineParser {
    #[must_use]
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            shared: SharedColumns::default(),
        }
    }

    fn experiences(&self, started: &str, finished: &str) -> Vec<RawExperience> {
        let lines = &self.config.settings().lines;
        let mut experiences: Vec<RawExperience> = list(started, &lines.separator)
            .iter()
            .map(|entry| self.experience(entry))
            .collect();

        let finished = list(finished, &lines.separator);
        for (index, date) in finished.into_iter().enumerate() {
            if experiences.len() <= index {
                experiences.push(RawExperience::default());
            }
            let experience = &mut experiences[index];
            if let Some(dates) = experience
                .spans
                .first_mut()
                .and_then(|span| span.dates.as_mut())
            {
                dates.finished = Some(date);
            } else {
                experience.spans.push(span(None, Some(date)));
            }
        }
        experiences
    }

    /// One dates-started entry, e.g. `2021/3/4 > 🤝🏼Book Club 2021/4/1 v2`
    fn experience(&self, entry: &str) -> RawExperience {
        let grammar = self.config.grammar();

        let (date_added, rest) = match grammar.date_added.captures(entry) {
            Some(caps) => {
                let end = caps.get(0).map_or(0, |m| m.end());
                (Some(caps[1].to_string()), &entry[end..])
            }
            None => (None, entry),
        };

        let started = grammar
            .date_started
            .captures(entry)
            .map(|caps| caps[1].to_string());
        let mut rest = match &started {
            Some(date) => rest.replacen(date.as_str(), "", 1),
            None => rest.to_string(),
        };

        let variant_index = grammar.variant_index.captures(&rest).and_then(|caps| {
            caps[1]
                .parse::<u32>()
                .ok()
                .map(|number| number.saturating_sub(1))
        });
        rest = grammar.variant_index.replace(&rest, "").into_owned();

        let group = grammar
            .group_experience
            .captures(&rest)
            .map(|caps| caps["group"].to_string());

        RawExperience {
            date_added,
            spans: started
                .map(|date| vec![span(Some(date), None)])
                .unwrap_or_default(),
            progress: None,
            group,
            variant_index,
        }
    }

    fn attach_progress(&mut self, progress: Option<Progress>) {
        let Some(progress) = progress else {
            return;
        };
        if self.shared.experiences.is_empty() {
            self.shared.experiences.push(RawExperience::default());
        }
        if let Some(last) = self.shared.experiences.last_mut() {
            last.progress = Some(progress);
        }
    }
}

fn rating(text: &str) -> ParseResult<Option<f64>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse()
        .map(Some)
        .map_err(|_| ParseError::malformed(format!("rating is not a number: {text}")))
}

fn list(text: &str, separator: &str) -> Vec<String> {
    text.split(separator)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn span(started: Option<String>, finished: Option<String>) -> Span {
    Span {
        dates: Some(DateRange { started, finished }),
        amount: None,
        description: None,
    }
}

impl LineParser for RegularLineParser {
    fn config(&self) -> &Config {
        &self.config
    }

    fn segment_for_items(&mut self, line: &str) -> ParseResult<Vec<String>> {
        let config = Arc::clone(&self.config);
        let lines = &config.settings().lines;

        let mut values = line.split(lines.column_separator.as_str());
        let mut name = String::new();
        let mut started = String::new();
        let mut finished = String::new();
        let mut shared = SharedColumns::default();

        for column in lines.columns.enabled() {
            let value = values.next().unwrap_or_default();
            match column {
                Column::Rating => shared.rating = rating(value)?,
                Column::Name => name = value.to_string(),
                Column::Sources => shared.sources = value.trim().to_string(),
                Column::DatesStarted => started = value.to_string(),
                Column::DatesFinished => finished = value.to_string(),
                Column::Genres => shared.genres = list(value, &lines.separator),
                Column::Length => shared.length = value.trim().to_string(),
                Column::PublicNotes => {
                    shared.public_notes = list(value, &lines.long_separator);
                }
                Column::Blurb => {
                    shared.blurb = Some(value.trim().to_string()).filter(|b| !b.is_empty());
                }
                Column::PrivateNotes => {
                    shared.private_notes = list(value, &lines.long_separator);
                }
                Column::History => {}
            }
        }

        shared.experiences = self.experiences(&started, &finished);
        self.shared = shared;

        let (chunks, progress) = split_items(&config, &name)?;
        self.attach_progress(progress);
        Ok(chunks)
    }

    fn build_item(&self, chunk: &str) -> ParseResult<RawItem> {
        let config = self.config.as_ref();
        let long_separator = config.settings().lines.long_separator.as_str();
        let descriptor = chunk.split(long_separator).next().unwrap_or_default();
        let (author, title) = extract_author_and_title(config, descriptor);

        Ok(RawItem {
            rating: self.shared.rating,
            author,
            title,
            series: extract_series(config, chunk),
            variants: extract_variants(config, chunk, &self.shared.sources, &self.shared.length)?,
            experiences: self.shared.experiences.clone(),
            visibility: None,
            genres: self.shared.genres.clone(),
            public_notes: self.shared.public_notes.clone(),
            blurb: self.shared.blurb.clone(),
            private_notes: self.shared.private_notes.clone(),
        })
    }

    fn reset(&mut self) {
        self.shared = SharedColumns::default();
    }
}
