//! Merging extracted data over the item template.
//!
//! Extractors fill a [`RawItem`] where every field is explicitly present or
//! absent. [`normalize`] takes that record and the configured template and
//! returns a finished [`Item`]: absent scalars fall back to the template, and
//! nested entries that carry no data are dropped, so "nothing parsed" is always
//! an empty list.

use crate::config::TemplateSettings;
use crate::error::{InvalidItemError, ParseResult};
use crate::models::{DateRange, Experience, Item, Progress, Series, Source, Span, Variant};

/// Everything extracted for one item, before defaults are applied
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawItem {
    pub rating: Option<f64>,
    pub author: Option<String>,
    pub title: Option<String>,
    pub series: Vec<Series>,
    pub variants: Vec<Variant>,
    pub experiences: Vec<RawExperience>,
    pub visibility: Option<u8>,
    pub genres: Vec<String>,
    pub public_notes: Vec<String>,
    pub blurb: Option<String>,
    pub private_notes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawExperience {
    pub date_added: Option<String>,
    pub spans: Vec<Span>,
    pub progress: Option<Progress>,
    pub group: Option<String>,
    pub variant_index: Option<u32>,
}

impl RawExperience {
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.date_added.is_none()
            && self.spans.iter().all(Span::is_blank)
            && self.progress.is_none()
            && self.group.is_none()
            && self.variant_index.is_none()
    }
}

impl Series {
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.name.trim().is_empty() && self.volume.is_none()
    }
}

impl Source {
    #[must_use]
    pub const fn is_blank(&self) -> bool {
        self.name.is_none() && self.url.is_none()
    }
}

impl Variant {
    #[must_use]
    pub fn blank() -> Self {
        Self {
            format: None,
            sources: Vec::new(),
            isbn: None,
            length: None,
            extra_info: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.format.is_none()
            && self.sources.iter().all(Source::is_blank)
            && self.isbn.is_none()
            && self.length.is_none()
            && self.extra_info.is_empty()
    }
}

impl DateRange {
    #[must_use]
    pub const fn is_blank(&self) -> bool {
        self.started.is_none() && self.finished.is_none()
    }
}

impl Span {
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.dates.as_ref().is_none_or(DateRange::is_blank)
            && self.amount.is_none()
            && self.description.is_none()
    }
}

/// Merge `raw` over `template` and drop every nested entry that holds no data.
///
/// # Errors
///
/// Returns an error if the item has no title
pub fn normalize(raw: RawItem, template: &TemplateSettings) -> ParseResult<Item> {
    let title = raw
        .title
        .filter(|title| !title.trim().is_empty())
        .ok_or(InvalidItemError::MissingTitle)?;

    let variants = raw
        .variants
        .into_iter()
        .filter(|variant| !variant.is_blank())
        .map(|mut variant| {
            variant.sources.retain(|source| !source.is_blank());
            variant
        })
        .collect();

    let experiences = raw
        .experiences
        .into_iter()
        .filter(|experience| !experience.is_blank())
        .map(|experience| Experience {
            date_added: experience.date_added,
            spans: experience
                .spans
                .into_iter()
                .filter(|span| !span.is_blank())
                .collect(),
            progress: experience.progress,
            group: experience.group,
            variant_index: experience
                .variant_index
                .unwrap_or(template.variant_index),
        })
        .collect();

    Ok(Item {
        rating: raw.rating.or(template.rating),
        author: raw.author.or_else(|| template.author.clone()),
        title,
        series: raw
            .series
            .into_iter()
            .filter(|series| !series.is_blank())
            .collect(),
        variants,
        experiences,
        visibility: raw.visibility.unwrap_or(template.visibility),
        genres: or_template(raw.genres, &template.genres),
        public_notes: or_template(raw.public_notes, &template.public_notes),
        blurb: raw.blurb.or_else(|| template.blurb.clone()),
        private_notes: or_template(raw.private_notes, &template.private_notes),
    })
}

fn or_template(values: Vec<String>, template: &[String]) -> Vec<String> {
    if values.is_empty() {
        template.to_vec()
    } else {
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::{Format, Length};

    fn template() -> TemplateSettings {
        Config::load_defaults().unwrap().settings().item.template.clone()
    }

    #[test]
    fn blank_nested_lists_collapse_to_empty() {
        let raw = RawItem {
            title: Some("Dune".into()),
            series: vec![Series {
                name: String::new(),
                volume: None,
            }],
            variants: vec![Variant::blank()],
            experiences: vec![RawExperience::default()],
            ..RawItem::default()
        };
        let item = normalize(raw, &template()).unwrap();
        assert!(item.series.is_empty());
        assert!(item.variants.is_empty());
        assert!(item.experiences.is_empty());
        assert_eq!(item.visibility, 3);
        assert!(item.rating.is_none());
    }

    #[test]
    fn populated_entries_survive_and_blank_sources_go() {
        let raw = RawItem {
            title: Some("Dune".into()),
            variants: vec![Variant {
                format: Some(Format::Print),
                sources: vec![
                    Source {
                        name: None,
                        url: None,
                    },
                    Source::named("Library"),
                ],
                isbn: None,
                length: Some(Length::pages(412)),
                extra_info: vec![],
            }],
            experiences: vec![RawExperience {
                date_added: Some("2021/1/2".into()),
                ..RawExperience::default()
            }],
            ..RawItem::default()
        };
        let item = normalize(raw, &template()).unwrap();
        assert_eq!(item.variants.len(), 1);
        assert_eq!(item.variants[0].sources, vec![Source::named("Library")]);
        assert_eq!(item.experiences[0].variant_index, 0);
        assert!(item.experiences[0].spans.is_empty());
    }

    #[test]
    fn template_values_fill_absent_fields() {
        let mut template = template();
        template.genres = vec!["fiction".into()];
        template.visibility = 1;
        let item = normalize(
            RawItem {
                title: Some("Dune".into()),
                ..RawItem::default()
            },
            &template,
        )
        .unwrap();
        assert_eq!(item.genres, vec!["fiction".to_string()]);
        assert_eq!(item.visibility, 1);
    }

    #[test]
    fn missing_title_is_invalid() {
        let err = normalize(RawItem::default(), &template()).unwrap_err();
        assert_eq!(err, InvalidItemError::MissingTitle.into());
    }

    #[test]
    fn normalizing_twice_is_deterministic() {
        let raw = RawItem {
            title: Some("Dune".into()),
            author: Some("Frank Herbert".into()),
            ..RawItem::default()
        };
        let first = normalize(raw.clone(), &template()).unwrap();
        let second = normalize(raw, &template()).unwrap();
        assert_eq!(first, second);
    }
}
