//! Attribute extractors shared by both line shapes.
//!
//! Each extractor looks at one text fragment and returns what it found, or
//! `None`/an empty list when the fragment holds nothing of its kind.

use regex::{Captures, Match};

use crate::config::Config;
use crate::error::{InvalidItemError, ParseError, ParseResult};
use crate::grammar::{Grammar, remove_group};
use crate::models::{Format, Length, Progress, ProgressAmount, Series, Source, Variant};

/// Where a length is being read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthContext {
    /// Inside a variant, next to sources and ISBNs
    InVariant,
    /// The dedicated length column
    TopLevel,
}

/// Format of the emoji the fragment starts with
#[must_use]
pub fn extract_format(config: &Config, fragment: &str) -> Option<Format> {
    let emoji = config
        .grammar()
        .formats_at_start
        .find(fragment.trim_start())?;
    config.format_for_emoji(emoji.as_str())
}

/// The single ISBN/ASIN in the fragment.
///
/// # Errors
///
/// Returns an error if the fragment holds more than one
pub fn extract_isbn(config: &Config, fragment: &str) -> ParseResult<Option<String>> {
    match config.grammar().isbns(fragment).as_slice() {
        [] => Ok(None),
        [isbn] => Ok(Some((*isbn).to_string())),
        _ => Err(InvalidItemError::MultipleIsbns.into()),
    }
}

/// A running time, or failing that a page count.
///
/// # Errors
///
/// Returns an error if a page count does not fit in a `u32`
pub fn extract_length(
    config: &Config,
    fragment: &str,
    context: LengthContext,
) -> ParseResult<Option<Length>> {
    let grammar = config.grammar();
    let fragment = fragment.trim();

    if let Some(caps) = grammar.time_length.captures(fragment) {
        return Ok(Some(Length::time(&caps[1])));
    }

    let pages = match context {
        LengthContext::InVariant => &grammar.pages_length_in_variant,
        LengthContext::TopLevel => &grammar.pages_length,
    };
    pages
        .captures(fragment)
        .map(|caps| parse_count(&caps[1]).map(Length::pages))
        .transpose()
}

/// Free-text pieces after the first long separator, minus series references.
#[must_use]
pub fn extract_extra_info(config: &Config, fragment: &str) -> Vec<String> {
    let lines = &config.settings().lines;
    fragment
        .split(lines.long_separator.as_str())
        .skip(1)
        .filter(|piece| !is_series(config, piece))
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

/// Series references after the first long separator, e.g. `in Dune` or `Dune, #2`.
#[must_use]
pub fn extract_series(config: &Config, fragment: &str) -> Vec<Series> {
    let grammar = config.grammar();
    let series_prefix = format!("{} ", config.settings().lines.series_prefix);
    fragment
        .split(config.settings().lines.long_separator.as_str())
        .skip(1)
        .filter(|piece| is_series(config, piece))
        .map(|piece| {
            let piece = piece.trim();
            let piece = piece.strip_prefix(series_prefix.as_str()).unwrap_or(piece);
            match grammar.series_volume.captures(piece) {
                Some(caps) => Series {
                    name: piece[..caps.get(0).map_or(piece.len(), |m| m.start())]
                        .trim()
                        .to_string(),
                    volume: caps[1].parse().ok(),
                },
                None => Series {
                    name: piece.trim().to_string(),
                    volume: None,
                },
            }
        })
        .collect()
}

fn is_series(config: &Config, piece: &str) -> bool {
    let piece = piece.trim();
    piece.starts_with(&format!("{} ", config.settings().lines.series_prefix))
        || config.grammar().series_volume.is_match(piece)
}

/// Author and title from an item descriptor such as `📕Frank Herbert - Dune`.
#[must_use]
pub fn extract_author_and_title(config: &Config, descriptor: &str) -> (Option<String>, Option<String>) {
    let text = config.grammar().formats_prefix.replace(descriptor, "");
    let text = text.trim();
    let non_empty = |s: &str| Some(s.trim().to_string()).filter(|s| !s.is_empty());

    match text.split_once(config.settings().lines.short_separator.as_str()) {
        Some((author, title)) => (non_empty(author), non_empty(title)),
        None => (None, non_empty(text)),
    }
}

/// Sources named or linked in a variant fragment.
///
/// URL sources and ISBNs are found anywhere in the fragment and cut out of
/// it; each separator-delimited piece left over that is not a bare length
/// names a source. Lengths are fenced off with separators first, so a number
/// next to a name never becomes part of it. URL sources come first.
///
/// # Errors
///
/// Returns an error if a source has two URLs, or two names
pub fn extract_sources(config: &Config, fragment: &str) -> ParseResult<Vec<Source>> {
    let grammar = config.grammar();
    let separator = config.settings().lines.separator.as_str();
    let fenced = fence_lengths(grammar, separator, fragment);

    let mut sources = Vec::new();
    let mut names = String::with_capacity(fenced.len());
    let mut isbns = grammar.isbn_matches(&fenced).into_iter().peekable();
    let mut pos = 0;
    loop {
        while isbns.peek().is_some_and(|isbn| isbn.start() < pos) {
            isbns.next();
        }
        let url = grammar.sources.captures_at(&fenced, pos);
        let url_start = url.as_ref().and_then(|caps| caps.get(0)).map(|m| m.start());

        // An ISBN wins over a URL source starting at the same place.
        let take_isbn = match (isbns.peek().map(Match::start), url_start) {
            (None, None) => break,
            (Some(isbn), Some(url)) => isbn <= url,
            (Some(_), None) => true,
            (None, Some(_)) => false,
        };

        let (start, end) = if take_isbn {
            let Some(isbn) = isbns.next() else { break };
            (isbn.start(), isbn.end())
        } else {
            let Some(caps) = url else { break };
            let Some(whole) = caps.get(0) else { break };
            sources.push(url_source(config, &caps)?);
            (whole.start(), whole.end())
        };
        names.push_str(&fenced[pos..start]);
        names.push_str(separator);
        pos = end;
    }
    names.push_str(&fenced[pos..]);

    for name in names.split(separator) {
        let name = name.trim();
        if name.is_empty()
            || grammar.time_length.is_match(name)
            || grammar.pages_length_in_variant.is_match(name)
        {
            continue;
        }
        let name = grammar.formats_prefix.replace(name, "");
        let name = name.trim();
        if !name.is_empty() {
            sources.push(Source::named(name));
        }
    }
    Ok(sources)
}

fn url_source(config: &Config, caps: &Captures) -> ParseResult<Source> {
    if let (Some(name), Some(url)) = (caps.name("pre_name"), caps.name("pre_url")) {
        source_from_parts(config, name.as_str(), Some(url.as_str()))
    } else if let (Some(url), Some(name)) = (caps.name("post_url"), caps.name("post_name")) {
        source_from_parts(config, url.as_str(), Some(name.as_str()))
    } else {
        match caps.name("url") {
            Some(url) => source_from_parts(config, url.as_str(), None),
            None => Err(InvalidItemError::InvalidSource.into()),
        }
    }
}

fn fence_lengths(grammar: &Grammar, separator: &str, fragment: &str) -> String {
    let fence = format!("{separator} ${{1}}{separator} ");
    let fenced = grammar.time_length.replace(fragment, fence.as_str());
    grammar
        .pages_length_in_variant
        .replace(&fenced, fence.as_str())
        .into_owned()
}

fn source_from_parts(config: &Config, first: &str, second: Option<&str>) -> ParseResult<Source> {
    let is_url = |part: Option<&str>| part.is_some_and(|p| config.grammar().url.is_match(p));
    let first = first.trim();
    let second = second.map(str::trim);

    let (name, url) = if is_url(Some(first)) {
        if is_url(second) {
            return Err(InvalidItemError::MultipleUrls.into());
        }
        (second, Some(first))
    } else if second.is_some() && !is_url(second) {
        return Err(InvalidItemError::InvalidSource.into());
    } else {
        (Some(first), second)
    };

    let url = url.map(|url| url.strip_suffix('/').unwrap_or(url).to_string());
    let name = name
        .map(|name| config.grammar().formats_prefix.replace(name, "").trim().to_string())
        .filter(|name| !name.is_empty())
        .or_else(|| url.as_deref().map(|url| config.source_name_for_url(url)));
    Ok(Source { name, url })
}

/// Variants of an item on a regular line.
///
/// `sources_column` holds one variant per format emoji (or a single variant
/// when it has none). The name chunk and the length column only fill in what
/// a variant does not state itself.
///
/// # Errors
///
/// Returns an error if a variant has more than one ISBN or an ambiguous source
pub fn extract_variants(
    config: &Config,
    name: &str,
    sources_column: &str,
    length_column: &str,
) -> ParseResult<Vec<Variant>> {
    let grammar = config.grammar();
    let long_separator = config.settings().lines.long_separator.as_str();

    let format_in_name = extract_format(config, name);
    let length_in_length = extract_length(config, length_column, LengthContext::TopLevel)?;
    let extra_info_in_name = extract_extra_info(config, name);

    let segments = if grammar.formats.is_match(sources_column) {
        grammar.split_by_formats(sources_column)
    } else {
        vec![sources_column]
    };

    segments
        .into_iter()
        .map(|segment| -> ParseResult<Variant> {
            let variant = segment.split(long_separator).next().unwrap_or_default();
            let extra_info = extract_extra_info(config, segment);
            Ok(Variant {
                format: extract_format(config, variant).or(format_in_name),
                sources: extract_sources(config, variant)?,
                isbn: extract_isbn(config, variant)?,
                length: extract_length(config, variant, LengthContext::InVariant)?
                    .or_else(|| length_in_length.clone()),
                extra_info: if extra_info.is_empty() {
                    extra_info_in_name.clone()
                } else {
                    extra_info
                },
            })
        })
        .collect()
}

/// Strip a leading DNF marker and progress marker from `text`.
///
/// # Errors
///
/// Returns an error if a page count does not fit in a `u32`
pub fn extract_status(config: &Config, text: &str) -> ParseResult<(String, Option<Progress>)> {
    let grammar = config.grammar();

    let dnf = grammar
        .dnf
        .captures(text)
        .is_some_and(|caps| caps.name("dnf").is_some());
    let text = remove_group(&grammar.dnf, "dnf", text);

    let amount = match grammar.progress.captures(&text) {
        Some(caps) => {
            if let Some(percent) = caps.name("percent") {
                Some(ProgressAmount::Percent {
                    value: percent
                        .as_str()
                        .parse()
                        .map_err(|_| ParseError::malformed("progress percentage"))?,
                })
            } else if let Some(time) = caps.name("time") {
                Some(ProgressAmount::Time {
                    duration: time.as_str().to_string(),
                })
            } else {
                caps.name("pages")
                    .map(|pages| parse_count(pages.as_str()))
                    .transpose()?
                    .map(|count| ProgressAmount::Pages { count })
            }
        }
        None => None,
    };
    let text = remove_group(&grammar.progress, "progress", &text);

    let progress = (dnf || amount.is_some()).then_some(Progress { dnf, amount });
    Ok((text, progress))
}

fn parse_count(digits: &str) -> ParseResult<u32> {
    digits
        .parse()
        .map_err(|_| ParseError::malformed(format!("page count out of range: {digits}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::load_defaults().unwrap()
    }

    #[test]
    fn format_from_leading_emoji() {
        let config = config();
        assert_eq!(extract_format(&config, "📕Dune"), Some(Format::Print));
        assert_eq!(extract_format(&config, " 🎞️Film"), Some(Format::Video));
        assert_eq!(extract_format(&config, "Dune 📕"), None);
    }

    #[test]
    fn isbn_single_and_duplicate() {
        let config = config();
        assert_eq!(
            extract_isbn(&config, "0307472385, https://example.com").unwrap(),
            Some("0307472385".to_string())
        );
        assert_eq!(extract_isbn(&config, "Hoopla").unwrap(), None);
        assert_eq!(
            extract_isbn(&config, "0307472385, 9780307472385").unwrap_err(),
            InvalidItemError::MultipleIsbns.into()
        );
    }

    #[test]
    fn duration_wins_over_pages() {
        let config = config();
        assert_eq!(
            extract_length(&config, "1:30", LengthContext::InVariant).unwrap(),
            Some(Length::time("1:30"))
        );
        assert_eq!(
            extract_length(&config, "320p", LengthContext::InVariant).unwrap(),
            Some(Length::pages(320))
        );
        assert_eq!(
            extract_length(&config, "320 pages, 1:30", LengthContext::InVariant).unwrap(),
            Some(Length::time("1:30"))
        );
        assert_eq!(
            extract_length(&config, "p412", LengthContext::TopLevel).unwrap(),
            Some(Length::pages(412))
        );
    }

    #[test]
    fn isbn_digits_are_not_pages_in_a_variant() {
        let config = config();
        assert_eq!(
            extract_length(&config, "0307472385", LengthContext::InVariant).unwrap(),
            None
        );
        assert_eq!(extract_length(&config, "", LengthContext::TopLevel).unwrap(), None);
    }

    #[test]
    fn source_direction_is_inferred() {
        let config = config();
        let expected = vec![Source {
            name: Some("Some Site".into()),
            url: Some("https://example.com".into()),
        }];
        assert_eq!(
            extract_sources(&config, "Some Site - https://example.com/").unwrap(),
            expected
        );
        assert_eq!(
            extract_sources(&config, "https://example.com/ - Some Site").unwrap(),
            expected
        );
    }

    #[test]
    fn two_urls_for_one_source_is_invalid() {
        let config = config();
        assert_eq!(
            extract_sources(&config, "https://a.example.com - https://b.example.com").unwrap_err(),
            InvalidItemError::MultipleUrls.into()
        );
    }

    #[test]
    fn sources_skip_isbns_and_lengths() {
        let config = config();
        let sources =
            extract_sources(&config, "🔊Hoopla, 0307472385, 10:30, https://youtu.be/xyz").unwrap();
        assert_eq!(
            sources,
            vec![
                Source {
                    name: Some("YouTube".into()),
                    url: Some("https://youtu.be/xyz".into()),
                },
                Source::named("Hoopla"),
            ]
        );
    }

    #[test]
    fn isbn_sharing_a_token_with_a_name_is_cut_out() {
        let config = config();
        assert_eq!(
            extract_sources(&config, "Little Library 0441172717").unwrap(),
            vec![Source::named("Little Library")]
        );

        let variants = extract_variants(&config, "📕Dune", "Little Library 0441172717", "").unwrap();
        assert_eq!(variants[0].isbn.as_deref(), Some("0441172717"));
        assert_eq!(variants[0].sources, vec![Source::named("Little Library")]);
    }

    #[test]
    fn url_sharing_a_token_with_a_name_stays_separate() {
        let config = config();
        assert_eq!(
            extract_sources(&config, "Hoopla https://www.youtube.com/watch?v=x").unwrap(),
            vec![
                Source {
                    name: Some("YouTube".into()),
                    url: Some("https://www.youtube.com/watch?v=x".into()),
                },
                Source::named("Hoopla"),
            ]
        );
    }

    #[test]
    fn name_isbn_and_length_in_one_token() {
        let config = config();
        let variants =
            extract_variants(&config, "📕Dune", "Little Library 0441172717 320p", "").unwrap();
        let variant = &variants[0];
        assert_eq!(variant.sources, vec![Source::named("Little Library")]);
        assert_eq!(variant.isbn.as_deref(), Some("0441172717"));
        assert_eq!(variant.length, Some(Length::pages(320)));
    }

    #[test]
    fn named_url_sources_drop_the_format_emoji() {
        let config = config();
        assert_eq!(
            extract_sources(&config, "📕Library - https://library.example.org, Hoopla").unwrap(),
            vec![
                Source {
                    name: Some("Library".into()),
                    url: Some("https://library.example.org".into()),
                },
                Source::named("Hoopla"),
            ]
        );
    }

    #[test]
    fn unknown_url_gets_default_name() {
        let config = config();
        let sources = extract_sources(&config, "https://example.org/book/").unwrap();
        assert_eq!(sources[0].name.as_deref(), Some("site"));
        assert_eq!(sources[0].url.as_deref(), Some("https://example.org/book"));
    }

    #[test]
    fn length_next_to_a_name_is_fenced_off() {
        let config = config();
        assert_eq!(
            extract_sources(&config, "Little Library 320p").unwrap(),
            vec![Source::named("Little Library")]
        );
    }

    #[test]
    fn extra_info_skips_series() {
        let config = config();
        let fragment = "📕Dune -- in Dune Chronicles -- Dune, #1 -- 40th anniversary edition";
        assert_eq!(
            extract_extra_info(&config, fragment),
            vec!["40th anniversary edition".to_string()]
        );
        assert_eq!(
            extract_series(&config, fragment),
            vec![
                Series {
                    name: "Dune Chronicles".into(),
                    volume: None,
                },
                Series {
                    name: "Dune".into(),
                    volume: Some(1),
                },
            ]
        );
    }

    #[test]
    fn author_and_title() {
        let config = config();
        assert_eq!(
            extract_author_and_title(&config, "📕Frank Herbert - Dune"),
            (Some("Frank Herbert".into()), Some("Dune".into()))
        );
        assert_eq!(
            extract_author_and_title(&config, "📕⚡Salt, Fat, Acid, Heat"),
            (None, Some("Salt, Fat, Acid, Heat".into()))
        );
    }

    #[test]
    fn variants_fall_back_to_name_and_length_column() {
        let config = config();
        let variants =
            extract_variants(&config, "🔊Dune -- unabridged", "Hoopla", "21:02").unwrap();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].format, Some(Format::Audiobook));
        assert_eq!(variants[0].sources, vec![Source::named("Hoopla")]);
        assert_eq!(variants[0].length, Some(Length::time("21:02")));
        assert_eq!(variants[0].extra_info, vec!["unabridged".to_string()]);
    }

    #[test]
    fn one_variant_per_format_in_sources_column() {
        let config = config();
        let variants = extract_variants(
            &config,
            "Dune",
            "📕Library, 0441172717 -- paperback, 🔊Hoopla 21:02",
            "",
        )
        .unwrap();
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].format, Some(Format::Print));
        assert_eq!(variants[0].isbn.as_deref(), Some("0441172717"));
        assert_eq!(variants[0].extra_info, vec!["paperback".to_string()]);
        assert_eq!(variants[1].format, Some(Format::Audiobook));
        assert_eq!(variants[1].sources, vec![Source::named("Hoopla")]);
        assert_eq!(variants[1].length, Some(Length::time("21:02")));
    }

    #[test]
    fn status_markers_are_stripped() {
        let config = config();
        let (text, progress) = extract_status(&config, "DNF 50% 📕Dune").unwrap();
        assert_eq!(text, "📕Dune");
        assert_eq!(
            progress,
            Some(Progress {
                dnf: true,
                amount: Some(ProgressAmount::Percent { value: 50 }),
            })
        );

        let (text, progress) = extract_status(&config, "📕Dune").unwrap();
        assert_eq!(text, "📕Dune");
        assert!(progress.is_none());
    }
}
