use core::fmt;

use serde::{Deserialize, Serialize};

/// The medium of an item variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, uniffi::Enum)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Print,
    Ebook,
    Audiobook,
    Pdf,
    Audio,
    Video,
    Course,
    Piece,
    Website,
}

impl Format {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Print => "print",
            Self::Ebook => "ebook",
            Self::Audiobook => "audiobook",
            Self::Pdf => "pdf",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Course => "course",
            Self::Piece => "piece",
            Self::Website => "website",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Either a running time (`H:MM`) or a page count
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, uniffi::Enum)]
pub enum Length {
    Time { duration: String },
    Pages { count: u32 },
}

impl Length {
    #[must_use]
    pub fn time(duration: impl Into<String>) -> Self {
        Self::Time {
            duration: duration.into(),
        }
    }

    #[must_use]
    pub const fn pages(count: u32) -> Self {
        Self::Pages { count }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, uniffi::Record)]
pub struct Series {
    pub name: String,
    pub volume: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, uniffi::Record)]
pub struct Source {
    pub name: Option<String>,
    pub url: Option<String>,
}

impl Source {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, uniffi::Record)]
pub struct Variant {
    pub format: Option<Format>,
    pub sources: Vec<Source>,
    pub isbn: Option<String>,
    pub length: Option<Length>,
    pub extra_info: Vec<String>,
}

/// How far into an item reading got
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, uniffi::Enum)]
pub enum ProgressAmount {
    Percent { value: u8 },
    Time { duration: String },
    Pages { count: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, uniffi::Record)]
pub struct Progress {
    /// The item was abandoned ("did not finish")
    pub dnf: bool,
    pub amount: Option<ProgressAmount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, uniffi::Record)]
pub struct DateRange {
    pub started: Option<String>,
    pub finished: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, uniffi::Record)]
pub struct Span {
    pub dates: Option<DateRange>,
    pub amount: Option<Length>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, uniffi::Record)]
pub struct Experience {
    pub date_added: Option<String>,
    pub spans: Vec<Span>,
    pub progress: Option<Progress>,
    /// Present when the item was read with others; holds the group name (possibly empty)
    pub group: Option<String>,
    pub variant_index: u32,
}

/// One parsed work from the reading log
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, uniffi::Record)]
pub struct Item {
    pub rating: Option<f64>,
    pub author: Option<String>,
    pub title: String,
    pub series: Vec<Series>,
    pub variants: Vec<Variant>,
    pub experiences: Vec<Experience>,
    pub visibility: u8,
    pub genres: Vec<String>,
    pub public_notes: Vec<String>,
    pub blurb: Option<String>,
    pub private_notes: Vec<String>,
}

impl Item {
    /// The format of the first variant, if any
    #[must_use]
    pub fn format(&self) -> Option<Format> {
        self.variants.first().and_then(|variant| variant.format)
    }

    #[must_use]
    pub fn is_dnf(&self) -> bool {
        self.experiences
            .iter()
            .any(|experience| experience.progress.as_ref().is_some_and(|p| p.dnf))
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.author {
            Some(author) => write!(f, "{author} - {}", self.title),
            None => f.write_str(&self.title),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_names_match_serde() {
        let json = serde_cbor::to_vec(&Format::Audiobook).unwrap();
        let back: Format = serde_cbor::from_slice(&json).unwrap();
        assert_eq!(back, Format::Audiobook);
        assert_eq!(Format::Audiobook.to_string(), "audiobook");
    }

    #[test]
    fn item_display_with_and_without_author() {
        let mut item = Item {
            rating: None,
            author: Some("Ursula K. Le Guin".into()),
            title: "The Dispossessed".into(),
            series: vec![],
            variants: vec![],
            experiences: vec![],
            visibility: 3,
            genres: vec![],
            public_notes: vec![],
            blurb: None,
            private_notes: vec![],
        };
        assert_eq!(item.to_string(), "Ursula K. Le Guin - The Dispossessed");
        item.author = None;
        assert_eq!(item.to_string(), "The Dispossessed");
        assert!(item.format().is_none());
        assert!(!item.is_dnf());
    }
}
