use serde::{Deserialize, Serialize};

/// One article summary pulled from the listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Visible heading text
    pub title: String,

    /// Absolute URL of the full article
    pub link: String,

    /// First body paragraph, if the block has one
    pub content: Option<String>,

    /// Source of the representative image, if any
    pub image_url: Option<String>,
}

impl ArticleRecord {
    pub fn new(
        title: String,
        link: String,
        content: Option<String>,
        image_url: Option<String>,
    ) -> Self {
        Self {
            title,
            link,
            content,
            image_url,
        }
    }
}

/// English rendition of an article's title and content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatedPair {
    pub title_en: String,
    pub content_en: String,
}

/// Words that recur across translated titles, with their counts.
///
/// Only words whose count exceeds the threshold used to build the table are
/// present; iteration follows the order each word first appeared in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordFrequencyTable {
    counts: Vec<(String, usize)>,
}

impl WordFrequencyTable {
    pub(crate) fn from_counts(counts: Vec<(String, usize)>) -> Self {
        Self { counts }
    }

    pub fn get(&self, word: &str) -> Option<usize> {
        self.counts
            .iter()
            .find(|(w, _)| w == word)
            .map(|(_, count)| *count)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(word, count)| (word.as_str(), *count))
    }
}
