//! Raw batch segmentation.
//!
//! The generation service returns one text blob containing every candidate, separated by a fixed
//! delimiter token. Stray delimiters and near-empty sections are common, so anything whose trimmed
//! length falls below the configured floor is dropped rather than turned into a record.

use crate::config::CoreConfig;

/// One delimiter-bounded candidate block, trimmed of surrounding whitespace.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fragment<'a> {
    /// Position among the *retained* fragments of the batch.
    pub index: usize,
    text: &'a str,
}

impl<'a> Fragment<'a> {
    pub fn text(&self) -> &'a str {
        self.text
    }
}

/// Splits raw batches into fragments.
#[derive(Clone, Debug)]
pub struct Segmenter {
    delimiter: String,
    min_len: usize,
}

impl Segmenter {
    pub fn new(delimiter: impl Into<String>, min_len: usize) -> Self {
        Self {
            delimiter: delimiter.into(),
            min_len,
        }
    }

    pub fn from_config(cfg: &CoreConfig) -> Self {
        Self::new(cfg.delimiter(), cfg.min_fragment_len())
    }

    /// Lazily yields the fragments of `raw` that meet the minimum length, in batch order.
    ///
    /// Length is measured in characters after trimming, so multi-byte names are not penalised.
    pub fn segments<'a>(&'a self, raw: &'a str) -> impl Iterator<Item = Fragment<'a>> + 'a {
        raw.split(self.delimiter.as_str())
            .map(str::trim)
            .filter(move |piece| piece.chars().count() >= self.min_len)
            .enumerate()
            .map(|(index, text)| Fragment { index, text })
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::from_config(&CoreConfig::default())
    }
}
