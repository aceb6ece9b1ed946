use crate::errors::{Error, Result};
use regex::Regex;

/// A user pattern compiled inside one outer capturing group.
///
/// The outer group is always group 1, so it spans the whole match. Replacement
/// templates see the user's own groups starting at `$2`.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

/// A piece of text produced by [`Pattern::split_retaining`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'t> {
    /// Text between matches. Always the first and last segment, possibly empty.
    Unmatched(&'t str),
    Matched(&'t str),
}

impl<'t> Segment<'t> {
    pub fn as_str(&self) -> &'t str {
        match self {
            Segment::Unmatched(text) | Segment::Matched(text) => text,
        }
    }
}

impl Pattern {
    /// Compiles `source` wrapped in a capturing group.
    ///
    /// The bare pattern is compiled first so that something like `a)|(b` is
    /// rejected instead of silently producing two top-level groups.
    pub fn new(source: &str) -> Result<Self> {
        if source.is_empty() {
            return Err(Error::EmptyPattern);
        }
        Regex::new(source)?;
        let regex = Regex::new(&format!("({source})"))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// The pattern as the user wrote it, without the outer group.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Returns the text of group 1 for every non-overlapping match.
    pub fn captures(&self, text: &str) -> Vec<String> {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Splits `text` into alternating unmatched and matched segments.
    ///
    /// The result always starts and ends with an `Unmatched` segment, so
    /// matched segments never touch each other and concatenating every
    /// segment reproduces `text`. Empty matches produce empty `Matched`
    /// segments like any other match.
    pub fn split_retaining<'t>(&self, text: &'t str) -> Vec<Segment<'t>> {
        let mut segments = Vec::new();
        let mut last = 0;
        for m in self.regex.find_iter(text) {
            segments.push(Segment::Unmatched(&text[last..m.start()]));
            segments.push(Segment::Matched(m.as_str()));
            last = m.end();
        }
        segments.push(Segment::Unmatched(&text[last..]));
        segments
    }
}
