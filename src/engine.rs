//! Mode semantics: turning a text and a compiled [`Pattern`] into either the
//! list of matches or the rewritten text.

use crate::errors::{Error, Result};
use crate::patterns::{Pattern, Segment};
use regex::{NoExpand, Regex};
use serde::Serialize;
use std::fmt;

/// What a batch does with the spans a pattern matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Report matches, never modify anything.
    Match,
    /// Keep matched spans and delete (or replace) everything else.
    Invert,
    /// Substitute matched spans.
    Replace,
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Match => "match",
            Mode::Invert => "invert",
            Mode::Replace => "replace",
        }
    }

    /// Whether this mode can rewrite its input.
    pub fn modifies(&self) -> bool {
        match self {
            Mode::Match => false,
            Mode::Invert | Mode::Replace => true,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Replacement text for `Replace` and `Invert`.
///
/// In `Replace` mode a non-literal replacement is a `regex` template (`$1`,
/// `${name}`, `$$`). `Invert` always inserts the text as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    text: String,
    literal: bool,
}

impl Replacement {
    pub fn template(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            literal: false,
        }
    }

    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            literal: true,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_literal(&self) -> bool {
        self.literal
    }
}

/// The result of applying a pattern in some mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// Group 1 of every match, in order. Produced only by `Mode::Match`.
    Matches(Vec<String>),
    /// The rewritten text. Produced by `Mode::Invert` and `Mode::Replace`.
    Text(String),
}

/// Applies `pattern` to `text` according to `mode`.
///
/// A pure function of its inputs. Returns `Error::EngineFault` when the
/// replacement template refers to a group the pattern does not have.
pub fn apply(
    text: &str,
    pattern: &Pattern,
    mode: Mode,
    replacement: Option<&Replacement>,
) -> Result<Applied> {
    match mode {
        Mode::Match => Ok(Applied::Matches(pattern.captures(text))),
        Mode::Replace => replace(text, pattern, replacement).map(Applied::Text),
        Mode::Invert => Ok(Applied::Text(invert(text, pattern, replacement))),
    }
}

fn replace(text: &str, pattern: &Pattern, replacement: Option<&Replacement>) -> Result<String> {
    let regex = pattern.regex();
    let Some(replacement) = replacement else {
        return Ok(regex.replace_all(text, "").into_owned());
    };

    if replacement.is_literal() {
        return Ok(regex.replace_all(text, NoExpand(replacement.as_str())).into_owned());
    }

    validate_template(regex, replacement.as_str())?;
    Ok(regex.replace_all(text, replacement.as_str()).into_owned())
}

fn invert(text: &str, pattern: &Pattern, replacement: Option<&Replacement>) -> String {
    let filler = replacement.map(Replacement::as_str).unwrap_or("");
    pattern
        .split_retaining(text)
        .into_iter()
        .map(|segment| match segment {
            Segment::Matched(kept) => kept,
            Segment::Unmatched(_) => filler,
        })
        .collect()
}

/// Checks every `$ref` in a replacement template against the pattern's groups.
///
/// The `regex` crate expands unknown groups to nothing; a typo like `$3` in a
/// two-group pattern would silently delete text, so it is rejected here.
fn validate_template(regex: &Regex, template: &str) -> Result<()> {
    let bytes = template.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'$' {
            i += 1;
            continue;
        }
        let rest = &template[i + 1..];
        if rest.starts_with('$') {
            i += 2;
            continue;
        }

        let (name, consumed) = if let Some(braced) = rest.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => (&braced[..end], end + 2),
                // Unterminated braces are expanded literally by the regex crate.
                None => ("", 1),
            }
        } else {
            let len = rest
                .bytes()
                .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
                .count();
            (&rest[..len], len)
        };

        if !name.is_empty() && !group_exists(regex, name) {
            return Err(Error::EngineFault(format!(
                "invalid group reference '{name}' in replacement"
            )));
        }
        i += 1 + consumed;
    }
    Ok(())
}

fn group_exists(regex: &Regex, name: &str) -> bool {
    match name.parse::<usize>() {
        Ok(index) => index < regex.captures_len(),
        Err(_) => regex.capture_names().flatten().any(|group| group == name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(applied: Applied) -> String {
        match applied {
            Applied::Text(text) => text,
            Applied::Matches(matches) => panic!("expected text, got matches {matches:?}"),
        }
    }

    fn run(text: &str, pattern: &str, mode: Mode, replacement: Option<&str>) -> Applied {
        let pattern = Pattern::new(pattern).unwrap();
        let replacement = replacement.map(Replacement::template);
        apply(text, &pattern, mode, replacement.as_ref()).unwrap()
    }

    #[test]
    fn test_replace_all_occurrences() {
        let applied = run("foo bar foo", "foo", Mode::Replace, Some("baz"));
        assert_eq!(text_of(applied), "baz bar baz");
    }

    #[test]
    fn test_match_returns_each_occurrence() {
        let applied = run("abc123def456", "[0-9]+", Mode::Match, None);
        assert_eq!(applied, Applied::Matches(vec!["123".into(), "456".into()]));
    }

    #[test]
    fn test_match_without_occurrences_is_empty() {
        let applied = run("no digits here", r"\d", Mode::Match, None);
        assert_eq!(applied, Applied::Matches(vec![]));
    }

    #[test]
    fn test_match_with_user_groups_reports_whole_match() {
        let applied = run("k=v x=y", r"(\w)=(\w)", Mode::Match, None);
        assert_eq!(applied, Applied::Matches(vec!["k=v".into(), "x=y".into()]));
    }

    #[test]
    fn test_invert_deletes_unmatched_text() {
        let applied = run("keep1 drop keep2", r"keep\d", Mode::Invert, None);
        assert_eq!(text_of(applied), "keep1keep2");
    }

    #[test]
    fn test_invert_replaces_every_unmatched_segment() {
        let applied = run("a.b.c", r"\.", Mode::Invert, Some("-"));
        assert_eq!(text_of(applied), "-.-.-");
    }

    #[test]
    fn test_invert_fills_empty_edges() {
        let applied = run("keep1 drop keep2", r"keep\d", Mode::Invert, Some("|"));
        assert_eq!(text_of(applied), "|keep1|keep2|");
    }

    #[test]
    fn test_invert_without_matches_clears_text() {
        let applied = run("nothing to keep", r"\d", Mode::Invert, None);
        assert_eq!(text_of(applied), "");
    }

    #[test]
    fn test_invert_replacement_is_literal() {
        let applied = run("a1b", r"\d", Mode::Invert, Some("$1"));
        assert_eq!(text_of(applied), "$11$1");
    }

    #[test]
    fn test_replace_without_replacement_deletes() {
        let applied = run("a1b22c", r"\d+", Mode::Replace, None);
        assert_eq!(text_of(applied), "abc");
    }

    #[test]
    fn test_replace_is_idempotent_when_replacement_does_not_rematch() {
        let pattern = Pattern::new(r"colou?r").unwrap();
        let replacement = Replacement::template("hue");
        let once = text_of(apply("color and colour", &pattern, Mode::Replace, Some(&replacement)).unwrap());
        let twice = text_of(apply(&once, &pattern, Mode::Replace, Some(&replacement)).unwrap());
        assert_eq!(once, "hue and hue");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_replace_template_groups() {
        let applied = run("john smith", r"(?P<first>\w+) (\w+)", Mode::Replace, Some("$3, ${first} [$1]"));
        assert_eq!(text_of(applied), "smith, john [john smith]");
    }

    #[test]
    fn test_replace_literal_dollar() {
        let applied = run("cost 5", r"\d", Mode::Replace, Some("$$5"));
        assert_eq!(text_of(applied), "cost $5");
    }

    #[test]
    fn test_replace_literal_skips_expansion() {
        let pattern = Pattern::new(r"\d").unwrap();
        let replacement = Replacement::literal("$1");
        let applied = apply("a1", &pattern, Mode::Replace, Some(&replacement)).unwrap();
        assert_eq!(text_of(applied), "a$1");
    }

    #[test]
    fn test_unknown_group_reference_is_engine_fault() {
        let pattern = Pattern::new(r"(\d)").unwrap();
        for template in ["$3", "${missing}", "x$nope"] {
            let replacement = Replacement::template(template);
            let result = apply("a1", &pattern, Mode::Replace, Some(&replacement));
            assert!(matches!(result, Err(Error::EngineFault(_))), "{template}");
        }
    }

    #[test]
    fn test_mode_flags() {
        assert!(!Mode::Match.modifies());
        assert!(Mode::Invert.modifies());
        assert_eq!(Mode::Replace.to_string(), "replace");
    }
}
