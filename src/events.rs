use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Everything a batch reports while it runs, in processing order.
///
/// The per-file variants are the file outcomes; `Text*` variants come from
/// inline text processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// The pattern did not compile. Always the only event of its batch.
    InvalidPattern { message: String },
    Matched {
        path: PathBuf,
        encoding: String,
        matches: Vec<String>,
    },
    Processed { path: PathBuf, encoding: String },
    /// Dry-run counterpart of `Processed`.
    WouldModify { path: PathBuf, encoding: String },
    Unchanged { path: PathBuf },
    Unreadable { path: PathBuf, reason: String },
    RegexError { path: PathBuf, message: String },
    WriteDenied { path: PathBuf },
    WriteFailed { path: PathBuf, reason: String },
    TextMatches { matches: Vec<String> },
    TextNoMatches,
    TextModified { text: String },
    TextUnchanged,
    TextRegexError { message: String },
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::InvalidPattern { message } => write!(f, "Invalid Regex: {message}"),
            Event::Matched {
                path,
                encoding,
                matches,
            } => write!(
                f,
                "[MATCH FOUND] {} [Encoding: {encoding}] -> Matches: {matches:?}",
                path.display()
            ),
            Event::Processed { path, encoding } => {
                write!(f, "Processed file: {} [Encoding: {encoding}]", path.display())
            }
            Event::WouldModify { path, encoding } => {
                write!(f, "Would modify: {} [Encoding: {encoding}]", path.display())
            }
            Event::Unchanged { path } => write!(f, "No change needed: {}", path.display()),
            Event::Unreadable { path, .. } => write!(
                f,
                "Skipping (unreadable or missing permissions): {}",
                path.display()
            ),
            Event::RegexError { path, .. } => {
                write!(f, "Skipping (regex error): {}", path.display())
            }
            Event::WriteDenied { path } => {
                write!(f, "Skipping (no permission to write): {}", path.display())
            }
            Event::WriteFailed { path, reason } => write!(
                f,
                "Skipping (error writing to file {}): {reason}",
                path.display()
            ),
            Event::TextMatches { matches } => write!(f, "Matches found: {matches:?}"),
            Event::TextNoMatches => f.write_str("No matches found."),
            Event::TextModified { text } => {
                write!(f, "The text was modified.\n--- Updated Text Below ---\n{text}\n")
            }
            Event::TextUnchanged => f.write_str("No change needed."),
            Event::TextRegexError { .. } => f.write_str("Skipping due to regex error."),
        }
    }
}

/// Receives events as a batch produces them.
pub trait EventSink {
    fn emit(&mut self, event: Event);
}

impl<F: FnMut(Event)> EventSink for F {
    fn emit(&mut self, event: Event) {
        self(event)
    }
}

impl EventSink for Vec<Event> {
    fn emit(&mut self, event: Event) {
        self.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_lines() {
        let matched = Event::Matched {
            path: PathBuf::from("a/b.txt"),
            encoding: "utf-8".into(),
            matches: vec!["123".into(), "456".into()],
        };
        assert_eq!(
            matched.to_string(),
            r#"[MATCH FOUND] a/b.txt [Encoding: utf-8] -> Matches: ["123", "456"]"#
        );

        let denied = Event::WriteDenied {
            path: PathBuf::from("ro.txt"),
        };
        assert_eq!(denied.to_string(), "Skipping (no permission to write): ro.txt");

        let unchanged = Event::Unchanged {
            path: PathBuf::from("same.txt"),
        };
        assert_eq!(unchanged.to_string(), "No change needed: same.txt");
    }

    #[test]
    fn test_json_is_tagged() {
        let event = Event::Processed {
            path: PathBuf::from("x.txt"),
            encoding: "cp1252".into(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "processed");
        assert_eq!(value["encoding"], "cp1252");
        assert_eq!(serde_json::to_value(Event::TextNoMatches).unwrap()["event"], "text_no_matches");
    }

    #[test]
    fn test_closure_sink() {
        let mut lines = Vec::new();
        {
            let mut sink = |event: Event| lines.push(event.to_string());
            sink.emit(Event::TextUnchanged);
        }
        assert_eq!(lines, vec!["No change needed."]);
    }
}
