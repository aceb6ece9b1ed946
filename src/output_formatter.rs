use crate::batch::BatchSummary;
use crate::errors::{Error, Result};
use crate::events::{Event, EventSink};
use serde::Serialize;
use std::io::Write;

/// Defines the possible output formats for batch events.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One human-readable line per event.
    #[default]
    Text,
    /// One JSON object per line, suitable for machine processing.
    Json,
}

/// Writes events, status messages and the summary in the selected format.
///
/// Status messages ("Starting processing…") only appear in text output so
/// that JSON output stays one object per line.
pub struct OutputFormatter<W: Write> {
    format: OutputFormat,
    writer: W,
    error: Option<Error>,
}

#[derive(Serialize)]
struct SummaryRecord<'a> {
    event: &'static str,
    #[serde(flatten)]
    summary: &'a BatchSummary,
}

impl<W: Write> OutputFormatter<W> {
    pub fn new(format: OutputFormat, writer: W) -> Self {
        Self {
            format,
            writer,
            error: None,
        }
    }

    /// Writes a status line (text output only).
    pub fn message(&mut self, line: &str) -> Result<()> {
        if self.format == OutputFormat::Text {
            writeln!(self.writer, "{line}")?;
        }
        Ok(())
    }

    pub fn summary(&mut self, summary: &BatchSummary) -> Result<()> {
        match self.format {
            OutputFormat::Text => writeln!(self.writer, "\n{summary}\n")?,
            OutputFormat::Json => {
                let record = SummaryRecord {
                    event: "summary",
                    summary,
                };
                writeln!(self.writer, "{}", serde_json::to_string(&record)?)?;
            }
        }
        Ok(())
    }

    /// Flushes the writer and reports the first error an event write hit.
    pub fn finish(&mut self) -> Result<()> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_event(&mut self, event: &Event) -> Result<()> {
        match self.format {
            OutputFormat::Text => writeln!(self.writer, "{event}")?,
            OutputFormat::Json => writeln!(self.writer, "{}", serde_json::to_string(event)?)?,
        }
        Ok(())
    }
}

impl<W: Write> EventSink for OutputFormatter<W> {
    fn emit(&mut self, event: Event) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.write_event(&event) {
            self.error = Some(err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Mode;
    use std::path::PathBuf;

    fn output(mut formatter: OutputFormatter<Vec<u8>>) -> String {
        formatter.finish().unwrap();
        String::from_utf8(formatter.into_inner()).unwrap()
    }

    #[test]
    fn test_text_format() {
        let mut formatter = OutputFormatter::new(OutputFormat::Text, Vec::new());
        formatter.message("Starting processing in 'match' mode...").unwrap();
        formatter.emit(Event::Unchanged {
            path: PathBuf::from("a.txt"),
        });
        let mut summary = BatchSummary::new(Mode::Replace);
        summary.processed = 1;
        formatter.summary(&summary).unwrap();

        let text = output(formatter);
        assert!(text.starts_with("Starting processing in 'match' mode...\nNo change needed: a.txt\n"));
        assert!(text.contains("Processed files: 1\n"));
    }

    #[test]
    fn test_json_format() {
        let mut formatter = OutputFormatter::new(OutputFormat::Json, Vec::new());
        formatter.message("ignored in json").unwrap();
        formatter.emit(Event::TextNoMatches);
        let mut summary = BatchSummary::new(Mode::Match);
        summary.matched_files = 4;
        formatter.summary(&summary).unwrap();

        let text = output(formatter);
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "text_no_matches");
        assert_eq!(lines[1]["event"], "summary");
        assert_eq!(lines[1]["mode"], "match");
        assert_eq!(lines[1]["matched_files"], 4);
    }
}
