use crate::encoding::{DetectedEncoding, EncodingProber};
use crate::engine::{self, Applied, Mode, Replacement};
use crate::errors::{Error, Result, WriteFailure};
use crate::events::{Event, EventSink};
use crate::patterns::Pattern;
use serde::Serialize;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Everything that stays fixed for one batch.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// The user pattern, before it is wrapped in its outer group.
    pub pattern: String,
    pub mode: Mode,
    pub replacement: Option<Replacement>,
    pub prober: EncodingProber,
    /// Compute changes without writing them.
    pub dry_run: bool,
}

impl BatchOptions {
    pub fn new(pattern: impl Into<String>, mode: Mode) -> Self {
        Self {
            pattern: pattern.into(),
            mode,
            replacement: None,
            prober: EncodingProber::default(),
            dry_run: false,
        }
    }

    pub fn with_replacement(mut self, replacement: Option<Replacement>) -> Self {
        self.replacement = replacement;
        self
    }

    pub fn with_prober(mut self, prober: EncodingProber) -> Self {
        self.prober = prober;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn compile<S: EventSink + ?Sized>(&self, sink: &mut S) -> Result<Pattern> {
        Pattern::new(&self.pattern).inspect_err(|err| {
            sink.emit(Event::InvalidPattern {
                message: err.to_string(),
            })
        })
    }
}

/// Counters accumulated over a batch.
///
/// `processed` counts every file that was read and transformed, including
/// files whose write then failed; those are also counted in `write_failures`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub mode: Mode,
    pub processed: usize,
    pub skipped: usize,
    pub matched_files: usize,
    /// Files rewritten (or, in a dry run, that would have been).
    pub modified: usize,
    pub write_failures: usize,
}

impl BatchSummary {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            processed: 0,
            skipped: 0,
            matched_files: 0,
            modified: 0,
            write_failures: 0,
        }
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Summary ---")?;
        writeln!(f, "Processed files: {}", self.processed)?;
        writeln!(f, "Skipped files:   {}", self.skipped)?;
        if self.mode == Mode::Match {
            writeln!(f, "Files with matches: {}", self.matched_files)?;
        }
        if self.write_failures > 0 {
            writeln!(f, "Write failures:  {}", self.write_failures)?;
        }
        write!(f, "-----------------")
    }
}

/// Runs one batch over `paths`, in order.
///
/// The pattern is compiled once up front. If that fails the sink gets a
/// single `InvalidPattern` event and no file is touched. Any per-file
/// failure is reported to the sink and the batch moves on.
pub fn run<S: EventSink + ?Sized>(
    paths: &[PathBuf],
    options: &BatchOptions,
    sink: &mut S,
) -> Result<BatchSummary> {
    let pattern = options.compile(sink)?;
    let mut summary = BatchSummary::new(options.mode);
    info!(mode = %options.mode, files = paths.len(), dry_run = options.dry_run, "starting batch");

    for path in paths {
        // The file may have disappeared since enumeration.
        if !path.is_file() {
            debug!(path = %path.display(), "no longer a regular file, ignoring");
            continue;
        }
        process_file(path, &pattern, options, sink, &mut summary);
    }

    info!(
        processed = summary.processed,
        skipped = summary.skipped,
        modified = summary.modified,
        "batch finished"
    );
    Ok(summary)
}

fn process_file<S: EventSink + ?Sized>(
    path: &Path,
    pattern: &Pattern,
    options: &BatchOptions,
    sink: &mut S,
    summary: &mut BatchSummary,
) {
    let decoded = match options.prober.read(path) {
        Ok(decoded) => decoded,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "unreadable");
            let reason = match err {
                Error::Unreadable { reason, .. } => reason.to_string(),
                other => other.to_string(),
            };
            summary.skipped += 1;
            sink.emit(Event::Unreadable {
                path: path.to_path_buf(),
                reason,
            });
            return;
        }
    };
    let encoding = decoded.encoding.to_string();

    let applied = match engine::apply(
        &decoded.text,
        pattern,
        options.mode,
        options.replacement.as_ref(),
    ) {
        Ok(applied) => applied,
        Err(err) => {
            summary.skipped += 1;
            sink.emit(Event::RegexError {
                path: path.to_path_buf(),
                message: err.to_string(),
            });
            return;
        }
    };

    match applied {
        Applied::Matches(matches) => {
            if !matches.is_empty() {
                summary.matched_files += 1;
                sink.emit(Event::Matched {
                    path: path.to_path_buf(),
                    encoding,
                    matches,
                });
            }
        }
        Applied::Text(new_text) if new_text == decoded.text => {
            sink.emit(Event::Unchanged {
                path: path.to_path_buf(),
            });
        }
        Applied::Text(_) if options.dry_run => {
            summary.modified += 1;
            sink.emit(Event::WouldModify {
                path: path.to_path_buf(),
                encoding,
            });
        }
        Applied::Text(new_text) => match write_back(path, &new_text, &decoded.encoding) {
            Ok(()) => {
                summary.modified += 1;
                sink.emit(Event::Processed {
                    path: path.to_path_buf(),
                    encoding,
                });
            }
            Err(WriteFailure::PermissionDenied) => {
                summary.write_failures += 1;
                sink.emit(Event::WriteDenied {
                    path: path.to_path_buf(),
                });
            }
            Err(failure) => {
                summary.write_failures += 1;
                sink.emit(Event::WriteFailed {
                    path: path.to_path_buf(),
                    reason: failure.to_string(),
                });
            }
        },
    }

    summary.processed += 1;
}

/// Encodes `text` with the file's original encoding and replaces the file.
///
/// Symlinks are followed, so the file they point at is the one rewritten.
/// The new content goes to a temporary file next to that target, which is
/// then persisted over it with the original permissions. Files the current
/// user cannot open for writing are refused rather than replaced.
pub fn write_back(
    path: &Path,
    text: &str,
    encoding: &DetectedEncoding,
) -> std::result::Result<(), WriteFailure> {
    let bytes = encoding.encode(text)?;

    let target = fs::canonicalize(path)?;
    let permissions = fs::metadata(&target)?.permissions();
    if permissions.readonly() {
        return Err(WriteFailure::PermissionDenied);
    }
    // Opening for write does not truncate; it only checks real access.
    OpenOptions::new().write(true).open(&target)?;

    let parent = target.parent().unwrap_or(Path::new("."));
    let mut temp_file = NamedTempFile::new_in(parent)?;
    temp_file.write_all(&bytes)?;
    fs::set_permissions(temp_file.path(), permissions)?;
    temp_file
        .persist(&target)
        .map_err(|err| WriteFailure::from(err.error))?;
    Ok(())
}

/// Applies the batch settings to an in-memory string.
///
/// Returns the transformed text, or the input unchanged in `Match` mode and
/// after an engine fault.
pub fn process_text<S: EventSink + ?Sized>(
    text: &str,
    options: &BatchOptions,
    sink: &mut S,
) -> Result<String> {
    let pattern = options.compile(sink)?;

    match engine::apply(text, &pattern, options.mode, options.replacement.as_ref()) {
        Err(err) => {
            sink.emit(Event::TextRegexError {
                message: err.to_string(),
            });
            Ok(text.to_string())
        }
        Ok(Applied::Matches(matches)) => {
            if matches.is_empty() {
                sink.emit(Event::TextNoMatches);
            } else {
                sink.emit(Event::TextMatches { matches });
            }
            Ok(text.to_string())
        }
        Ok(Applied::Text(new_text)) => {
            if new_text == text {
                sink.emit(Event::TextUnchanged);
            } else {
                sink.emit(Event::TextModified {
                    text: new_text.clone(),
                });
            }
            Ok(new_text)
        }
    }
}
