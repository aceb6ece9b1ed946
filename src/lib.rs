//! `regsweep` applies one regular expression to a single string or to many
//! files, in one of three modes.
//!
//! - `Match` reports every match and never writes.
//! - `Invert` keeps the matched spans verbatim and deletes or replaces the
//!   text between them.
//! - `Replace` substitutes every match with a `$`-template.
//!
//! Files are decoded with the first candidate encoding that accepts their
//! bytes (`encoding`), and anything that changed is written back atomically
//! in that same encoding (`batch::write_back`). Progress is reported as
//! [`Event`]s through an [`EventSink`], so library users can collect them
//! instead of printing.
//!
//! The main modules are:
//!
//! - `patterns`: compiling the user pattern and splitting text around matches.
//! - `engine`: the per-text transformation for each mode.
//! - `encoding`: the ordered encoding prober and re-encoding for write-back.
//! - `sources`: turning a file or directory into the list of files to visit.
//! - `batch`: the per-file orchestration and its summary counters.
//! - `config`: YAML settings for encodings, gitignore handling and extensions.

pub mod app;
pub mod batch;
pub mod cli;
pub mod config;
pub mod encoding;
pub mod engine;
pub mod errors;
pub mod events;
pub mod logging;
pub mod output_formatter;
pub mod patterns;
pub mod sources;

// Re-export main types for easier access by library users.
pub use batch::{BatchOptions, BatchSummary};
pub use encoding::EncodingProber;
pub use engine::{Mode, Replacement};
pub use errors::{Error, Result};
pub use events::{Event, EventSink};
pub use output_formatter::{OutputFormat, OutputFormatter};
pub use patterns::Pattern;
