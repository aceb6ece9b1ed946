use crate::engine::{Mode, Replacement};
use crate::output_formatter::OutputFormat;
use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Regex search, replace and inverted-replace across files of mixed encodings.
///
/// `regsweep` walks a file or directory, decodes each file with the first
/// encoding that fits, applies one pattern in one mode and writes changed
/// files back in the encoding they were read with.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Regex match / invert / replace across files of mixed encodings",
    long_about = "regsweep - apply one regular expression to many files.

Modes:
  match    report every match, never modify anything
  invert   keep only the matched text; delete or replace everything else
  replace  substitute every match

Files are decoded with the first encoding that fits (utf-8, utf-16, cp1252,
iso-8859-1 by default) and written back in that same encoding.

QUICK EXAMPLES:
  regsweep match -p '[0-9]+' notes/ -x txt       # List numbers in .txt files
  regsweep replace -p 'colou?r' -r hue docs/     # Replace in place
  regsweep invert -p 'keep\\d' -r '|' file.txt    # Keep only the matches
  regsweep replace -p foo -r bar --text 'foo'    # Work on a string"
)]
pub struct Args {
    /// Increase diagnostic output on stderr (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Arguments shared by every mode.
#[derive(ClapArgs, Debug, Clone)]
pub struct CommonArgs {
    /// The regular expression to apply.
    #[arg(short, long)]
    pub pattern: String,

    /// A file or a directory to process recursively.
    #[arg(conflicts_with_all = ["text", "stdin"])]
    pub path: Option<PathBuf>,

    /// Process this text instead of files.
    #[arg(short, long, conflicts_with = "stdin")]
    pub text: Option<String>,

    /// Read the text to process from standard input.
    #[arg(long)]
    pub stdin: bool,

    /// Only visit files ending in this extension (directories only).
    #[arg(short = 'x', long = "ext")]
    pub extension: Option<String>,

    /// Comma-separated candidate encodings, tried in order.
    #[arg(short, long, value_delimiter = ',', env = "REGSWEEP_ENCODINGS")]
    pub encodings: Vec<String>,

    /// Skip files excluded by .gitignore and hidden files.
    #[arg(long)]
    pub gitignore: bool,

    /// Report what would change without writing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Do not ask for confirmation before modifying files.
    #[arg(short, long)]
    pub yes: bool,

    /// Path to a YAML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format for events and the summary.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// The three processing modes.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report matches without modifying anything.
    ///
    /// EXAMPLES:
    ///   regsweep match -p 'TODO|FIXME' src/ -x rs
    ///   regsweep match -p '[0-9]+' --text 'abc123def456'
    Match {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Keep matched text verbatim and delete or replace everything between matches.
    ///
    /// EXAMPLES:
    ///   regsweep invert -p '\w+@\w+\.com' contacts.txt        # Keep only addresses
    ///   regsweep invert -p '\.' -r '-' --text 'a.b.c'         # -> -.-.-
    Invert {
        #[command(flatten)]
        common: CommonArgs,

        /// Text inserted in place of every unmatched span (inserted literally).
        /// A blank value means delete; otherwise surrounding whitespace is kept.
        #[arg(short, long)]
        replacement: Option<String>,
    },

    /// Substitute every match.
    ///
    /// EXAMPLES:
    ///   regsweep replace -p 'foo' -r 'baz' notes/ -x txt
    ///   regsweep replace -p '(\w+)@(\w+)' -r '$3 at $2' list.txt
    ///
    /// `$1` is the whole match; the pattern's own groups start at `$2`.
    Replace {
        #[command(flatten)]
        common: CommonArgs,

        /// The replacement template. Omit (or pass a blank value) to delete
        /// matches; otherwise surrounding whitespace is kept.
        #[arg(short, long)]
        replacement: Option<String>,

        /// Insert the replacement as-is, without `$` expansion.
        #[arg(long)]
        literal: bool,
    },
}

impl Commands {
    /// Splits the command into its mode, shared arguments and replacement.
    ///
    /// A replacement that is blank after trimming counts as no replacement.
    pub fn into_parts(self) -> (Mode, CommonArgs, Option<Replacement>) {
        let blank_to_none = |r: Option<String>| r.filter(|text| !text.trim().is_empty());
        match self {
            Commands::Match { common } => (Mode::Match, common, None),
            Commands::Invert {
                common,
                replacement,
            } => (
                Mode::Invert,
                common,
                blank_to_none(replacement).map(Replacement::literal),
            ),
            Commands::Replace {
                common,
                replacement,
                literal,
            } => {
                let replacement = blank_to_none(replacement).map(|text| {
                    if literal {
                        Replacement::literal(text)
                    } else {
                        Replacement::template(text)
                    }
                });
                (Mode::Replace, common, replacement)
            }
        }
    }
}

/// Parses command-line arguments and returns the populated `Args` struct.
pub fn parse_args() -> Args {
    Args::parse()
}
