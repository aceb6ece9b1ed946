//! Glue between the parsed command line and the batch engine.

use crate::batch::{self, BatchOptions};
use crate::cli::{CommonArgs, Commands};
use crate::config::{ConfigLoader, Settings};
use crate::engine::Mode;
use crate::errors::{Error, Result};
use crate::output_formatter::OutputFormatter;
use crate::sources::{self, SourceDescriptor, WalkOptions};
use std::env;
use std::io::{self, BufRead, Read, Write};

const MODIFY_WARNING: &str = "This operation may permanently modify files. Continue? [y/N] ";

/// Runs one parsed command to completion.
///
/// An invalid pattern has already been reported through the output when
/// `Error::Pattern` comes back.
pub fn run(command: Commands) -> Result<()> {
    let (mode, common, replacement) = command.into_parts();

    let pattern = common.pattern.trim();
    if pattern.is_empty() {
        return Err(Error::EmptyPattern);
    }

    let settings = ConfigLoader::resolve(common.config.as_deref(), &env::current_dir()?)?;
    let options = BatchOptions::new(pattern, mode)
        .with_replacement(replacement)
        .with_prober(settings.prober(&common.encodings)?)
        .dry_run(common.dry_run);

    let stdout = io::stdout();
    let mut output = OutputFormatter::new(common.format, stdout.lock());

    if let Some(text) = inline_text(&common)? {
        return run_text(&text, &options, output);
    }

    let Some(path) = common.path.as_deref() else {
        return Err("Provide a file or directory, --text or --stdin.".into());
    };
    if !path.exists() {
        return Err(format!(
            "The selected path is not a valid file or directory: {}",
            path.display()
        )
        .into());
    }

    let descriptor = SourceDescriptor::for_path(path, extension(&common, &settings));
    let walk = WalkOptions {
        respect_ignore: common.gitignore || settings.gitignore,
    };
    let paths = sources::enumerate(&descriptor, walk);
    if paths.is_empty() {
        output.message("No files found to process.")?;
        output.finish()?;
        return Ok(());
    }

    if needs_confirmation(mode, &common) {
        let stdin = io::stdin();
        if !confirm(MODIFY_WARNING, stdin.lock(), io::stderr())? {
            output.message("Aborted, no files were touched.")?;
            output.finish()?;
            return Ok(());
        }
    }

    output.message(&format!("Starting processing in '{mode}' mode...\n"))?;
    let summary = match batch::run(&paths, &options, &mut output) {
        Ok(summary) => summary,
        Err(err) => {
            output.finish()?;
            return Err(err);
        }
    };
    output.summary(&summary)?;
    output.message("Processing complete.")?;
    output.finish()?;
    Ok(())
}

fn run_text<W: Write>(text: &str, options: &BatchOptions, mut output: OutputFormatter<W>) -> Result<()> {
    output.message(&format!(
        "Starting processing in '{}' mode (inline text)...\n",
        options.mode
    ))?;
    let result = batch::process_text(text, options, &mut output);
    if result.is_ok() {
        output.message("Processing complete.")?;
    }
    output.finish()?;
    result.map(|_| ())
}

/// The inline text to process, if the user asked for inline processing.
fn inline_text(common: &CommonArgs) -> Result<Option<String>> {
    let text = if let Some(text) = &common.text {
        text.clone()
    } else if common.stdin {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        return Ok(None);
    };

    let text = text.trim_end_matches('\n').to_string();
    if text.is_empty() {
        return Err("Please enter or paste some text.".into());
    }
    Ok(Some(text))
}

fn extension<'a>(common: &'a CommonArgs, settings: &'a Settings) -> Option<&'a str> {
    common
        .extension
        .as_deref()
        .or(settings.extension.as_deref())
}

/// Asks a yes/no question; anything but `y` or `yes` means no.
pub fn confirm<R: BufRead, W: Write>(prompt: &str, mut input: R, mut prompt_out: W) -> Result<bool> {
    write!(prompt_out, "{prompt}")?;
    prompt_out.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes"
    ))
}

/// Whether `mode` needs the modification warning for file input.
pub fn needs_confirmation(mode: Mode, common: &CommonArgs) -> bool {
    mode.modifies() && !common.dry_run && !common.yes
}
