//! The main entry point for the `regsweep` command-line application.
//!
//! Parses the command line, installs logging and hands the command to
//! `regsweep::app`.

use regsweep::errors::Error;
use regsweep::{app, cli, logging};
use std::env;
use std::process::ExitCode;

const EXIT_INVALID_PATTERN: u8 = 2;

fn main() -> ExitCode {
    let args_vec: Vec<String> = env::args().collect();
    if args_vec.len() == 1 {
        println!("Regex match / invert / replace across files of mixed encodings\n");
        println!("QUICK START EXAMPLES:");
        println!("  regsweep match -p 'TODO' src/ -x rs          # List matches");
        println!("  regsweep replace -p 'foo' -r 'bar' notes/    # Replace in place");
        println!("  regsweep invert -p '\\d+' -r ',' data.txt     # Keep only the numbers");
        println!("  regsweep replace -p foo -r bar --text 'foo'  # Work on a string\n");
        println!("Run 'regsweep --help' for full command list");
        println!("Run 'regsweep <command> --help' for detailed command help");
        return ExitCode::SUCCESS;
    }

    if args_vec.len() == 2 && matches!(args_vec[1].as_str(), "match" | "invert" | "replace") {
        let mode = &args_vec[1];
        eprintln!("Please provide a regex pattern.\n");
        eprintln!("USAGE EXAMPLES:");
        eprintln!("  regsweep {mode} -p 'colou?r' docs/ -x md");
        eprintln!("  regsweep {mode} -p '[0-9]+' --text 'abc123'");
        eprintln!("\nFor more options: regsweep {mode} --help");
        return ExitCode::FAILURE;
    }

    let args = cli::parse_args();
    logging::init(args.verbose);

    match app::run(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        // Already reported as an event.
        Err(Error::Pattern(_)) => ExitCode::from(EXIT_INVALID_PATTERN),
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
