mod editor;
mod util;

use clap::Parser;
use color_eyre::Report;
use std::{io, path::PathBuf};
use tracing_subscriber::EnvFilter;

use crate::editor::Editor;

/// Edit a text buffer backed by a rope, one command per line (h for help).
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// File to load at startup
    file: Option<PathBuf>,

    /// Rebalance the rope after every N edits
    #[arg(long, value_name = "N")]
    rebalance_every: Option<usize>,

    /// Raise the log level (-v info, -vv debug, -vvv trace) when RUST_LOG is unset
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let args = Args::parse();
    init_tracing(args.verbose);

    let mut editor = Editor::new(args.rebalance_every);
    if let Some(file) = &args.file {
        editor.load_file(file)?;
    }

    editor.run(io::stdin().lock())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn args_are_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn parse_args() {
        let args = Args::parse_from(["rope", "notes.txt", "--rebalance-every", "64", "-vv"]);
        assert_eq!(args.file, Some(PathBuf::from("notes.txt")));
        assert_eq!(args.rebalance_every, Some(64));
        assert_eq!(args.verbose, 2);

        let args = Args::parse_from(["rope"]);
        assert_eq!(args.file, None);
        assert_eq!(args.rebalance_every, None);
        assert_eq!(args.verbose, 0);
    }
}
