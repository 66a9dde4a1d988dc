#![forbid(unsafe_code)]

use clap::{Args, Parser, Subcommand};
use minitar::tar::{Archiver, TarResult};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "minitar", version, about = "Minimal ustar archiver")]
struct Cli {
    /// More log output on stderr (-v info, -vv debug). RUST_LOG wins if set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Args)]
struct Target {
    /// Archive file.
    #[arg(short = 'f', long = "file")]
    archive: PathBuf,
    /// Resolve member names against (and extract into) this directory.
    #[arg(short = 'C', long = "directory", default_value = ".")]
    directory: PathBuf,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write a new archive from the given files.
    #[command(visible_alias = "c")]
    Create {
        #[command(flatten)]
        target: Target,
        files: Vec<String>,
    },

    /// Add files to the end of an existing archive.
    #[command(visible_alias = "a")]
    Append {
        #[command(flatten)]
        target: Target,
        files: Vec<String>,
    },

    /// Add only the files not already in the archive.
    #[command(visible_alias = "u")]
    Update {
        #[command(flatten)]
        target: Target,
        files: Vec<String>,
    },

    /// List member names.
    #[command(visible_alias = "t")]
    List {
        #[command(flatten)]
        target: Target,
        /// Print mode, owner, size and mtime too.
        #[arg(short, long, default_value_t = false)]
        long: bool,
    },

    /// Extract every regular file.
    #[command(visible_alias = "x")]
    Extract {
        #[command(flatten)]
        target: Target,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn archiver(target: &Target) -> Archiver {
    Archiver::new().with_root(&target.directory)
}

fn list(target: &Target, long: bool) -> TarResult<()> {
    let archiver = archiver(target);
    if long {
        for e in archiver.entries(&target.archive)? {
            println!(
                "{} {:04o} {}/{} {:>10} {:>11} {}",
                e.entry_type.as_str(),
                e.mode,
                e.uname,
                e.gname,
                e.size,
                e.mtime,
                e.name
            );
        }
    } else {
        for name in archiver.list(&target.archive)? {
            println!("{}", name?);
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let res = match &cli.cmd {
        Command::Create { target, files } => archiver(target).create(&target.archive, files),
        Command::Append { target, files } => archiver(target).append(&target.archive, files),
        Command::Update { target, files } => archiver(target).update(&target.archive, files),
        Command::List { target, long } => list(target, *long),
        Command::Extract { target } => archiver(target).extract(&target.archive),
    };

    if let Err(e) = res {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
