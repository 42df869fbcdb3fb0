//! The command-line surface: `<program> [-v...] <archive_path> <input_path> [<input_path> ...]`.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "rsqlitepack", about = "Packs SQLite database snapshots into a Zip64 archive")]
pub struct Cli {
    /// Path of the archive to create. Must not already exist with the identity of an input.
    pub archive: PathBuf,

    /// One or more relative paths to SQLite database files to snapshot.
    #[arg(required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,

    /// Raise logging verbosity; repeatable (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
