pub mod app;
pub mod render;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sheetdb")]
#[command(about = "Edit CSV sheets in place without risking the previous version")]
pub struct Cli {
    #[command(flatten)]
    pub persist: PersistArgs,

    /// Print the save report as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Log protocol phases
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args)]
pub struct PersistArgs {
    /// Directory for backups of the previous version (default: next to the file)
    #[arg(long, global = true)]
    pub backup_dir: Option<PathBuf>,

    /// Directory for staging files (default: next to the file)
    #[arg(long, global = true)]
    pub staging_dir: Option<PathBuf>,

    /// Buffer size used when a rename has to fall back to copying
    #[arg(long, global = true)]
    pub chunk_size: Option<usize>,

    /// Skip fsync of written files
    #[arg(long, global = true)]
    pub no_sync: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the sheet as a table
    Show { file: PathBuf },

    /// Replace the header row
    Header {
        file: PathBuf,
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Append a row
    Append {
        file: PathBuf,
        #[arg(required = true)]
        values: Vec<String>,
    },

    /// Set a single cell; COLUMN is a zero-based index or a header name
    Set {
        file: PathBuf,
        row: usize,
        column: String,
        value: String,
    },

    /// Delete a row by zero-based index
    DeleteRow { file: PathBuf, row: usize },
}
