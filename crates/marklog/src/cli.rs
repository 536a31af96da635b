use clap::{Parser, Subcommand, ValueEnum};
use marklog_store::LogEncoding;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "marklog")]
#[command(version)]
#[command(about = "Markup lifecycle logs for annotation sessions")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print a session's markup log
    Show {
        /// Session folder containing the persisted log
        folder: PathBuf,

        /// Include deleted rows, not just the active view
        #[arg(long)]
        all: bool,

        /// Preferred log encoding to read
        #[arg(long, value_enum, default_value_t = EncodingArg::Flat)]
        encoding: EncodingArg,
    },

    /// Re-encode a session's markup log
    Convert {
        /// Session folder containing the persisted log
        folder: PathBuf,

        /// Target encoding
        #[arg(long, value_enum)]
        to: EncodingArg,
    },

    /// Summarize a case-level progress log
    Progress {
        /// Path to the progress CSV
        log: PathBuf,
    },

    /// Print version information
    Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EncodingArg {
    Flat,
    Rich,
}

impl std::fmt::Display for EncodingArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodingArg::Flat => write!(f, "flat"),
            EncodingArg::Rich => write!(f, "rich"),
        }
    }
}

impl From<EncodingArg> for LogEncoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Flat => LogEncoding::Flat,
            EncodingArg::Rich => LogEncoding::Rich,
        }
    }
}
