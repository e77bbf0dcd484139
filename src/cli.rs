use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "il2cpp-finder")]
#[command(about = "Search classes, fields and methods recovered from an IL2CPP dump.cs")]
pub struct Cli {
    /// Dump folder containing dump.cs, or the dump file itself
    #[arg(short = 'p', long, value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Run one command (e.g. "class Player") and exit
    #[arg(short = 'c', long, value_name = "COMMAND")]
    pub cmd: Option<String>,

    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Shortcut for --format json
    #[arg(short = 'j', long)]
    pub json: bool,

    /// Shortcut for --format ts
    #[arg(long)]
    pub ts: bool,

    /// Max results per listing, 0 for no limit
    #[arg(short = 'l', long, value_name = "N", default_value_t = 50)]
    pub limit: usize,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Ts,
}
