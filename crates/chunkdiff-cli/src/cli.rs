use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "chunkdiff",
    about = "Content-defined chunking diff for binary files",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary with proportional bars
    Text,
    /// One `start_a end_a start_b end_b` line per hunk
    Hunks,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Diff two files
    Diff(DiffArgs),
    /// List the content-defined chunks of a file
    Chunks(ChunksArgs),
    /// Align a stream of source hunks into virtual space
    Align(AlignArgs),
}

/// Chunking parameters shared by the subcommands that chunk.
#[derive(Args, Clone, Debug, Default)]
pub struct ChunkingArgs {
    /// Rolling window size in bytes
    #[arg(long)]
    pub window: Option<usize>,
    /// Boundary mask width; average chunk size is 2^N bytes
    #[arg(long)]
    pub mask_bits: Option<u32>,
    /// Bytes per sample; boundaries never split a sample
    #[arg(long)]
    pub sample_size: Option<usize>,
    /// TOML file with a [chunker] table; flags override it
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct DiffArgs {
    pub a: PathBuf,
    pub b: PathBuf,
    #[command(flatten)]
    pub chunking: ChunkingArgs,
    /// Trim samples both sides share from the edges of each hunk
    #[arg(long)]
    pub precise: bool,
    /// Width of the bars drawn by text output
    #[arg(long, default_value = "60")]
    pub width: usize,
}

#[derive(Args)]
pub struct ChunksArgs {
    pub file: PathBuf,
    #[command(flatten)]
    pub chunking: ChunkingArgs,
}

#[derive(Args)]
pub struct AlignArgs {
    /// Hunk stream to read; `-` or absent reads stdin
    pub input: Option<PathBuf>,
}
