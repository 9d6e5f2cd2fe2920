use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
pub struct Args {
    /// Sequence export directory containing the rgb/ and view/ subdirectories
    #[arg()]
    pub root: PathBuf,
    /// Index of the first displayed frame
    #[arg(short, long, default_value_t = 0)]
    pub start: usize,
}
