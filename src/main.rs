//! memostash - inspect and exercise a disk-backed memoization cache
//!
//! memostash provides:
//! - Artifact listing and inspection under a cache root
//! - Path resolution for filename templates
//! - Content fingerprints for JSON values
//! - A bundled demo that exercises the cache end to end
//! - Unified output format (jsonl/json/md)

use anyhow::Result;
use clap::Parser;

use memostash::cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_tracing(cli.verbose);
    cli::run(cli)
}
