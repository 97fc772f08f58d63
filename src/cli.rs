//! CLI module - Command-line interface definitions and handlers

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cache::store::{Storage, StorageConfig};
use crate::core::fingerprint::HashAlgorithm;
use crate::core::render::{OutputFormat, RenderConfig};

/// memostash - inspect and exercise a disk-backed memoization cache.
#[derive(Parser, Debug)]
#[command(name = "memostash")]
#[command(
    author,
    version,
    about,
    long_about = r#"memostash works on a cache directory whose files are named by rendering
a template over a function's call arguments. The extension of each file
selects its encoding: .npy (one array), .npz (named arrays), anything else
(JSON object).

Each command prints a ResultSet in the selected format (default: jsonl).

Examples:
    memostash --root tmp list
    memostash --root tmp inspect "image-(50, 50).npy"
    memostash --root tmp path "images-{shape}-{size}.npz" --arg "shape=(50, 50)" --arg size=20
    memostash fingerprint "[1, 2, 3]"
    memostash --root tmp demo
"#
)]
pub struct Cli {
    /// Cache root directory.
    #[arg(
        long,
        global = true,
        env = "MEMOSTASH_ROOT",
        default_value = ".",
        value_name = "ROOT",
        long_help = "Cache root directory (defaults to the current directory).\n\n\
Template paths are joined onto this root, and paths in results are reported\n\
relative to it."
    )]
    pub root: PathBuf,

    /// Output format.
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Jsonl,
        value_name = "FORMAT"
    )]
    pub format: OutputFormat,

    /// Digest for hashed template fields and fingerprints (sha1/xxh3).
    #[arg(
        long,
        global = true,
        default_value = "sha1",
        value_name = "ALGO",
        long_help = "Digest used for hash-classified template fields and the fingerprint\n\
command.\n\n\
Supported values:\n\
- sha1 (default): 40 hex characters\n\
- xxh3: 16 hex characters"
    )]
    pub hash_algorithm: String,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode: suppress cache-hit notices.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging on stderr).
    #[arg(
        short,
        long,
        global = true,
        long_help = "Enable debug logging on stderr. Without this flag the MEMOSTASH_LOG\n\
environment variable selects the filter (default: warn)."
    )]
    pub verbose: bool,

    /// Pretty-print JSON/JSONL output with indentation.
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every artifact under the cache root.
    #[command(long_about = "Walk the cache root and emit one artifact item per file, sorted by\n\
path, with size, modification time and the codec its extension selects.\n\n\
Example:\n\
  memostash --root tmp list\n")]
    List,

    /// Load an artifact and describe its content.
    #[command(long_about = "Load FILE through the extension-selected codec and emit its codec,\n\
a one-line summary, a structured view and its content fingerprint.\n\
A file that fails to decode is reported as an error.\n\n\
Example:\n\
  memostash --root tmp inspect \"image-(50, 50).npy\"\n")]
    Inspect {
        /// Artifact path (relative to ROOT unless absolute).
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Fingerprint a JSON value.
    #[command(long_about = "Compute the content fingerprint of a JSON literal. JSON arrays are\n\
fingerprinted as lists and objects as dicts. A value wrapped in parentheses,\n\
such as \"(50, 50)\", is read as a tuple.\n\n\
Example:\n\
  memostash fingerprint \"[1, 2, 3]\"\n")]
    Fingerprint {
        #[arg(value_name = "VALUE")]
        value: String,
    },

    /// Resolve a filename template against named arguments.
    #[command(long_about = "Render TEMPLATE under ROOT using keyword arguments, without computing\n\
or caching anything, and report whether an artifact already exists there.\n\n\
Argument values are JSON; text that is not valid JSON is taken as a string,\n\
and \"(a, b)\" is read as a tuple.\n\n\
Example:\n\
  memostash path \"hashed-{x}\" --arg \"x=[1, 2, 3]\" --hash x\n")]
    Path {
        #[arg(value_name = "TEMPLATE")]
        template: String,

        /// Keyword argument as NAME=VALUE (repeatable).
        #[arg(long = "arg", value_name = "NAME=VALUE")]
        args: Vec<String>,

        /// Fields replaced by their fingerprint (comma-separated).
        #[arg(long, value_name = "FIELDS", value_delimiter = ',')]
        hash: Vec<String>,
    },

    /// Run the bundled demonstration against ROOT.
    #[command(long_about = "Exercise the cache with four functions: an array cached as .npy,\n\
a set of named arrays cached as .npz, a plain JSON value, and a value whose\n\
filename uses a hashed argument. Run it twice to see cache hits.\n\n\
Example:\n\
  memostash --root tmp demo\n")]
    Demo,
}

/// Install the stderr tracing subscriber
pub fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("memostash=debug")
    } else {
        EnvFilter::try_from_env("MEMOSTASH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    if cli.no_color {
        colored::control::set_override(false);
    }

    let render_config = RenderConfig::with_pretty(cli.format, cli.pretty);
    let algorithm: HashAlgorithm = cli
        .hash_algorithm
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let storage = Storage::with_config(
        cli.root,
        StorageConfig {
            verbose: !cli.quiet,
            algorithm,
        },
    );

    match cli.command {
        Commands::List => crate::cache::listing::run_list(&storage, render_config),

        Commands::Inspect { file } => {
            crate::cache::inspect::run_inspect(&storage, &file, render_config)
        }

        Commands::Fingerprint { value } => {
            crate::cache::inspect::run_fingerprint(&value, algorithm, render_config)
        }

        Commands::Path {
            template,
            args,
            hash,
        } => crate::cache::inspect::run_path(&storage, &template, &args, &hash, render_config),

        Commands::Demo => crate::demo::run_demo(&storage, render_config),
    }
}
