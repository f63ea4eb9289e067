//! # stage-cli
//!
//! Command-line harness over `stage-store`.
//!
//! - `stage show/keys` — inspect committed data at a dotted path
//! - `stage set/unset` — stage one edit, report whether it changed anything,
//!   and commit it (skipped with `--dry-run`)
//! - `stage free-key` — find the first unused `base1`, `base2`, ... key

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use stage_store::StoreConfig;
use tracing_subscriber::EnvFilter;

/// Staged JSON document editor.
#[derive(Parser)]
#[command(name = "stage", version, about)]
struct Cli {
    /// Project root directory (defaults to current directory).
    #[arg(long, default_value = ".")]
    project_root: PathBuf,

    /// Log at debug level.
    #[arg(long, short)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the data at a path.
    Show {
        /// Store identifier.
        id: String,
        /// Dotted path (e.g. "baz.a"); root when omitted.
        #[arg(default_value = "")]
        path: String,
    },
    /// List the keys at a path.
    Keys {
        /// Store identifier.
        id: String,
        /// Dotted path; root when omitted.
        #[arg(default_value = "")]
        path: String,
    },
    /// Set the value at a path. Values that are not valid JSON are stored as strings.
    Set {
        /// Store identifier.
        id: String,
        /// Dotted path to the key being written.
        path: String,
        /// JSON value.
        value: String,
        /// Report the change without committing it.
        #[arg(long)]
        dry_run: bool,
    },
    /// Remove the key at a path.
    Unset {
        /// Store identifier.
        id: String,
        /// Dotted path to the key being removed.
        path: String,
        /// Report the change without committing it.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the first free key named after a base.
    FreeKey {
        /// Store identifier.
        id: String,
        /// Base name (e.g. "item").
        base: String,
        /// Dotted path of the namespace to search.
        #[arg(long, default_value = "")]
        path: String,
        /// Separator between base and number.
        #[arg(long, default_value = "")]
        separator: String,
        /// Try the bare base name first.
        #[arg(long)]
        first_clean: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they don't mix with JSON on stdout.
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("stage_store={}", level).parse()?)
                .add_directive(format!("stage_cli={}", level).parse()?),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let project_root = cli.project_root.canonicalize().unwrap_or(cli.project_root);
    let config = StoreConfig::for_project(&project_root);
    let project = commands::Project {
        root: project_root,
        config,
    };

    match &cli.command {
        Commands::Show { id, path } => commands::inspect::show(&project, id, path),
        Commands::Keys { id, path } => commands::inspect::keys(&project, id, path),
        Commands::Set {
            id,
            path,
            value,
            dry_run,
        } => commands::edit::set(&project, id, path, value, *dry_run),
        Commands::Unset { id, path, dry_run } => commands::edit::unset(&project, id, path, *dry_run),
        Commands::FreeKey {
            id,
            base,
            path,
            separator,
            first_clean,
        } => commands::inspect::free_key(&project, id, path, base, separator, *first_clean),
    }
}
