// src/main.rs
//! lfsd - CLI entry point

use clap::{Parser, Subcommand};
use lfsd::{BuildOptions, Config};
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;

// =============================================================================
// CLI Definitions
// =============================================================================

#[derive(Parser)]
#[command(name = "lfsd")]
#[command(version)]
#[command(about = "Source-based package manager for a from-scratch distribution", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Update or clone the recipe repository
    #[command(visible_alias = "s")]
    Sync {
        /// Target checkout (defaults to the recipes directory)
        repo: Option<PathBuf>,
    },

    /// List every recipe with its install status
    List,

    /// Show a recipe's metadata and install status
    Info {
        /// Package name
        package: String,
    },

    /// Resolve dependencies and write the build plan
    #[command(visible_alias = "p")]
    Plan {
        /// Target package names
        #[arg(required = true)]
        packages: Vec<String>,
    },

    /// Build every package in the stored plan
    #[command(visible_alias = "b")]
    Build {
        /// Strip ELF binaries in the staged prefixes
        #[arg(long)]
        strip: bool,

        /// Skip producing binary packages
        #[arg(long)]
        no_pack: bool,
    },

    /// Snapshot, then mirror staged packages onto the live root
    Apply,

    /// Plan, build, and apply one package
    #[command(visible_alias = "i")]
    Install {
        /// Package name
        package: String,
    },

    /// Remove an installed package
    #[command(visible_alias = "rm")]
    Remove {
        /// Package name
        package: String,
    },

    /// Create a snapshot of the covered live subtree
    Snapshot {
        /// Snapshot label (defaults to manual-<timestamp>)
        label: Option<String>,
    },

    /// Extract a snapshot back over the live root
    Rollback {
        /// Snapshot archive or label
        snapshot: String,
    },

    /// Rebuild and apply every package with version drift
    Upgrade,

    /// Rebuild a single package
    Rebuild {
        /// Package name
        package: String,
    },

    /// Rebuild every recipe in dependency order
    RebuildAll,

    /// Extract a prebuilt package archive over the live root
    InstallBin {
        /// Path to a .tar.zst package
        archive: PathBuf,
    },
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(config.color.enabled())
        .init();

    if let Err(e) = config.ensure_dirs() {
        eprintln!("lfsd: {}", e);
        return ExitCode::from(1);
    }

    let result = match cli.command {
        Commands::Sync { repo } => commands::cmd_sync(&config, repo.as_deref()),
        Commands::List => commands::cmd_list(&config),
        Commands::Info { package } => commands::cmd_info(&config, &package),
        Commands::Plan { packages } => commands::cmd_plan(&config, &packages),
        Commands::Build { strip, no_pack } => commands::cmd_build(
            &config,
            &BuildOptions {
                strip,
                pack: !no_pack,
            },
        ),
        Commands::Apply => commands::cmd_apply(&config),
        Commands::Install { package } => commands::cmd_install(&config, &package),
        Commands::Remove { package } => commands::cmd_remove(&config, &package),
        Commands::Snapshot { label } => commands::cmd_snapshot(&config, label.as_deref()),
        Commands::Rollback { snapshot } => commands::cmd_rollback(&config, &snapshot),
        Commands::Upgrade => commands::cmd_upgrade(&config),
        Commands::Rebuild { package } => commands::cmd_rebuild(&config, &package),
        Commands::RebuildAll => commands::cmd_rebuild_all(&config),
        Commands::InstallBin { archive } => commands::cmd_install_bin(&config, &archive),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("lfsd: {:#}", e);
            let code = e
                .downcast_ref::<lfsd::Error>()
                .map(lfsd::Error::exit_code)
                .unwrap_or(1);
            ExitCode::from(code.clamp(0, 255) as u8)
        }
    }
}
