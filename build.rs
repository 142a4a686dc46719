// build.rs

use clap::{Arg, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn build_cli() -> Command {
    Command::new("lfsd")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Source-based package manager for a from-scratch distribution")
        .subcommand_required(true)
        .subcommand(
            Command::new("sync")
                .about("Update or clone the recipe repository")
                .arg(Arg::new("repo").help("Target checkout (defaults to the recipes directory)")),
        )
        .subcommand(Command::new("list").about("List every recipe with its install status"))
        .subcommand(
            Command::new("info")
                .about("Show a recipe's metadata and install status")
                .arg(Arg::new("package").required(true).help("Package name")),
        )
        .subcommand(
            Command::new("plan")
                .about("Resolve dependencies and write the build plan")
                .arg(
                    Arg::new("packages")
                        .required(true)
                        .num_args(1..)
                        .help("Target package names"),
                ),
        )
        .subcommand(
            Command::new("build")
                .about("Build every package in the stored plan")
                .arg(
                    Arg::new("strip")
                        .long("strip")
                        .action(clap::ArgAction::SetTrue)
                        .help("Strip ELF binaries in the staged prefixes"),
                )
                .arg(
                    Arg::new("no_pack")
                        .long("no-pack")
                        .action(clap::ArgAction::SetTrue)
                        .help("Skip producing binary packages"),
                ),
        )
        .subcommand(
            Command::new("apply").about("Snapshot, then mirror staged packages onto the live root"),
        )
        .subcommand(
            Command::new("install")
                .about("Plan, build, and apply one package")
                .arg(Arg::new("package").required(true).help("Package name")),
        )
        .subcommand(
            Command::new("remove")
                .about("Remove an installed package")
                .arg(Arg::new("package").required(true).help("Package name")),
        )
        .subcommand(
            Command::new("snapshot")
                .about("Create a snapshot of the covered live subtree")
                .arg(Arg::new("label").help("Snapshot label")),
        )
        .subcommand(
            Command::new("rollback")
                .about("Extract a snapshot back over the live root")
                .arg(Arg::new("snapshot").required(true).help("Snapshot archive or label")),
        )
        .subcommand(Command::new("upgrade").about("Rebuild and apply every package with version drift"))
        .subcommand(
            Command::new("rebuild")
                .about("Rebuild a single package")
                .arg(Arg::new("package").required(true).help("Package name")),
        )
        .subcommand(Command::new("rebuild-all").about("Rebuild every recipe in dependency order"))
        .subcommand(
            Command::new("install-bin")
                .about("Extract a prebuilt package archive over the live root")
                .arg(Arg::new("archive").required(true).help("Path to a .tar.zst package")),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();
    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    if let Err(e) = fs::write(man_dir.join("lfsd.1"), buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
