// src/commands.rs
//! Command handlers for the lfsd CLI

use anyhow::Result;
use lfsd::build::tools;
use lfsd::resolver;
use lfsd::sync::sync_recipes;
use lfsd::{
    ApplyEngine, BuildOptions, Builder, Config, Error, PlanStore, RecipeStore, Registry,
    RemoveEngine, SnapshotStore, StateLock,
};
use std::path::Path;
use tracing::info;

/// `sync [repo]`: update or clone the recipe repository.
pub fn cmd_sync(config: &Config, repo: Option<&Path>) -> Result<()> {
    let _lock = StateLock::acquire(config)?;
    sync_recipes(config, repo)?;
    Ok(())
}

/// `list`: every recipe with an install marker and installed version.
pub fn cmd_list(config: &Config) -> Result<()> {
    let store = RecipeStore::new(&config.recipes_dir);
    let registry = Registry::load(config)?;

    for (name, _) in store.load_all()? {
        match registry.get(&name) {
            Some(info) => println!("[x] {} {}", name, info.version),
            None => println!("[ ] {}", name),
        }
    }
    Ok(())
}

/// `info <pkg>`: recipe metadata and install status.
pub fn cmd_info(config: &Config, package: &str) -> Result<()> {
    let store = RecipeStore::new(&config.recipes_dir);
    let recipe = store.find(package)?;
    let registry = Registry::load(config)?;

    println!("{}@{}", recipe.name, recipe.version);
    println!("recipe: {}", recipe.path.display());
    if recipe.depends.is_empty() {
        println!("depends: (none)");
    } else {
        println!("depends: {}", recipe.depends.join(" "));
    }
    match registry.get(package) {
        Some(info) => println!("installed: {} at {}", info.version, info.installed_at),
        None => println!("not installed"),
    }
    Ok(())
}

/// `plan <pkg>...`: compute the closure, sort, persist the plan.
pub fn cmd_plan(config: &Config, targets: &[String]) -> Result<()> {
    let _lock = StateLock::acquire(config)?;
    let order = plan_targets(config, targets)?;
    println!("plan saved to {} ({} packages)", config.plan_path().display(), order.len());
    Ok(())
}

/// `build [--strip] [--no-pack]`: build every package in the stored plan.
pub fn cmd_build(config: &Config, options: &BuildOptions) -> Result<()> {
    let _lock = StateLock::acquire(config)?;
    run_build(config, options)?;
    Ok(())
}

/// `apply`: snapshot, then mirror staged pkgroots onto the live root.
pub fn cmd_apply(config: &Config) -> Result<()> {
    let _lock = StateLock::acquire(config)?;
    ApplyEngine::new(config).apply()?;
    println!("apply complete");
    Ok(())
}

/// `install <pkg>`: plan, build, apply in one go.
pub fn cmd_install(config: &Config, package: &str) -> Result<()> {
    let _lock = StateLock::acquire(config)?;
    plan_targets(config, std::slice::from_ref(&package.to_string()))?;
    run_build(config, &BuildOptions::default())?;
    ApplyEngine::new(config).apply()?;
    println!("installed {}", package);
    Ok(())
}

/// `remove <pkg>`: reverse-dependency check, then delete.
pub fn cmd_remove(config: &Config, package: &str) -> Result<()> {
    let _lock = StateLock::acquire(config)?;
    RemoveEngine::new(config).remove(package)?;
    println!("removed {}", package);
    Ok(())
}

/// `snapshot [label]`: archive the covered subtree.
pub fn cmd_snapshot(config: &Config, label: Option<&str>) -> Result<()> {
    let _lock = StateLock::acquire(config)?;
    let label = label
        .map(str::to_string)
        .unwrap_or_else(SnapshotStore::manual_label);
    let archive = SnapshotStore::new(config).create(&label)?;
    println!("snapshot {} created", archive.display());
    Ok(())
}

/// `rollback <snap>`: extract a snapshot back over the live root.
pub fn cmd_rollback(config: &Config, name: &str) -> Result<()> {
    let _lock = StateLock::acquire(config)?;
    SnapshotStore::new(config).rollback(name)?;
    println!("rollback applied");
    Ok(())
}

/// `upgrade`: rebuild every installed package whose recipe version drifted,
/// then apply.
pub fn cmd_upgrade(config: &Config) -> Result<()> {
    let _lock = StateLock::acquire(config)?;

    let store = RecipeStore::new(&config.recipes_dir);
    let recipes = store.load_all()?;
    let mut registry = Registry::load(config)?;

    // Registry order, not topological; upgrades rebuild in place.
    let mut outdated = Vec::new();
    for (name, info) in registry.iter() {
        let Some(path) = recipes.get(name) else {
            continue;
        };
        let recipe = store.load(path)?;
        if recipe.version != info.version {
            outdated.push(recipe);
        }
    }

    if outdated.is_empty() {
        println!("all up-to-date");
        return Ok(());
    }

    let builder = Builder::new(config);
    let options = BuildOptions::default();
    for recipe in &outdated {
        println!("upgrading {} to {}", recipe.name, recipe.version);
        builder.build(recipe, &mut registry, &options)?;
    }

    ApplyEngine::new(config).apply()?;
    println!("upgraded {} package(s)", outdated.len());
    Ok(())
}

/// `rebuild <pkg>`: rebuild a single package into its staged prefix.
pub fn cmd_rebuild(config: &Config, package: &str) -> Result<()> {
    let _lock = StateLock::acquire(config)?;

    let store = RecipeStore::new(&config.recipes_dir);
    let recipe = store.find(package)?;
    let mut registry = Registry::load(config)?;
    Builder::new(config).build(&recipe, &mut registry, &BuildOptions::default())?;
    println!("rebuilt {}", recipe.slug());
    Ok(())
}

/// `rebuild-all`: topologically rebuild every recipe in the store.
pub fn cmd_rebuild_all(config: &Config) -> Result<()> {
    let _lock = StateLock::acquire(config)?;

    let store = RecipeStore::new(&config.recipes_dir);
    let mut graph = lfsd::DepGraph::new();
    for (name, depends) in store.dependency_map()? {
        graph.add_package(&name, &depends);
    }
    let order = graph.topological_sort()?;

    let mut registry = Registry::load(config)?;
    let builder = Builder::new(config);
    let options = BuildOptions::default();

    for name in &order {
        let recipe = store.find(name)?;
        builder.build(&recipe, &mut registry, &options)?;
    }
    println!("rebuilt {} package(s)", order.len());
    Ok(())
}

/// `install-bin <file.tar.zst>`: extract a prebuilt package over the live
/// root.
pub fn cmd_install_bin(config: &Config, archive: &Path) -> Result<()> {
    let _lock = StateLock::acquire(config)?;

    if !archive.is_file() {
        return Err(Error::Config(format!("package archive {} not found", archive.display())).into());
    }
    tools::unpack_zstd(archive, &config.root)?;
    println!("installed {}", archive.display());
    Ok(())
}

/// Shared by `plan` and `install`: closure, sort, persist.
fn plan_targets(config: &Config, targets: &[String]) -> Result<Vec<String>> {
    let store = RecipeStore::new(&config.recipes_dir);
    let graph = resolver::closure(&store, targets)?;
    let order = graph.topological_sort()?;
    PlanStore::new(config).write(&order)?;
    Ok(order)
}

/// Shared by `build` and `install`: run the stored plan in order.
fn run_build(config: &Config, options: &BuildOptions) -> Result<()> {
    let plan = PlanStore::new(config).read()?;
    let store = RecipeStore::new(&config.recipes_dir);
    let mut registry = Registry::load(config)?;
    let builder = Builder::new(config);

    for (i, name) in plan.iter().enumerate() {
        info!("[{}/{}] {}", i + 1, plan.len(), name);
        let recipe = store.find(name)?;
        builder.build(&recipe, &mut registry, options)?;
    }
    println!("builds completed ({} packages)", plan.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn test_config(dir: &Path) -> Config {
        let config = Config {
            recipes_dir: dir.join("recipes"),
            state_dir: dir.join("state"),
            stage_dir: dir.join("stage"),
            cache_dir: dir.join("cache"),
            bin_dir: dir.join("cache/bin"),
            sources_dir: dir.join("cache/sources"),
            log_dir: dir.join("log"),
            root: dir.join("root"),
            ..Config::default()
        };
        config.ensure_dirs().unwrap();
        config
    }

    fn write_recipe(config: &Config, name: &str, content: &str) {
        let dir = config.recipes_dir.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("recipe.toml"), content).unwrap();
    }

    #[test]
    fn test_plan_persists_topological_order() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        write_recipe(&config, "a", "name = \"a\"\nversion = \"1\"\n");
        write_recipe(
            &config,
            "b",
            "name = \"b\"\nversion = \"1\"\ndepends = [\"a\"]\n",
        );

        cmd_plan(&config, &["b".to_string()]).unwrap();
        assert_eq!(
            fs::read_to_string(config.plan_path()).unwrap(),
            "a\nb\n"
        );
    }

    #[test]
    fn test_plan_cycle_leaves_no_plan() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        write_recipe(
            &config,
            "x",
            "name = \"x\"\nversion = \"1\"\ndepends = [\"y\"]\n",
        );
        write_recipe(
            &config,
            "y",
            "name = \"y\"\nversion = \"1\"\ndepends = [\"x\"]\n",
        );

        assert!(cmd_plan(&config, &["x".to_string()]).is_err());
        assert!(!config.plan_path().exists());
    }

    #[test]
    fn test_build_without_plan() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());

        let err = cmd_build(&config, &BuildOptions::default()).unwrap_err();
        let code = err.downcast_ref::<Error>().map(Error::exit_code);
        assert_eq!(code, Some(1));
    }

    #[test]
    fn test_upgrade_with_nothing_installed() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        cmd_upgrade(&config).unwrap();
    }

    #[test]
    fn test_install_bin_missing_archive() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());

        let err = cmd_install_bin(&config, &tmp.path().join("nope.tar.zst")).unwrap_err();
        let code = err.downcast_ref::<Error>().map(Error::exit_code);
        assert_eq!(code, Some(1));
    }

    #[test]
    fn test_info_unknown_package() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());

        let err = cmd_info(&config, "ghost").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::RecipeNotFound(_))
        ));
    }

    #[test]
    fn test_list_runs_on_empty_store() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        cmd_list(&config).unwrap();
    }
}
