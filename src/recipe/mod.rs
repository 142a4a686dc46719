// src/recipe/mod.rs

//! Recipe data model and the on-disk recipe store.
//!
//! Recipes are `recipe.toml` files discovered by walking the recipe root.
//! The store is deliberately stateless: every command re-reads the tree, so
//! an edited recipe is picked up without any cache invalidation.

pub mod parser;

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// File name that marks a recipe directory
pub const RECIPE_FILE: &str = "recipe.toml";

/// A declarative build recipe for one package
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recipe {
    pub name: String,
    /// Opaque version string, compared by equality only
    pub version: String,
    /// Source archive URLs, fetched and unpacked in order
    pub sources: Vec<String>,
    /// Git repository URL; takes precedence over `sources` when set
    pub git: Option<String>,
    /// Patch URLs, applied in order with strip level 1
    pub patches: Vec<String>,
    /// Expected digest of a source artifact, lowercase or uppercase hex
    pub sha256: Option<String>,
    pub depends: Vec<String>,
    pub configure: Vec<String>,
    pub make: Vec<String>,
    pub install: Vec<String>,
    pub tests: Vec<String>,
    /// Distributed prebuilt; reserved
    pub bin_only: bool,
    /// Origin path, for diagnostics
    pub path: PathBuf,
}

impl Recipe {
    /// `<name>-<version>`, the directory slug used for stage, work, and
    /// artifact names
    pub fn slug(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }
}

/// Discovers and loads recipes under a root directory
#[derive(Debug, Clone)]
pub struct RecipeStore {
    root: PathBuf,
}

impl RecipeStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Walk the recipe root and map package name to recipe path.
    ///
    /// Unreadable or nameless recipes are skipped with a warning; a broken
    /// recipe must not hide the rest of the tree. On duplicate names the
    /// most recently visited file wins.
    pub fn load_all(&self) -> Result<BTreeMap<String, PathBuf>> {
        let mut recipes = BTreeMap::new();

        for entry in WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if entry.file_type().is_file() && entry.file_name() == RECIPE_FILE {
                match self.load(entry.path()) {
                    Ok(recipe) => {
                        recipes.insert(recipe.name, entry.path().to_path_buf());
                    }
                    Err(e) => {
                        warn!("skipping recipe {}: {}", entry.path().display(), e);
                    }
                }
            }
        }

        Ok(recipes)
    }

    /// Parse a single recipe file.
    pub fn load(&self, path: &Path) -> Result<Recipe> {
        let content = std::fs::read_to_string(path)?;
        let recipe = parser::parse_recipe(&content, path);
        if recipe.name.is_empty() {
            return Err(Error::Config(format!(
                "recipe {} has no name",
                path.display()
            )));
        }
        Ok(recipe)
    }

    /// Load the recipe for a package by name.
    pub fn find(&self, name: &str) -> Result<Recipe> {
        let recipes = self.load_all()?;
        let path = recipes
            .get(name)
            .ok_or_else(|| Error::RecipeNotFound(name.to_string()))?;
        self.load(path)
    }

    /// Map every package in the store to its declared dependencies.
    pub fn dependency_map(&self) -> Result<BTreeMap<String, Vec<String>>> {
        let mut deps = BTreeMap::new();
        for (name, path) in self.load_all()? {
            match self.load(&path) {
                Ok(recipe) => {
                    deps.insert(name, recipe.depends);
                }
                Err(e) => warn!("skipping recipe {}: {}", path.display(), e),
            }
        }
        Ok(deps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_recipe(root: &Path, dir: &str, content: &str) {
        let dir = root.join(dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(RECIPE_FILE), content).unwrap();
    }

    #[test]
    fn test_load_all_discovers_nested_recipes() {
        let tmp = tempfile::tempdir().unwrap();
        write_recipe(tmp.path(), "core/zlib", "name = \"zlib\"\nversion = \"1.3\"\n");
        write_recipe(
            tmp.path(),
            "apps/deep/nested/hello",
            "name = \"hello\"\nversion = \"1.0\"\n",
        );

        let store = RecipeStore::new(tmp.path());
        let recipes = store.load_all().unwrap();
        assert_eq!(recipes.len(), 2);
        assert!(recipes.contains_key("zlib"));
        assert!(recipes.contains_key("hello"));
    }

    #[test]
    fn test_nameless_recipe_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        write_recipe(tmp.path(), "ok", "name = \"ok\"\nversion = \"1\"\n");
        write_recipe(tmp.path(), "broken", "version = \"1\"\n");

        let store = RecipeStore::new(tmp.path());
        let recipes = store.load_all().unwrap();
        assert_eq!(recipes.len(), 1);
        assert!(recipes.contains_key("ok"));
    }

    #[test]
    fn test_find_missing_package() {
        let tmp = tempfile::tempdir().unwrap();
        let store = RecipeStore::new(tmp.path());
        assert!(matches!(
            store.find("nope"),
            Err(Error::RecipeNotFound(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_dependency_map() {
        let tmp = tempfile::tempdir().unwrap();
        write_recipe(tmp.path(), "a", "name = \"a\"\nversion = \"1\"\n");
        write_recipe(
            tmp.path(),
            "b",
            "name = \"b\"\nversion = \"1\"\ndepends = [\"a\"]\n",
        );

        let store = RecipeStore::new(tmp.path());
        let deps = store.dependency_map().unwrap();
        assert!(deps["a"].is_empty());
        assert_eq!(deps["b"], vec!["a"]);
    }

    #[test]
    fn test_slug() {
        let recipe = Recipe {
            name: "zlib".into(),
            version: "1.3.1".into(),
            ..Default::default()
        };
        assert_eq!(recipe.slug(), "zlib-1.3.1");
    }
}
