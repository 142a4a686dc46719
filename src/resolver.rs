// src/resolver.rs

//! Dependency resolution: closure computation and topological ordering.
//!
//! The graph is built over package names only; versions play no part in
//! resolution. Ordering uses Kahn's algorithm with a FIFO queue seeded in
//! name order, so the emitted sequence is deterministic for a given store
//! and repeated plans are byte-identical.

use crate::error::{Error, Result};
use crate::recipe::RecipeStore;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// A directed dependency graph over package names
#[derive(Debug, Default)]
pub struct DepGraph {
    /// package -> packages it depends on
    deps: BTreeMap<String, BTreeSet<String>>,
    /// package -> packages that depend on it
    dependents: BTreeMap<String, BTreeSet<String>>,
}

impl DepGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a package and its dependencies, merging with any existing entry.
    ///
    /// Dependencies are added as nodes as well, so a name that never gets
    /// its own `add_package` call still participates in the ordering as a
    /// leaf.
    pub fn add_package(&mut self, name: &str, depends: &[String]) {
        self.deps.entry(name.to_string()).or_default();
        self.dependents.entry(name.to_string()).or_default();

        for dep in depends {
            self.deps.entry(dep.clone()).or_default();
            self.dependents.entry(dep.clone()).or_default();

            self.deps.get_mut(name).expect("node just inserted").insert(dep.clone());
            self.dependents
                .get_mut(dep)
                .expect("node just inserted")
                .insert(name.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.deps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.deps.contains_key(name)
    }

    /// Order the graph so that every package appears after all of its
    /// dependencies. Fails if a cycle remains.
    pub fn topological_sort(&self) -> Result<Vec<String>> {
        let mut in_degree: BTreeMap<&str, usize> = self
            .deps
            .iter()
            .map(|(name, deps)| (name.as_str(), deps.len()))
            .collect();

        let mut queue: VecDeque<&str> = in_degree
            .iter()
            .filter(|(_, deg)| **deg == 0)
            .map(|(name, _)| *name)
            .collect();

        let mut order = Vec::with_capacity(self.deps.len());
        while let Some(node) = queue.pop_front() {
            order.push(node.to_string());

            if let Some(dependents) = self.dependents.get(node) {
                for dependent in dependents {
                    let deg = in_degree
                        .get_mut(dependent.as_str())
                        .expect("dependent is a node");
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(dependent);
                    }
                }
            }
        }

        if order.len() != self.deps.len() {
            let stuck: Vec<&str> = self
                .deps
                .keys()
                .map(|k| k.as_str())
                .filter(|k| !order.iter().any(|o| o == k))
                .collect();
            return Err(Error::DependencyCycle(stuck.join(", ")));
        }

        Ok(order)
    }
}

/// Build the dependency closure of `targets` against the recipe store.
///
/// Every target must have a recipe. A transitive dependency without one is
/// kept as a leaf node; it sorts first and the builder reports the missing
/// recipe when it gets there.
pub fn closure(store: &RecipeStore, targets: &[String]) -> Result<DepGraph> {
    let recipes = store.load_all()?;
    let mut graph = DepGraph::new();
    let mut queue: VecDeque<String> = VecDeque::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();

    for target in targets {
        if !recipes.contains_key(target) {
            return Err(Error::RecipeNotFound(target.clone()));
        }
        queue.push_back(target.clone());
    }

    while let Some(name) = queue.pop_front() {
        if !seen.insert(name.clone()) {
            continue;
        }
        let Some(path) = recipes.get(&name) else {
            // Named as a dependency but absent from the store
            graph.add_package(&name, &[]);
            continue;
        };
        let recipe = store.load(path)?;
        for dep in &recipe.depends {
            queue.push_back(dep.clone());
        }
        graph.add_package(&recipe.name, &recipe.depends);
    }

    Ok(graph)
}
