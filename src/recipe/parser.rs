// src/recipe/parser.rs

//! Line-oriented parser for the recipe mini-format.
//!
//! Each non-comment line is `key = value`, where value is either a quoted
//! string or a bracketed array of quoted strings. The parser is permissive:
//! unknown keys are ignored and a malformed value leaves the field empty,
//! so one broken line never takes down the whole recipe tree.
//!
//! Dispatch is on the exact key token left of `=`. The original
//! implementation prefix-matched keys, which made `make` swallow any future
//! `make_*` key; exact tokenisation avoids that class of bug.

use super::Recipe;
use std::path::Path;

/// Parse recipe content. Never fails; missing or malformed fields stay at
/// their defaults and the caller decides whether the result is usable.
pub fn parse_recipe(content: &str, path: &Path) -> Recipe {
    let mut recipe = Recipe {
        path: path.to_path_buf(),
        ..Default::default()
    };

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();

        match key {
            "name" => recipe.name = unquote(value),
            "version" => recipe.version = unquote(value),
            "git" => {
                let url = unquote(value);
                if !url.is_empty() {
                    recipe.git = Some(url);
                }
            }
            "sha256" => {
                let digest = unquote(value);
                if !digest.is_empty() {
                    recipe.sha256 = Some(digest);
                }
            }
            "sources" => recipe.sources = parse_array(value),
            "patches" => recipe.patches = parse_array(value),
            "depends" => recipe.depends = parse_array(value),
            "configure" => recipe.configure = parse_array(value),
            "make" => recipe.make = parse_array(value),
            "install" => recipe.install = parse_array(value),
            "tests" => recipe.tests = parse_array(value),
            "bin_only" => recipe.bin_only = matches!(unquote(value).as_str(), "true" | "True"),
            _ => {}
        }
    }

    recipe
}

/// Strip one layer of surrounding double quotes, if present.
fn unquote(value: &str) -> String {
    let value = value.trim();
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
        .to_string()
}

/// Parse `["a", "b", ...]` into its quoted elements.
///
/// A line without a well-formed bracket pair yields an empty vector; quoted
/// elements are collected even if the separators between them are sloppy.
fn parse_array(value: &str) -> Vec<String> {
    let Some(open) = value.find('[') else {
        return Vec::new();
    };
    let Some(close) = value.rfind(']') else {
        return Vec::new();
    };
    if close <= open {
        return Vec::new();
    }

    let mut items = Vec::new();
    let mut current = String::new();
    let mut in_string = false;

    for c in value[open + 1..close].chars() {
        if c == '"' {
            if in_string {
                items.push(std::mem::take(&mut current));
            }
            in_string = !in_string;
        } else if in_string {
            current.push(c);
        }
    }

    items
}
