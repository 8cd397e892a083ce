use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

/// Resolve a signature selector into concrete file paths.
///
/// - a literal `.yaml` path selects that file if it exists;
/// - a pattern containing `*` walks the pattern's directory (or the
///   signature folder when the pattern has no separator) and filters
///   basenames by the regex derived from the glob tail;
/// - a comma-separated list is the union of its parts.
pub fn select_signs(selector: &str, sign_dir: &Path) -> Vec<PathBuf> {
    let mut selected = Vec::new();
    for part in selector.split(',') {
        for path in single_sign(part.trim(), sign_dir) {
            if !selected.contains(&path) {
                selected.push(path);
            }
        }
    }
    selected
}

fn single_sign(selector: &str, sign_dir: &Path) -> Vec<PathBuf> {
    if selector.is_empty() {
        return Vec::new();
    }

    if selector.ends_with(".yaml") && !selector.contains('*') {
        let path = PathBuf::from(selector);
        return if path.is_file() { vec![path] } else { Vec::new() };
    }

    if selector.contains('*') {
        let (dir, tail) = match selector.rsplit_once('/') {
            Some((dir, tail)) => (PathBuf::from(dir), tail.to_string()),
            None => (sign_dir.to_path_buf(), selector.to_string()),
        };
        let mut files = Vec::new();
        walk_yaml(&dir, &mut files);
        files.sort();

        if tail == "*" {
            return files;
        }
        let filter = match Regex::new(&tail) {
            Ok(re) => re,
            Err(err) => {
                tracing::warn!(selector, error = %err, "selector tail is not a usable pattern");
                return Vec::new();
            }
        };
        return files
            .into_iter()
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .map(|name| filter.is_match(name))
                    .unwrap_or(false)
            })
            .collect();
    }
    Vec::new()
}

/// Drop selected files matching any exclusion, as a pure predicate over the
/// full selection. A file is excluded when its basename contains the
/// pattern as a substring, or matches it as a regex.
pub fn apply_excludes(selected: Vec<PathBuf>, excludes: &[String]) -> Vec<PathBuf> {
    if excludes.is_empty() {
        return selected;
    }
    let regexes: Vec<Option<Regex>> = excludes.iter().map(|x| Regex::new(x).ok()).collect();

    selected
        .into_iter()
        .filter(|path| {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            !excludes.iter().zip(&regexes).any(|(pattern, regex)| {
                name.contains(pattern.as_str())
                    || regex.as_ref().map(|re| re.is_match(name)).unwrap_or(false)
            })
        })
        .collect()
}

fn walk_yaml(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk_yaml(&path, out);
        } else if path.extension().and_then(|e| e.to_str()) == Some("yaml") {
            out.push(path);
        }
    }
}
