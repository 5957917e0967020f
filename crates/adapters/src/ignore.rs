// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ignore-pattern derivation for sync sessions.
//!
//! The engine receives the union of every `.gitignore` found under the
//! local root (nested files have their patterns prefix-qualified) and a
//! hardcoded denylist of build/cache directories. The version-control
//! metadata directory is explicitly un-ignored so the engine can replicate
//! it even when a `.gitignore` lists it.

use std::collections::HashSet;
use std::path::Path;

/// Build/cache directories excluded regardless of gitignore contents.
const DENYLIST: [&str; 7] =
    ["node_modules", "target", "dist", "build", ".cache", ".venv", "__pycache__"];

/// Directories never descended into while collecting `.gitignore` files.
const NO_DESCEND: [&str; 3] = [".git", "node_modules", "target"];

/// Collect the ignore set for a sync rooted at `local`.
pub fn collect_ignores(local: &Path) -> Vec<String> {
    let mut patterns: Vec<String> = DENYLIST.iter().map(|d| d.to_string()).collect();
    let mut seen: HashSet<String> = patterns.iter().cloned().collect();

    let mut stack = vec![local.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let gitignore = dir.join(".gitignore");
        if let Ok(content) = std::fs::read_to_string(&gitignore) {
            let prefix = dir
                .strip_prefix(local)
                .ok()
                .filter(|rel| !rel.as_os_str().is_empty())
                .map(|rel| rel.to_string_lossy().into_owned());
            for pattern in parse_gitignore(&content, prefix.as_deref()) {
                if seen.insert(pattern.clone()) {
                    patterns.push(pattern);
                }
            }
        }

        let Ok(entries) = std::fs::read_dir(&dir) else { continue };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if NO_DESCEND.iter().any(|skip| *skip == name) {
                continue;
            }
            stack.push(path);
        }
    }

    // The engine must always observe VCS metadata.
    patterns.push("!.git".to_string());
    patterns
}

/// Parse one `.gitignore`, qualifying patterns with the directory the file
/// was found in. Patterns that would ignore the `.git` directory itself
/// are dropped.
fn parse_gitignore(content: &str, prefix: Option<&str>) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| !ignores_git_metadata(line))
        .map(|line| qualify(line, prefix))
        .collect()
}

fn ignores_git_metadata(pattern: &str) -> bool {
    let bare = pattern.trim_start_matches('!').trim_start_matches('/').trim_end_matches('/');
    bare == ".git" || bare.ends_with("/.git")
}

fn qualify(pattern: &str, prefix: Option<&str>) -> String {
    let Some(prefix) = prefix else { return pattern.to_string() };
    let (negated, body) = match pattern.strip_prefix('!') {
        Some(rest) => ("!", rest),
        None => ("", pattern),
    };
    let body = body.strip_prefix('/').unwrap_or(body);
    format!("{negated}{prefix}/{body}")
}

#[cfg(test)]
#[path = "ignore_tests.rs"]
mod tests;
