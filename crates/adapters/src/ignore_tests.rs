// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::collect_ignores;

fn setup(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (path, content) in files {
        let full = dir.path().join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, content).unwrap();
    }
    dir
}

#[test]
fn denylist_is_always_present() {
    let dir = setup(&[]);
    let ignores = collect_ignores(dir.path());
    assert!(ignores.contains(&"node_modules".to_string()));
    assert!(ignores.contains(&"target".to_string()));
    assert!(ignores.contains(&"__pycache__".to_string()));
}

#[test]
fn root_gitignore_patterns_pass_through() {
    let dir = setup(&[(".gitignore", "*.log\n# comment\n\n.env\n")]);
    let ignores = collect_ignores(dir.path());
    assert!(ignores.contains(&"*.log".to_string()));
    assert!(ignores.contains(&".env".to_string()));
    assert!(!ignores.iter().any(|p| p.contains("comment")));
}

#[test]
fn nested_gitignore_patterns_are_prefix_qualified() {
    let dir = setup(&[
        ("web/app/.gitignore", "coverage\n/generated\n!keep.txt\n"),
        ("web/app/src/main.js", ""),
    ]);
    let ignores = collect_ignores(dir.path());
    assert!(ignores.contains(&"web/app/coverage".to_string()));
    assert!(ignores.contains(&"web/app/generated".to_string()));
    assert!(ignores.contains(&"!web/app/keep.txt".to_string()));
}

#[test]
fn git_directory_is_never_ignored() {
    // Even a gitignore that lists .git must not put it in the set, and the
    // explicit non-ignore always comes out.
    let dir = setup(&[(".gitignore", ".git\n/.git/\nsub/.git\n")]);
    let ignores = collect_ignores(dir.path());
    assert!(!ignores.contains(&".git".to_string()));
    assert!(!ignores.contains(&"/.git/".to_string()));
    assert_eq!(ignores.last(), Some(&"!.git".to_string()));
    // Qualified forms that still name .git are dropped too.
    assert!(!ignores.iter().any(|p| !p.starts_with('!') && p.ends_with(".git")));
}

#[test]
fn gitignores_inside_denylisted_directories_are_skipped() {
    let dir = setup(&[("node_modules/pkg/.gitignore", "lib\n")]);
    let ignores = collect_ignores(dir.path());
    assert!(!ignores.iter().any(|p| p.contains("pkg")));
}

#[test]
fn duplicate_patterns_collapse() {
    let dir = setup(&[(".gitignore", "*.log\n*.log\ntarget\n")]);
    let ignores = collect_ignores(dir.path());
    assert_eq!(ignores.iter().filter(|p| *p == "*.log").count(), 1);
    assert_eq!(ignores.iter().filter(|p| *p == "target").count(), 1);
}
