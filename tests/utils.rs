#![allow(dead_code)]

use clap::Parser;
use log::debug;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use stencil::cli::{run, Cli};
use walkdir::WalkDir;

/// Writes `files` (relative key, content) below `root`, creating directories.
pub fn write_tree(root: &Path, files: &[(&str, &[u8])]) {
    for (key, content) in files {
        let path = root.join(key);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}

/// Creates an empty directory called `name` inside `parent`.
pub fn make_dir(parent: &Path, name: &str) -> PathBuf {
    let path = parent.join(name);
    fs::create_dir_all(&path).unwrap();
    path
}

fn relative_files(dir: &Path) -> BTreeSet<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().is_file())
        .map(|e| e.path().strip_prefix(dir).unwrap().to_path_buf())
        .collect()
}

/// Prints a diff of files and their contents between two directories.
pub fn print_dir_diff(actual: &Path, expected: &Path) {
    let files1 = relative_files(actual);
    let files2 = relative_files(expected);

    println!("\n=== Directory Comparison ===");
    println!("Actual output:   {actual:?}");
    println!("Expected output: {expected:?}");

    for file in files1.difference(&files2) {
        println!("  + {file:?}");
    }
    for file in files2.difference(&files1) {
        println!("  - {file:?}");
    }
    for file in files1.intersection(&files2) {
        let content1 = fs::read(actual.join(file)).unwrap();
        let content2 = fs::read(expected.join(file)).unwrap();
        if content1 != content2 {
            println!("\n  File: {file:?}");
            println!("  --- Actual content:\n{}", String::from_utf8_lossy(&content1));
            println!("  --- Expected content:\n{}", String::from_utf8_lossy(&content2));
        }
    }
    println!("=== End of Comparison ===\n");
}

/// Asserts that two directory trees hold the same files with the same bytes.
pub fn assert_same_tree(actual: &Path, expected: &Path) {
    let different = dir_diff::is_different(actual, expected).unwrap_or_else(|e| {
        debug!("Error comparing directories: {e:?}");
        true
    });
    if different {
        print_dir_diff(actual, expected);
        panic!("Directories differ. See above for details.");
    }
}

/// Runs the stencil CLI with `argv` against the config directory `config_dir`.
pub fn run_cli(config_dir: &Path, argv: &[&str]) -> stencil::error::Result<()> {
    let config_dir = config_dir.display().to_string();
    let mut full = vec!["stencil", "--config-dir", config_dir.as_str()];
    full.extend(argv);
    run(Cli::parse_from(full))
}
