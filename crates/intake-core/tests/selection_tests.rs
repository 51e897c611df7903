use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tempfile::tempdir;

use intake_core::scanner::write_csv;
use intake_core::{
    AppConfig, Error, IntakeEngine, SelectionAggregator, SelectionSet, SilentReporter,
};

fn write_file(path: &Path, size: usize) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, vec![b'x'; size]).unwrap();
}

/// Layout:
///   drop/
///     top.md            (3 bytes)
///     alpha/one.md      (10 bytes)
///     alpha/deep/two.md (20 bytes)
///     beta/three.md     (30 bytes)
///     gamma/skip.bin    (1 byte)   <- nothing admitted, pruned
fn create_drop(root: &Path) {
    write_file(&root.join("top.md"), 3);
    write_file(&root.join("alpha/one.md"), 10);
    write_file(&root.join("alpha/deep/two.md"), 20);
    write_file(&root.join("beta/three.md"), 30);
    write_file(&root.join("gamma/skip.bin"), 1);
}

fn engine() -> IntakeEngine {
    IntakeEngine::new(AppConfig::default().with_extensions(["md"])).unwrap()
}

#[test]
fn test_default_selection_collects_everything() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("drop");
    create_drop(&root);

    let result = engine().scan_paths(&[root], &SilentReporter).unwrap();
    let selectable: Vec<_> = SelectionSet::selectable(&result.forest)
        .iter()
        .map(|d| d.path.as_str())
        .collect();
    assert_eq!(selectable, vec!["drop/alpha", "drop/beta"]);

    let selection = SelectionSet::all(&result.forest);
    let manifest = SelectionAggregator::aggregate(&result.forest, &selection).unwrap();

    let paths: Vec<_> = manifest.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "drop/top.md",
            "drop/alpha/one.md",
            "drop/alpha/deep/two.md",
            "drop/beta/three.md"
        ]
    );
    assert_eq!(manifest.summary.total_files, result.forest.total_files());
    assert_eq!(manifest.summary.total_size, 63);
    assert_eq!(
        manifest.summary.largest_file.as_ref().map(|l| l.path.as_str()),
        Some("drop/beta/three.md")
    );
}

#[test]
fn test_partial_selection() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("drop");
    create_drop(&root);

    let result = engine().scan_paths(&[root], &SilentReporter).unwrap();
    let mut selection = SelectionSet::all(&result.forest);
    selection.remove("drop/alpha");

    let manifest = SelectionAggregator::aggregate(&result.forest, &selection).unwrap();
    let paths: Vec<_> = manifest.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["drop/top.md", "drop/beta/three.md"]);
}

#[test]
fn test_overlapping_roots_are_deduplicated() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("drop");
    create_drop(&root);

    let result = engine()
        .scan_paths(&[root.clone(), root], &SilentReporter)
        .unwrap();
    assert_eq!(result.forest.roots.len(), 2);

    let selection = SelectionSet::all(&result.forest);
    let manifest = SelectionAggregator::aggregate(&result.forest, &selection).unwrap();

    let unique: HashSet<_> = manifest.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(unique.len(), manifest.files.len());
    assert_eq!(manifest.files.len(), 4);
}

#[test]
fn test_no_root_files_and_nothing_selected() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("drop");
    write_file(&root.join("alpha/one.md"), 1);

    let result = engine().scan_paths(&[root], &SilentReporter).unwrap();
    let selection = SelectionSet::new();
    assert!(!selection.has_content(&result.forest));

    let err = SelectionAggregator::aggregate(&result.forest, &selection).unwrap_err();
    assert!(matches!(err, Error::EmptySelection));
}

#[test]
fn test_exclusion_log_exports_to_csv() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("drop");
    create_drop(&root);

    let result = engine().scan_paths(&[root], &SilentReporter).unwrap();
    let mut out = Vec::new();
    write_csv(&result.excluded, &mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1], "file,drop/gamma/skip.bin,skip.bin,disallowed type,.bin");
}
