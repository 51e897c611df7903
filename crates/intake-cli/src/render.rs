use std::collections::BTreeMap;

use colored::*;
use indicatif::HumanBytes;
use intake_core::scanner::reason_counts;
use intake_core::{
    DirectoryNode, ExclusionDecision, Manifest, RuleSet, ScanForest, UnsupportedPattern,
};

pub fn print_forest(forest: &ScanForest) {
    for root in &forest.roots {
        let kind = if root.is_file_root { "File" } else { "Folder" };
        println!(
            "{} {}  {}",
            format!("Root {}:", kind).bold(),
            root.name.bold(),
            summary(root.file_count, root.total_size).green()
        );
        if root.is_file_root {
            continue;
        }
        print_node_contents(root, 1);
    }
    println!(
        "{} {}",
        "Total:".bold(),
        summary(forest.total_files(), forest.total_size()).green()
    );
    if let Some(largest) = forest.largest_file() {
        println!(
            "{} {} ({})",
            "Largest:".bold(),
            largest.path,
            HumanBytes(largest.size)
        );
    }
}

fn print_node_contents(node: &DirectoryNode, indent: usize) {
    let pad = "  ".repeat(indent);
    for file in &node.files {
        println!("{}{}  {}", pad, file.name, HumanBytes(file.size).to_string().dimmed());
    }
    for child in &node.children {
        println!(
            "{}{}  {}",
            pad,
            format!("{}/", child.name).cyan(),
            summary(child.file_count, child.total_size).dimmed()
        );
        print_node_contents(child, indent + 1);
    }
}

fn summary(files: usize, size: u64) -> String {
    format!("{} files ({})", files, HumanBytes(size))
}

pub fn print_exclusions(excluded: &[ExclusionDecision]) {
    if excluded.is_empty() {
        println!("{}", "Nothing excluded".dimmed());
        return;
    }

    let counts = reason_counts(excluded);
    let mut grouped: BTreeMap<&str, Vec<&ExclusionDecision>> = BTreeMap::new();
    for decision in excluded {
        if let Some(label) = decision.reason_label() {
            grouped.entry(label).or_default().push(decision);
        }
    }

    println!("{} {}", "Excluded:".bold(), excluded.len().to_string().red());
    for (label, decisions) in grouped {
        println!("  {} ({})", label.yellow(), counts.get(label).copied().unwrap_or(0));
        for decision in decisions {
            let detail = decision
                .reason
                .as_ref()
                .map(|r| r.detail())
                .unwrap_or_default();
            println!(
                "    {} {}  {}",
                decision.kind.to_string().dimmed(),
                decision.path,
                detail.dimmed()
            );
        }
    }
}

pub fn print_unsupported(patterns: &[UnsupportedPattern]) {
    if patterns.is_empty() {
        return;
    }
    println!("{}", "Unsupported ignore patterns:".bold());
    for pattern in patterns {
        println!(
            "  line {}: {}  {}",
            pattern.line,
            pattern.pattern.yellow(),
            pattern.reason.to_string().dimmed()
        );
    }
}

pub fn print_rules(rules: &RuleSet) {
    println!("{} {}", "Active rules:".bold(), rules.rules().len());
    for rule in rules.rules() {
        let mut flags = Vec::new();
        if rule.anchored {
            flags.push("anchored");
        }
        if rule.directory {
            flags.push("directory");
        }
        println!(
            "  line {}: {}  {}  {}",
            rule.line,
            rule.pattern.green(),
            rule.regex().as_str().dimmed(),
            flags.join(",").dimmed()
        );
    }
    print_unsupported(rules.unsupported());
}

pub fn print_manifest(manifest: &Manifest) {
    for file in &manifest.files {
        println!("{}  {}", file.path, HumanBytes(file.size).to_string().dimmed());
    }
    let summary = &manifest.summary;
    println!(
        "{} {}",
        "Manifest:".bold(),
        format!("{} files ({})", summary.total_files, HumanBytes(summary.total_size)).green()
    );
    if let Some(largest) = &summary.largest_file {
        println!(
            "{} {} ({})",
            "Largest:".bold(),
            largest.path,
            HumanBytes(largest.size)
        );
    }
}
