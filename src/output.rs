use super::*;
use crate::report::{FunctionIndexView, ImportExportView, PathCheckView, TreeView};

pub(crate) fn relative_display(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
        .replace('\\', "/")
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn print_scan_report(result: &ScanResult) {
    println!("Summary:");
    println!("  - Source files: {}", result.files.len());
    println!("  - Distinct functions: {}", result.function_sources.len());
    println!("  - Files with sidecar: {}", result.files_with_sidecar);
    println!("  - Skipped: {}", result.skipped);

    println!("\nFunctions ({}):", result.function_sources.len());
    for (name, sources) in &result.function_sources {
        let unique: BTreeSet<&str> = sources.iter().map(String::as_str).collect();
        println!("  - {name}");
        for source in unique {
            println!("      - {source}");
        }
    }
}

pub(crate) fn print_usages(identifier: &str, usages: &[Usage]) {
    println!("Usages of {identifier} ({}):", usages.len());
    for usage in usages {
        println!("  - {}:{}", usage.file, usage.line);
    }
}

pub(crate) fn print_update_summary(summary: &UpdateSummary) {
    for line in update_summary_lines(summary) {
        println!("{line}");
    }
}

pub(crate) fn update_summary_lines(summary: &UpdateSummary) -> Vec<String> {
    let mut out = vec![
        "Update:".to_string(),
        format!("  - Files scanned: {}", summary.files_scanned),
        format!("  - Sidecars written: {}", summary.files_written),
        format!("  - Functions recorded: {}", summary.functions),
        format!("  - Usages recorded: {}", summary.usages),
        format!("  - Skipped: {}", summary.skipped),
        format!("  - Malformed sidecars replaced: {}", summary.malformed_sidecars),
    ];

    if !summary.failures.is_empty() {
        out.push(String::new());
        out.push(format!("Failures ({}):", summary.failures.len()));
        for failure in &summary.failures {
            out.push(format!("  - {failure}"));
        }
    }
    out
}

pub(crate) fn print_dashboard(dashboard: &Dashboard, view: View) {
    let sections: Vec<Vec<String>> = match view {
        View::Tree => vec![tree_lines(&dashboard.tree)],
        View::Functions => vec![function_lines(&dashboard.functions)],
        View::Imports => vec![import_export_lines(&dashboard.imports_exports)],
        View::Paths => vec![path_check_lines(&dashboard.path_check)],
        View::All => vec![
            tree_lines(&dashboard.tree),
            function_lines(&dashboard.functions),
            import_export_lines(&dashboard.imports_exports),
            path_check_lines(&dashboard.path_check),
        ],
    };

    for (idx, lines) in sections.iter().enumerate() {
        if idx > 0 {
            println!();
        }
        for line in lines {
            println!("{line}");
        }
    }
}

pub(crate) fn print_check_report(view: &PathCheckView) {
    for line in path_check_lines(view) {
        println!("{line}");
    }
}

pub(crate) fn tree_lines(view: &TreeView) -> Vec<String> {
    let mut out = vec!["Project structure:".to_string()];
    if view.folders.is_empty() {
        out.push("  (no source files)".to_string());
    }

    for folder in &view.folders {
        out.push(format!("  {}/", folder.folder));
        for file in &folder.files {
            out.push(format!(
                "    {} ({} functions)",
                file.name, file.function_count
            ));
            for function in &file.functions {
                out.push(format!(
                    "      - {} ({} usages)",
                    function.name, function.usage_count
                ));
                if !function.description.is_empty() {
                    out.push(format!("          {}", function.description));
                }
                for usage in &function.usages {
                    out.push(format!("          {}:{}", usage.file, usage.line));
                }
            }
        }
    }
    out
}

pub(crate) fn function_lines(view: &FunctionIndexView) -> Vec<String> {
    let mut out = vec![format!("Functions ({}):", view.total)];
    if view.entries.is_empty() {
        out.push("  (no functions match)".to_string());
    }

    for entry in &view.entries {
        out.push(format!("  {}", entry.name));
        out.push("    Defined in:".to_string());
        for source in &entry.sources {
            out.push(format!("      - {source}"));
        }
        if !entry.description.is_empty() {
            out.push(format!("    Description: {}", entry.description));
        }
        if entry.usages_by_file.is_empty() {
            out.push("    Used in: no usages found".to_string());
            continue;
        }
        out.push(format!("    Used in ({} places):", entry.usage_count));
        for group in &entry.usages_by_file {
            let lines: Vec<String> = group.lines.iter().map(|l| l.to_string()).collect();
            out.push(format!("      - {}: {}", group.file, lines.join(", ")));
        }
    }
    out
}

pub(crate) fn import_export_lines(view: &ImportExportView) -> Vec<String> {
    let mut out = vec!["Imports & exports:".to_string()];
    for folder in &view.folders {
        out.push(format!("  {}/", folder.folder));
        for file in &folder.files {
            out.push(format!(
                "    {} (imports {} | exports {})",
                file.name, file.import_count, file.export_count
            ));
            for import in &file.imports {
                out.push(format!("      < {import}"));
            }
            for export in &file.exports {
                out.push(format!("      > {export}"));
            }
        }
    }
    out
}

pub(crate) fn path_check_lines(view: &PathCheckView) -> Vec<String> {
    let mut out = vec![
        format!("Path check ({} sidecars):", view.total),
        format!("  - Valid source paths: {}", view.valid),
        format!("  - Invalid source paths: {}", view.invalid),
    ];

    for entry in &view.entries {
        if entry.source_exists {
            out.push(format!("  ok      {} -> {}", entry.json_path, entry.source_path));
        } else {
            out.push(format!(
                "  missing {} -> {} (source not found)",
                entry.json_path, entry.source_path
            ));
        }
    }

    if !view.failures.is_empty() {
        out.push(format!("  Unreadable sidecars ({}):", view.failures.len()));
        for failure in &view.failures {
            out.push(format!("    - {}: {}", failure.json_path, failure.error));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{FileUsages, FunctionEntry};

    #[test]
    fn relative_display_strips_root() {
        assert_eq!(
            relative_display(Path::new("/work"), Path::new("/work/app/a.js")),
            "app/a.js"
        );
        assert_eq!(
            relative_display(Path::new("/work"), Path::new("/other/a.js")),
            "/other/a.js"
        );
    }

    #[test]
    fn function_lines_list_usages_per_file() {
        let view = FunctionIndexView {
            total: 1,
            entries: vec![FunctionEntry {
                name: "foo".into(),
                sources: vec!["app/a.js".into()],
                description: "Does foo".into(),
                usage_count: 3,
                usages_by_file: vec![FileUsages {
                    file: "app/b.js".into(),
                    lines: vec![3, 3, 7],
                }],
            }],
        };

        let lines = function_lines(&view);
        assert!(lines.contains(&"    Description: Does foo".to_string()));
        assert!(lines.contains(&"      - app/b.js: 3, 3, 7".to_string()));
    }

    #[test]
    fn update_summary_reports_malformed_sidecars() {
        let summary = UpdateSummary {
            files_scanned: 2,
            files_written: 2,
            malformed_sidecars: 1,
            ..Default::default()
        };

        let lines = update_summary_lines(&summary);
        assert!(lines.contains(&"  - Malformed sidecars replaced: 1".to_string()));
        assert!(!lines.iter().any(|l| l.starts_with("Failures")));
    }

    #[test]
    fn path_check_lines_mark_missing_sources() {
        let view = PathCheckView {
            total: 1,
            valid: 0,
            invalid: 1,
            entries: vec![PathCheck {
                json_path: "function_data/old/module.ts.json".into(),
                source_path: "old/module.ts".into(),
                source_exists: false,
                functions: vec![],
            }],
            failures: vec![],
        };

        let lines = path_check_lines(&view);
        assert_eq!(lines[2], "  - Invalid source paths: 1");
        assert!(lines[3].contains("(source not found)"));
    }
}
