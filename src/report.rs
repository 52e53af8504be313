//! Read-only views over sidecar data. Everything here is a pure function of its inputs.

use super::*;
use crate::usages::group_by_file;

/// Case-insensitive substring match on function names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    needle: String,
}

impl SearchFilter {
    pub fn new(query: &str) -> Self {
        Self {
            needle: query.trim().to_lowercase(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    pub fn query(&self) -> &str {
        &self.needle
    }

    pub fn matches(&self, name: &str) -> bool {
        self.needle.is_empty() || name.to_lowercase().contains(&self.needle)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeView {
    pub folders: Vec<TreeFolder>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeFolder {
    pub folder: String,
    pub files: Vec<TreeFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeFile {
    pub path: String,
    pub name: String,
    pub function_count: usize,
    pub functions: Vec<TreeFunction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeFunction {
    pub name: String,
    pub description: String,
    pub usage_count: usize,
    pub usages: Vec<Usage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionIndexView {
    pub total: usize,
    pub entries: Vec<FunctionEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionEntry {
    pub name: String,
    pub sources: Vec<String>,
    /// Taken from the first declaring source only.
    pub description: String,
    pub usage_count: usize,
    pub usages_by_file: Vec<FileUsages>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileUsages {
    pub file: String,
    pub lines: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportExportView {
    pub folders: Vec<ImportExportFolder>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportExportFolder {
    pub folder: String,
    pub files: Vec<ImportExportFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportExportFile {
    pub path: String,
    pub name: String,
    pub import_count: usize,
    pub export_count: usize,
    pub imports: Vec<String>,
    pub exports: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathCheckView {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub entries: Vec<PathCheck>,
    pub failures: Vec<SidecarFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub tree: TreeView,
    pub functions: FunctionIndexView,
    pub imports_exports: ImportExportView,
    pub path_check: PathCheckView,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SelectedView<'a> {
    Tree(&'a TreeView),
    Functions(&'a FunctionIndexView),
    Imports(&'a ImportExportView),
    Paths(&'a PathCheckView),
    All(&'a Dashboard),
}

impl Dashboard {
    pub fn select(&self, view: View) -> SelectedView<'_> {
        match view {
            View::Tree => SelectedView::Tree(&self.tree),
            View::Functions => SelectedView::Functions(&self.functions),
            View::Imports => SelectedView::Imports(&self.imports_exports),
            View::Paths => SelectedView::Paths(&self.path_check),
            View::All => SelectedView::All(self),
        }
    }
}

/// `live` maps each walked source file to its sidecar (empty when none exists).
pub fn build_dashboard(
    live: &BTreeMap<String, SidecarDocument>,
    reconciliation: &Reconciliation,
    filter: &SearchFilter,
) -> Dashboard {
    Dashboard {
        tree: tree_view(live),
        functions: function_index_view(&reconciliation.index, &reconciliation.documents, filter),
        imports_exports: import_export_view(live),
        path_check: path_check_view(reconciliation),
    }
}

pub fn tree_view(docs: &BTreeMap<String, SidecarDocument>) -> TreeView {
    let folders = group_by_folder(docs)
        .into_iter()
        .map(|(folder, files)| TreeFolder {
            folder,
            files: files
                .into_iter()
                .map(|(path, doc)| TreeFile {
                    name: file_name(path),
                    path: path.to_string(),
                    function_count: doc.functions.len(),
                    functions: doc
                        .functions
                        .iter()
                        .map(|(name, record)| TreeFunction {
                            name: name.clone(),
                            description: record.description.clone(),
                            usage_count: record.usages.len(),
                            usages: record.usages.clone(),
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();

    TreeView { folders }
}

pub fn function_index_view(
    index: &FunctionIndex,
    documents: &BTreeMap<String, SidecarDocument>,
    filter: &SearchFilter,
) -> FunctionIndexView {
    let entries: Vec<FunctionEntry> = index
        .functions
        .iter()
        .filter(|(name, _)| filter.matches(name))
        .map(|(name, function)| {
            let description = function
                .sources
                .first()
                .and_then(|source| documents.get(source))
                .and_then(|doc| doc.functions.get(name))
                .map(|record| record.description.clone())
                .unwrap_or_default();

            FunctionEntry {
                name: name.clone(),
                sources: function.sources.clone(),
                description,
                usage_count: function.usages.len(),
                usages_by_file: group_by_file(&function.usages)
                    .into_iter()
                    .map(|(file, lines)| FileUsages { file, lines })
                    .collect(),
            }
        })
        .collect();

    FunctionIndexView {
        total: entries.len(),
        entries,
    }
}

pub fn import_export_view(docs: &BTreeMap<String, SidecarDocument>) -> ImportExportView {
    let folders = group_by_folder(docs)
        .into_iter()
        .map(|(folder, files)| ImportExportFolder {
            folder,
            files: files
                .into_iter()
                .map(|(path, doc)| {
                    let mut imports = doc.imports.clone();
                    imports.sort();
                    let mut exports = doc.exports.clone();
                    exports.sort();
                    ImportExportFile {
                        name: file_name(path),
                        path: path.to_string(),
                        import_count: imports.len(),
                        export_count: exports.len(),
                        imports,
                        exports,
                    }
                })
                .collect(),
        })
        .collect();

    ImportExportView { folders }
}

pub fn path_check_view(reconciliation: &Reconciliation) -> PathCheckView {
    let valid = reconciliation
        .checks
        .iter()
        .filter(|c| c.source_exists)
        .count();
    PathCheckView {
        total: reconciliation.checks.len(),
        valid,
        invalid: reconciliation.checks.len() - valid,
        entries: reconciliation.checks.clone(),
        failures: reconciliation.failures.clone(),
    }
}

fn group_by_folder(
    docs: &BTreeMap<String, SidecarDocument>,
) -> BTreeMap<String, Vec<(&str, &SidecarDocument)>> {
    let mut grouped: BTreeMap<String, Vec<(&str, &SidecarDocument)>> = BTreeMap::new();
    for (path, doc) in docs {
        grouped
            .entry(folder_of(path))
            .or_default()
            .push((path.as_str(), doc));
    }
    grouped
}

fn folder_of(path: &str) -> String {
    match path.rsplit_once('/') {
        Some((dir, _)) if !dir.is_empty() => dir.to_string(),
        _ => ".".to_string(),
    }
}

fn file_name(path: &str) -> String {
    path.rsplit_once('/')
        .map(|(_, name)| name)
        .unwrap_or(path)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(functions: Vec<(&str, &str, Vec<(&str, usize)>)>) -> SidecarDocument {
        let mut doc = SidecarDocument::default();
        for (name, description, usages) in functions {
            doc.functions.insert(
                name.to_string(),
                FunctionRecord {
                    description: description.to_string(),
                    usages: usages.into_iter().map(|(f, l)| Usage::new(f, l)).collect(),
                },
            );
        }
        doc
    }

    fn docs(entries: Vec<(&str, SidecarDocument)>) -> BTreeMap<String, SidecarDocument> {
        entries
            .into_iter()
            .map(|(path, doc)| (path.to_string(), doc))
            .collect()
    }

    #[test]
    fn search_filter_is_case_insensitive_substring() {
        let filter = SearchFilter::new("Fetch");
        assert!(filter.matches("prefetchData"));
        assert!(filter.matches("FETCH"));
        assert!(!filter.matches("load"));
        assert!(SearchFilter::new("  ").matches("anything"));
    }

    #[test]
    fn tree_view_groups_by_folder() {
        let live = docs(vec![
            ("lib/b.ts", doc(vec![("zeta", "", vec![]), ("alpha", "Alpha!", vec![("x.ts", 3), ("x.ts", 3)])])),
            ("app/page.tsx", doc(vec![])),
            ("root.js", doc(vec![])),
        ]);

        let view = tree_view(&live);
        let folders: Vec<&str> = view.folders.iter().map(|f| f.folder.as_str()).collect();
        assert_eq!(folders, vec![".", "app", "lib"]);

        let lib = &view.folders[2].files[0];
        assert_eq!(lib.name, "b.ts");
        assert_eq!(lib.function_count, 2);
        assert_eq!(lib.functions[0].name, "alpha");
        assert_eq!(lib.functions[0].description, "Alpha!");
        assert_eq!(lib.functions[0].usage_count, 2);
        assert_eq!(view.folders[0].files[0].function_count, 0);
    }

    #[test]
    fn function_index_is_sorted_case_sensitively() {
        let documents = docs(vec![(
            "a.js",
            doc(vec![("beta", "", vec![]), ("Alpha", "", vec![]), ("alpha", "", vec![])]),
        )]);
        let index = FunctionIndex::from_documents(documents.iter().map(|(k, v)| (k.as_str(), v)));

        let view = function_index_view(&index, &documents, &SearchFilter::default());
        let names: Vec<&str> = view.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "alpha", "beta"]);
        assert_eq!(view.total, 3);
    }

    #[test]
    fn function_index_uses_first_source_description_and_groups_usages() {
        let documents = docs(vec![
            ("a.js", doc(vec![("foo", "", vec![("z.js", 9), ("m.js", 4)])])),
            ("b.js", doc(vec![("foo", "from b", vec![("m.js", 1)])])),
        ]);
        let index = FunctionIndex::from_documents(documents.iter().map(|(k, v)| (k.as_str(), v)));

        let view = function_index_view(&index, &documents, &SearchFilter::new("FOO"));
        let foo = &view.entries[0];

        assert_eq!(foo.sources, vec!["a.js", "b.js"]);
        assert_eq!(foo.description, "");
        assert_eq!(foo.usage_count, 3);
        assert_eq!(
            foo.usages_by_file,
            vec![
                FileUsages {
                    file: "m.js".into(),
                    lines: vec![1, 4]
                },
                FileUsages {
                    file: "z.js".into(),
                    lines: vec![9]
                },
            ]
        );
    }

    #[test]
    fn filter_excludes_non_matching_functions() {
        let documents = docs(vec![("a.js", doc(vec![("foo", "", vec![]), ("bar", "", vec![])]))]);
        let index = FunctionIndex::from_documents(documents.iter().map(|(k, v)| (k.as_str(), v)));

        let view = function_index_view(&index, &documents, &SearchFilter::new("ba"));
        assert_eq!(view.total, 1);
        assert_eq!(view.entries[0].name, "bar");
    }

    #[test]
    fn import_export_view_sorts_lists() {
        let mut page = SidecarDocument::default();
        page.imports = vec!["react".into(), "./b".into(), "next/link".into()];
        page.exports = vec!["export default".into(), "Page".into()];
        let live = docs(vec![("app/page.tsx", page)]);

        let view = import_export_view(&live);
        let file = &view.folders[0].files[0];
        assert_eq!(file.imports, vec!["./b", "next/link", "react"]);
        assert_eq!(file.exports, vec!["Page", "export default"]);
        assert_eq!((file.import_count, file.export_count), (3, 2));
    }

    #[test]
    fn path_check_counts_valid_and_invalid() {
        let reconciliation = Reconciliation {
            checks: vec![
                PathCheck {
                    json_path: "function_data/a.js.json".into(),
                    source_path: "a.js".into(),
                    source_exists: true,
                    functions: vec![],
                },
                PathCheck {
                    json_path: "function_data/old/module.ts.json".into(),
                    source_path: "old/module.ts".into(),
                    source_exists: false,
                    functions: vec!["gone".into()],
                },
            ],
            ..Default::default()
        };

        let view = path_check_view(&reconciliation);
        assert_eq!((view.total, view.valid, view.invalid), (2, 1, 1));
    }
}
