use super::*;
use walkdir::WalkDir;

/// Files found under the scan roots, plus how many roots/entries could not be read.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WalkOutcome {
    pub files: Vec<PathBuf>,
    pub skipped: usize,
}

/// Collects every file under `roots` whose extension is in `extensions`,
/// pruning directories named in `excluded_dirs`.
///
/// Unreadable roots and entries are logged and counted, never fatal. Files reached
/// through overlapping roots are reported once. The result is sorted.
pub fn collect_source_files(
    roots: &[PathBuf],
    extensions: &[String],
    excluded_dirs: &[String],
) -> WalkOutcome {
    let mut files = BTreeSet::new();
    let mut skipped = 0usize;

    for root in roots {
        if !root.is_dir() {
            warn!(root = %root.display(), "scan root is not a directory, skipping");
            skipped += 1;
            continue;
        }

        for entry in WalkDir::new(root)
            .into_iter()
            .filter_entry(|e| !is_excluded_dir(e.path(), excluded_dirs))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "failed to read directory entry");
                    skipped += 1;
                    continue;
                }
            };

            let path = entry.path();
            if !entry.file_type().is_file() || !has_source_extension(path, extensions) {
                continue;
            }

            match fs::canonicalize(path) {
                Ok(canonical) => {
                    files.insert(canonical);
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "failed to resolve source file");
                    skipped += 1;
                }
            }
        }
    }

    debug!(files = files.len(), skipped, "walk finished");

    WalkOutcome {
        files: files.into_iter().collect(),
        skipped,
    }
}

pub(crate) fn has_source_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|allowed| allowed == ext))
        .unwrap_or(false)
}

fn is_excluded_dir(path: &Path, excluded_dirs: &[String]) -> bool {
    if !path.is_dir() {
        return false;
    }

    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| excluded_dirs.iter().any(|excluded| excluded == name))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn defaults() -> (Vec<String>, Vec<String>) {
        (
            DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect(),
        )
    }

    fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    fn names(outcome: &WalkOutcome, root: &Path) -> Vec<String> {
        let root = fs::canonicalize(root).unwrap();
        outcome
            .files
            .iter()
            .map(|p| relative_display(&root, p))
            .collect()
    }

    #[test]
    fn collects_files_with_allowed_extensions() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "app/page.tsx", "export default function Page() {}");
        write(dir.path(), "app/util.js", "function a() {}");
        write(dir.path(), "app/readme.md", "# nope");
        write(dir.path(), "scripts/run.py", "def main(): pass");

        let (exts, excluded) = defaults();
        let outcome = collect_source_files(&[dir.path().to_path_buf()], &exts, &excluded);

        assert_eq!(
            names(&outcome, dir.path()),
            vec!["app/page.tsx", "app/util.js", "scripts/run.py"]
        );
        assert_eq!(outcome.skipped, 0);
    }

    #[test]
    fn prunes_excluded_directories() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/index.ts", "");
        write(dir.path(), "node_modules/pkg/index.js", "");
        write(dir.path(), "src/dist/bundle.js", "");
        write(dir.path(), ".next/server.js", "");

        let (exts, excluded) = defaults();
        let outcome = collect_source_files(&[dir.path().to_path_buf()], &exts, &excluded);

        assert_eq!(names(&outcome, dir.path()), vec!["src/index.ts"]);
    }

    #[test]
    fn excluded_marker_only_matches_whole_directory_names() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "rebuild/step.ts", "");

        let (exts, excluded) = defaults();
        let outcome = collect_source_files(&[dir.path().to_path_buf()], &exts, &excluded);

        assert_eq!(names(&outcome, dir.path()), vec!["rebuild/step.ts"]);
    }

    #[test]
    fn missing_root_is_counted_not_fatal() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "lib/a.ts", "");

        let (exts, excluded) = defaults();
        let roots = vec![dir.path().join("missing"), dir.path().join("lib")];
        let outcome = collect_source_files(&roots, &exts, &excluded);

        assert_eq!(outcome.files.len(), 1);
        assert_eq!(outcome.skipped, 1);
    }

    #[test]
    fn overlapping_roots_report_each_file_once() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "lib/a.ts", "");

        let (exts, excluded) = defaults();
        let roots = vec![dir.path().to_path_buf(), dir.path().join("lib")];
        let outcome = collect_source_files(&roots, &exts, &excluded);

        assert_eq!(outcome.files.len(), 1);
    }
}
