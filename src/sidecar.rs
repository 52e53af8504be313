//! JSON sidecar documents mirroring source files under a storage root.
//!
//! `app/page.tsx` is recorded at `<root>/app/page.tsx.json`. Reconciliation walks the
//! storage root and checks each document against the file it mirrors; missing sources
//! are reported, never treated as errors.

use super::*;
use chrono::Local;
use std::path::Component;
use walkdir::WalkDir;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRecord {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub usages: Vec<Usage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidecarDocument {
    #[serde(default)]
    pub functions: BTreeMap<String, FunctionRecord>,
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub exports: Vec<String>,
    #[serde(default = "now_timestamp")]
    pub last_updated: String,
}

impl Default for SidecarDocument {
    fn default() -> Self {
        Self {
            functions: BTreeMap::new(),
            imports: Vec::new(),
            exports: Vec::new(),
            last_updated: now_timestamp(),
        }
    }
}

impl SidecarDocument {
    pub fn function_names(&self) -> Vec<String> {
        self.functions.keys().cloned().collect()
    }

    pub fn touch(&mut self) {
        self.last_updated = now_timestamp();
    }
}

/// Local time, ISO-8601 without offset.
pub fn now_timestamp() -> String {
    Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

/// One reconciliation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathCheck {
    pub json_path: String,
    pub source_path: String,
    pub source_exists: bool,
    pub functions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SidecarFailure {
    pub json_path: String,
    pub error: String,
}

/// A function name across every sidecar that declares it.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct IndexedFunction {
    /// Declaring source paths, first-seen order, no repeats.
    pub sources: Vec<String>,
    /// Every recorded usage from every declaring sidecar, concatenated.
    pub usages: Vec<Usage>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FunctionIndex {
    pub functions: BTreeMap<String, IndexedFunction>,
}

impl FunctionIndex {
    pub fn from_documents<'a, I>(documents: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a SidecarDocument)>,
    {
        let mut index = Self::default();
        for (source, doc) in documents {
            index.insert_document(source, doc);
        }
        index
    }

    pub fn insert_document(&mut self, source: &str, doc: &SidecarDocument) {
        for (name, record) in &doc.functions {
            let slot = self.functions.entry(name.clone()).or_default();
            if !slot.sources.iter().any(|s| s == source) {
                slot.sources.push(source.to_string());
            }
            slot.usages.extend(record.usages.iter().cloned());
        }
    }

    pub fn get(&self, name: &str) -> Option<&IndexedFunction> {
        self.functions.get(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// Everything learned from one pass over the storage root.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub checks: Vec<PathCheck>,
    pub failures: Vec<SidecarFailure>,
    pub index: FunctionIndex,
    /// Parsed documents keyed by derived source path.
    #[serde(skip)]
    pub documents: BTreeMap<String, SidecarDocument>,
}

impl Reconciliation {
    pub fn missing(&self) -> impl Iterator<Item = &PathCheck> {
        self.checks.iter().filter(|c| !c.source_exists)
    }
}

#[derive(Debug, Clone)]
pub struct SidecarStore {
    base: PathBuf,
    root: PathBuf,
}

impl SidecarStore {
    /// `root` is resolved against `base` when relative; source paths are relative to `base`.
    pub fn new(base: impl Into<PathBuf>, root: impl AsRef<Path>) -> Self {
        let base = base.into();
        let root = if root.as_ref().is_absolute() {
            root.as_ref().to_path_buf()
        } else {
            base.join(root)
        };
        Self { base, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn document_path(&self, source: &Path) -> PathBuf {
        let mut path = self.root.join(mirrored_relative(&self.base, source)).into_os_string();
        path.push(SIDECAR_SUFFIX);
        PathBuf::from(path)
    }

    pub fn exists(&self, source: &Path) -> bool {
        self.document_path(source).is_file()
    }

    /// Strict read: `Ok(None)` when no document exists.
    pub fn read(&self, source: &Path) -> Result<Option<SidecarDocument>, SidecarError> {
        let path = self.document_path(source);
        if !path.exists() {
            return Ok(None);
        }
        read_document(&path).map(Some)
    }

    /// Lenient read: absent, unreadable and malformed documents all become an empty one.
    /// The flag is true when an existing document could not be used.
    pub fn load(&self, source: &Path) -> (SidecarDocument, bool) {
        match self.read(source) {
            Ok(Some(doc)) => (doc, false),
            Ok(None) => (SidecarDocument::default(), false),
            Err(err) => {
                error!(path = %err.path().display(), cause = %error_chain(&err), "using empty sidecar");
                (SidecarDocument::default(), true)
            }
        }
    }

    pub fn save(&self, source: &Path, doc: &SidecarDocument) -> Result<PathBuf, SidecarError> {
        let path = self.document_path(source);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| SidecarError::Io {
                path: path.clone(),
                source,
            })?;
        }

        let raw = serde_json::to_string_pretty(doc).map_err(|source| SidecarError::Encode {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, raw).map_err(|source| SidecarError::Io {
            path: path.clone(),
            source,
        })?;

        debug!(path = %path.display(), functions = doc.functions.len(), "sidecar saved");
        Ok(path)
    }

    pub fn reconcile(&self) -> Reconciliation {
        let mut out = Reconciliation::default();
        if !self.root.is_dir() {
            debug!(root = %self.root.display(), "no sidecar directory");
            return out;
        }

        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let json_path = err
                        .path()
                        .map(|p| relative_display(&self.base, p))
                        .unwrap_or_default();
                    warn!(path = %json_path, error = %err, "failed to read sidecar directory entry");
                    out.failures.push(SidecarFailure {
                        json_path,
                        error: err.to_string(),
                    });
                    continue;
                }
            };

            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(source_path) = self.source_path_for(path) else {
                continue;
            };

            let json_path = relative_display(&self.base, path);
            let doc = match read_document(path) {
                Ok(doc) => doc,
                Err(err) => {
                    error!(path = %json_path, cause = %error_chain(&err), "skipping sidecar");
                    out.failures.push(SidecarFailure {
                        json_path,
                        error: error_chain(&err),
                    });
                    continue;
                }
            };

            let source_exists = self.base.join(&source_path).exists();
            if !source_exists {
                info!(sidecar = %json_path, source = %source_path, "sidecar source is missing");
            }

            out.index.insert_document(&source_path, &doc);
            out.checks.push(PathCheck {
                json_path,
                source_path: source_path.clone(),
                source_exists,
                functions: doc.function_names(),
            });
            out.documents.insert(source_path, doc);
        }

        info!(
            documents = out.checks.len(),
            missing = out.missing().count(),
            failures = out.failures.len(),
            "reconciliation finished"
        );
        out
    }

    /// Strips the storage root and the `.json` suffix from a document path.
    fn source_path_for(&self, document: &Path) -> Option<String> {
        let rel = document.strip_prefix(&self.root).ok()?;
        let rel = rel.to_string_lossy().replace('\\', "/");
        rel.strip_suffix(SIDECAR_SUFFIX)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

fn read_document(path: &Path) -> Result<SidecarDocument, SidecarError> {
    let raw = fs::read_to_string(path).map_err(|source| SidecarError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| SidecarError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Keeps only the normal components of `source` relative to `base`, so the mirrored
/// path always stays under the storage root.
fn mirrored_relative(base: &Path, source: &Path) -> PathBuf {
    let rel = source.strip_prefix(base).unwrap_or(source);
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect()
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
