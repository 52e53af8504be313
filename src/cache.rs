use super::*;
use std::sync::Arc;

/// Per-session memo of source text and parsed sidecars.
///
/// Owned by one [`Session`]; never shared between sessions or kept across runs.
#[derive(Debug, Default)]
pub struct ContentCache {
    sources: HashMap<PathBuf, Arc<str>>,
    unreadable: HashSet<PathBuf>,
    sidecars: HashMap<PathBuf, SidecarDocument>,
    sidecar_failures: usize,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text of `path`, read once per session. Invalid UTF-8 is replaced, not rejected.
    /// Unreadable files return `None` and are counted once.
    pub fn source(&mut self, path: &Path) -> Option<Arc<str>> {
        if let Some(text) = self.sources.get(path) {
            return Some(Arc::clone(text));
        }
        if self.unreadable.contains(path) {
            return None;
        }

        match fs::read(path) {
            Ok(bytes) => {
                let text: Arc<str> = Arc::from(String::from_utf8_lossy(&bytes).into_owned());
                self.sources.insert(path.to_path_buf(), Arc::clone(&text));
                Some(text)
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read source file");
                self.unreadable.insert(path.to_path_buf());
                None
            }
        }
    }

    /// Sidecar for `source`, falling back to an empty document when absent or malformed.
    pub fn sidecar(&mut self, store: &SidecarStore, source: &Path) -> &SidecarDocument {
        let key = store.document_path(source);
        let failures = &mut self.sidecar_failures;
        self.sidecars.entry(key).or_insert_with(|| {
            let (doc, fell_back) = store.load(source);
            if fell_back {
                *failures += 1;
            }
            doc
        })
    }

    pub fn remember_sidecar(&mut self, store: &SidecarStore, source: &Path, doc: SidecarDocument) {
        self.sidecars.insert(store.document_path(source), doc);
    }

    pub fn cached_sources(&self) -> usize {
        self.sources.len()
    }

    pub fn unreadable_sources(&self) -> usize {
        self.unreadable.len()
    }

    pub fn sidecar_failures(&self) -> usize {
        self.sidecar_failures
    }
}
