use super::*;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Recorded paths are relative to this directory.
    pub base: PathBuf,
    /// Scan roots, resolved against `base` when relative.
    pub roots: Vec<PathBuf>,
    /// Sidecar storage root, resolved against `base` when relative.
    pub db_dir: PathBuf,
    pub extensions: Vec<String>,
    pub excluded_dirs: Vec<String>,
}

impl SessionConfig {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            roots: DEFAULT_DIRS.iter().map(PathBuf::from).collect(),
            db_dir: PathBuf::from(DEFAULT_DB_DIR),
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            excluded_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_roots<I, P>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.roots = roots.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_db_dir(mut self, db_dir: impl Into<PathBuf>) -> Self {
        self.db_dir = db_dir.into();
        self
    }
}

/// Whether an update keeps previously recorded usages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateMode {
    /// New usages are appended to the recorded ones.
    #[default]
    Append,
    /// Recorded usages and functions no longer declared are dropped; descriptions survive.
    Fresh,
}

/// Read-only scan output.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ScanResult {
    pub files: Vec<String>,
    /// Function name to every file that declares it, one entry per match.
    pub function_sources: BTreeMap<String, Vec<String>>,
    pub file_functions: BTreeMap<String, Vec<String>>,
    pub extractions: BTreeMap<String, Extraction>,
    pub files_with_sidecar: usize,
    pub skipped: usize,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct UpdateSummary {
    pub files_scanned: usize,
    pub files_written: usize,
    pub functions: usize,
    pub usages: usize,
    pub skipped: usize,
    /// Existing sidecars that could not be parsed and were rebuilt from scratch.
    pub malformed_sidecars: usize,
    pub failures: Vec<String>,
}

/// One indexing run: configuration, sidecar store and the content cache they share.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    base: PathBuf,
    store: SidecarStore,
    cache: ContentCache,
}

impl Session {
    pub fn new(config: SessionConfig) -> Result<Self> {
        let base = fs::canonicalize(&config.base)
            .with_context(|| format!("Failed to access base: {}", config.base.display()))?;
        let store = SidecarStore::new(base.clone(), &config.db_dir);

        Ok(Self {
            config,
            base,
            store,
            cache: ContentCache::new(),
        })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &SidecarStore {
        &self.store
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    fn walk(&self) -> WalkOutcome {
        let roots: Vec<PathBuf> = self
            .config
            .roots
            .iter()
            .map(|root| self.base.join(root))
            .collect();
        let mut excluded = self.config.excluded_dirs.clone();
        if let Some(name) = self.store.root().file_name().and_then(|n| n.to_str()) {
            excluded.push(name.to_string());
        }
        collect_source_files(&roots, &self.config.extensions, &excluded)
    }

    /// Reads every walked file through the cache; unreadable files are dropped and counted.
    fn corpus(&mut self, files: &[PathBuf]) -> (Vec<(String, Arc<str>)>, usize) {
        let mut corpus = Vec::with_capacity(files.len());
        let mut skipped = 0usize;
        for path in files {
            match self.cache.source(path) {
                Some(text) => corpus.push((relative_display(&self.base, path), text)),
                None => skipped += 1,
            }
        }
        (corpus, skipped)
    }

    pub fn scan(&mut self) -> ScanResult {
        let outcome = self.walk();
        let (corpus, unreadable) = self.corpus(&outcome.files);
        let mut result = ScanResult {
            skipped: outcome.skipped + unreadable,
            ..Default::default()
        };

        for (rel, text) in corpus {
            let extraction = extract_for_path(Path::new(&rel), &text);
            debug!(file = %rel, declared = extraction.declared.len(), "extracted");

            for name in &extraction.declared {
                result
                    .function_sources
                    .entry(name.clone())
                    .or_default()
                    .push(rel.clone());
                result
                    .file_functions
                    .entry(rel.clone())
                    .or_default()
                    .push(name.clone());
            }
            if self.store.exists(Path::new(&rel)) {
                result.files_with_sidecar += 1;
            }
            result.files.push(rel.clone());
            result.extractions.insert(rel, extraction);
        }

        info!(
            files = result.files.len(),
            functions = result.function_sources.len(),
            skipped = result.skipped,
            "scan finished"
        );
        result
    }

    pub fn find_usages(&mut self, identifier: &str) -> Result<Vec<Usage>, UsageError> {
        let matcher = UsageMatcher::new(identifier)?;
        let outcome = self.walk();
        let (corpus, _) = self.corpus(&outcome.files);

        let mut usages = Vec::new();
        for (rel, text) in &corpus {
            matcher.scan_into(rel, text, &mut usages);
        }
        info!(identifier = matcher.identifier(), usages = usages.len(), "usage search finished");
        Ok(usages)
    }

    /// Scans every file and writes its sidecar: current imports/exports, and usages of
    /// each declared function merged per `mode`.
    pub fn update(&mut self, mode: UpdateMode) -> UpdateSummary {
        let outcome = self.walk();
        let (corpus, unreadable) = self.corpus(&outcome.files);
        let mut summary = UpdateSummary {
            files_scanned: corpus.len(),
            skipped: outcome.skipped + unreadable,
            ..Default::default()
        };
        let mut found: HashMap<String, Vec<Usage>> = HashMap::new();
        let failures_before = self.cache.sidecar_failures();

        for (rel, text) in &corpus {
            let source = Path::new(rel);
            let extraction = extract_for_path(source, text);
            let existing = self.cache.sidecar(&self.store, source).clone();

            let mut doc = match mode {
                UpdateMode::Append => existing.clone(),
                UpdateMode::Fresh => SidecarDocument::default(),
            };

            for name in extraction.unique_declared() {
                let usages = found
                    .entry(name.to_string())
                    .or_insert_with(|| usages_in_corpus(name, &corpus));

                let record = doc.functions.entry(name.to_string()).or_default();
                if mode == UpdateMode::Fresh
                    && let Some(previous) = existing.functions.get(name)
                {
                    record.description = previous.description.clone();
                }
                record.usages.extend(usages.iter().cloned());

                summary.functions += 1;
                summary.usages += usages.len();
            }

            doc.imports = extraction.imports;
            doc.exports = extraction.exports;
            doc.touch();

            match self.store.save(source, &doc) {
                Ok(_) => {
                    self.cache.remember_sidecar(&self.store, source, doc);
                    summary.files_written += 1;
                }
                Err(err) => {
                    error!(file = %rel, error = %err, "failed to save sidecar");
                    summary.failures.push(format!("{rel}: {err}"));
                }
            }
        }

        summary.malformed_sidecars = self.cache.sidecar_failures() - failures_before;
        if summary.malformed_sidecars > 0 {
            warn!(
                count = summary.malformed_sidecars,
                "malformed sidecars were replaced during update"
            );
        }

        info!(
            written = summary.files_written,
            functions = summary.functions,
            usages = summary.usages,
            failures = summary.failures.len(),
            "update finished"
        );
        summary
    }

    /// Sets the description of `function` in the sidecar of `source`, creating the record.
    pub fn describe(
        &mut self,
        source: &str,
        function: &str,
        description: &str,
    ) -> Result<PathBuf, SidecarError> {
        let source = Path::new(source);
        let mut doc = self.cache.sidecar(&self.store, source).clone();
        doc.functions
            .entry(function.to_string())
            .or_default()
            .description = description.trim().to_string();
        doc.touch();

        let path = self.store.save(source, &doc)?;
        self.cache.remember_sidecar(&self.store, source, doc);
        Ok(path)
    }

    pub fn reconcile(&self) -> Reconciliation {
        self.store.reconcile()
    }

    /// Sidecars for the given source paths, empty documents standing in for missing ones.
    pub fn documents_for(&mut self, files: &[String]) -> BTreeMap<String, SidecarDocument> {
        files
            .iter()
            .map(|rel| {
                let doc = self.cache.sidecar(&self.store, Path::new(rel)).clone();
                (rel.clone(), doc)
            })
            .collect()
    }

    /// All report views. The search filter only narrows the function index view.
    pub fn dashboard(&mut self, filter: &SearchFilter) -> (Dashboard, Reconciliation) {
        let outcome = self.walk();
        let files: Vec<String> = outcome
            .files
            .iter()
            .map(|path| relative_display(&self.base, path))
            .collect();
        let live = self.documents_for(&files);
        let reconciliation = self.reconcile();
        let dashboard = report::build_dashboard(&live, &reconciliation, filter);
        (dashboard, reconciliation)
    }
}

fn usages_in_corpus(name: &str, corpus: &[(String, Arc<str>)]) -> Vec<Usage> {
    match UsageMatcher::new(name) {
        Ok(matcher) => {
            let mut out = Vec::new();
            for (rel, text) in corpus {
                matcher.scan_into(rel, text, &mut out);
            }
            out
        }
        Err(err) => {
            warn!(name, error = %err, "skipping usage search");
            Vec::new()
        }
    }
}
