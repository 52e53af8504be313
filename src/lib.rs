use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

pub mod cache;
pub mod error;
pub mod output;
pub mod parser;
pub mod patterns;
pub mod report;
pub mod scanner;
pub mod session;
pub mod sidecar;
mod tui;
pub mod usages;

pub use cache::ContentCache;
pub use error::{SidecarError, UsageError};
pub use parser::{Extraction, extract, extract_for_path};
pub use patterns::{Capture, Pattern, PatternTable};
pub use report::{Dashboard, SearchFilter};
pub use scanner::{WalkOutcome, collect_source_files};
pub use session::{ScanResult, Session, SessionConfig, UpdateMode, UpdateSummary};
pub use sidecar::{
    FunctionIndex, FunctionRecord, IndexedFunction, PathCheck, Reconciliation, SidecarDocument,
    SidecarFailure, SidecarStore,
};
pub use usages::{Usage, UsageMatcher, find_usages};

use output::{
    print_check_report, print_dashboard, print_json, print_scan_report, print_update_summary,
    print_usages, relative_display,
};
use tui::print_tui_report;

pub const DEFAULT_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "py"];
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &["node_modules", ".git", ".next", "build", "dist"];
pub const DEFAULT_DIRS: &[&str] = &["./app", "./components", "./lib", "./hooks"];
pub const DEFAULT_DB_DIR: &str = "function_data";
pub const SIDECAR_SUFFIX: &str = ".json";

const JS_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "mjs", "cjs"];
const PY_EXTENSIONS: &[&str] = &["py"];

/// Language hint derived from a file extension; selects the pattern table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
    Python,
}

impl Language {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();

        if PY_EXTENSIONS.contains(&ext) {
            return Language::Python;
        }
        if !JS_EXTENSIONS.contains(&ext) {
            debug!(path = %path.display(), "unknown extension, using JavaScript patterns");
        }
        Language::JavaScript
    }
}

#[derive(Parser, Debug)]
#[command(name = "usedex")]
#[command(about = "Index function declarations, imports, exports and usages in JS/TS projects")]
struct Cli {
    /// Directories to scan (repeatable or comma-separated), e.g. --dirs ./app,./lib
    #[arg(long, env = "USEDEX_DIRS", value_delimiter = ',', global = true)]
    dirs: Vec<String>,

    /// Base directory; recorded paths are relative to it
    #[arg(long, env = "USEDEX_BASE", default_value = ".", global = true)]
    base: PathBuf,

    /// Directory holding the JSON sidecar documents
    #[arg(long = "db-dir", env = "USEDEX_DB_DIR", default_value = DEFAULT_DB_DIR, global = true)]
    db_dir: PathBuf,

    /// File extensions to index (comma-separated)
    #[arg(long = "ext", value_delimiter = ',', global = true)]
    extensions: Vec<String>,

    /// Directory names to skip while walking (comma-separated)
    #[arg(long = "exclude", value_delimiter = ',', global = true)]
    excluded_dirs: Vec<String>,

    /// Log verbosity when RUST_LOG is unset
    #[arg(long = "log-level", value_enum, default_value_t = LogLevel::Warn, global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Walk the directories and list declared functions without touching sidecars
    Scan {
        /// Emit JSON output
        #[arg(long)]
        json: bool,
    },

    /// Find call-like and tag-like usages of one identifier
    Usages {
        /// Identifier to look for
        name: String,

        /// Emit JSON output
        #[arg(long)]
        json: bool,
    },

    /// Scan and write a sidecar document for every source file
    Update {
        /// Discard recorded usages instead of appending to them
        #[arg(long)]
        fresh: bool,

        /// Emit JSON output
        #[arg(long)]
        json: bool,
    },

    /// Record a description for a function in a file's sidecar
    Describe {
        /// Source file, relative to --base
        file: String,

        /// Function name
        function: String,

        /// Description text
        description: String,
    },

    /// Render the structure, function, import/export and path-check views
    Report {
        /// Which view to print
        #[arg(long, value_enum, default_value_t = View::All)]
        view: View,

        /// Case-insensitive substring filter on function names
        #[arg(long, default_value = "")]
        search: String,

        /// Emit JSON output
        #[arg(long)]
        json: bool,

        /// Render an interactive terminal dashboard (press q to quit)
        #[arg(long)]
        tui: bool,
    },

    /// Check every sidecar against the file it mirrors
    Check {
        /// Emit JSON output
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum View {
    Tree,
    Functions,
    Imports,
    Paths,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl Cli {
    fn session_config(&self) -> SessionConfig {
        let mut config = SessionConfig::new(&self.base);
        let dirs: Vec<&str> = self
            .dirs
            .iter()
            .map(|d| d.trim())
            .filter(|d| !d.is_empty())
            .collect();
        if !dirs.is_empty() {
            config.roots = dirs.into_iter().map(PathBuf::from).collect();
        }
        config.db_dir = self.db_dir.clone();
        if !self.extensions.is_empty() {
            config.extensions = normalize_list(&self.extensions, |e| e.trim_start_matches('.'));
        }
        if !self.excluded_dirs.is_empty() {
            config.excluded_dirs = normalize_list(&self.excluded_dirs, |d| d.trim_matches('/'));
        }
        config
    }
}

fn normalize_list(values: &[String], clean: impl Fn(&str) -> &str) -> Vec<String> {
    values
        .iter()
        .map(|v| clean(v.trim()).to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

fn init_tracing(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level);

    let mut session = Session::new(cli.session_config())?;

    match cli.command {
        Command::Scan { json } => {
            let result = session.scan();
            if json {
                print_json(&result)?;
            } else {
                print_scan_report(&result);
            }
        }
        Command::Usages { name, json } => {
            let usages = session
                .find_usages(&name)
                .with_context(|| format!("Failed to search usages of `{name}`"))?;
            if json {
                print_json(&usages)?;
            } else {
                print_usages(&name, &usages);
            }
        }
        Command::Update { fresh, json } => {
            let mode = if fresh {
                UpdateMode::Fresh
            } else {
                UpdateMode::Append
            };
            let summary = session.update(mode);
            if json {
                print_json(&summary)?;
            } else {
                print_update_summary(&summary);
            }
        }
        Command::Describe {
            file,
            function,
            description,
        } => {
            let path = session
                .describe(&file, &function, &description)
                .with_context(|| format!("Failed to describe `{function}` in {file}"))?;
            println!("Updated {}", relative_display(session.base(), &path));
        }
        Command::Report {
            view,
            search,
            json,
            tui,
        } => {
            let filter = SearchFilter::new(&search);
            let (dashboard, reconciliation) = session.dashboard(&filter);
            if tui {
                print_tui_report(&dashboard, &reconciliation, &search)?;
            } else if json {
                print_json(&dashboard.select(view))?;
            } else {
                print_dashboard(&dashboard, view);
            }
        }
        Command::Check { json } => {
            let reconciliation = session.reconcile();
            let view = report::path_check_view(&reconciliation);
            if json {
                print_json(&view)?;
            } else {
                print_check_report(&view);
            }
        }
    }

    Ok(())
}
