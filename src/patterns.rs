//! Ordered, named regular-expression tables for declaration, import and export idioms.
//!
//! Matching is textual: multi-line signatures and unusual formatting are missed, and
//! a pattern may fire inside strings or comments. Each table is applied pattern by
//! pattern, so one line can contribute the same name more than once.

use super::*;

/// How a pattern match turns into names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// First capture group, verbatim.
    Group,
    /// The pattern has no group; every match yields this fixed name.
    Literal(&'static str),
    /// First capture group is a comma-separated list; items are trimmed and split out.
    CommaList,
}

#[derive(Debug)]
pub struct Pattern {
    name: &'static str,
    regex: Regex,
    capture: Capture,
}

impl Pattern {
    pub fn new(name: &'static str, pattern: &str, capture: Capture) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            regex: Regex::new(pattern)?,
            capture,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn capture(&self) -> Capture {
        self.capture
    }

    /// Appends every name this pattern yields for `source` to `out`, in match order.
    pub fn collect(&self, source: &str, out: &mut Vec<String>) {
        for caps in self.regex.captures_iter(source) {
            match self.capture {
                Capture::Literal(name) => out.push(name.to_string()),
                Capture::Group => {
                    if let Some(m) = caps.get(1) {
                        out.push(m.as_str().to_string());
                    }
                }
                Capture::CommaList => {
                    if let Some(m) = caps.get(1) {
                        out.extend(split_name_list(m.as_str()));
                    }
                }
            }
        }
    }

    pub fn matches(&self, source: &str) -> Vec<String> {
        let mut out = Vec::new();
        self.collect(source, &mut out);
        out
    }
}

/// One language's declaration, import and export patterns, in application order.
#[derive(Debug)]
pub struct PatternTable {
    pub declarations: Vec<Pattern>,
    pub imports: Vec<Pattern>,
    pub exports: Vec<Pattern>,
}

impl PatternTable {
    pub fn new(declarations: Vec<Pattern>, imports: Vec<Pattern>, exports: Vec<Pattern>) -> Self {
        Self {
            declarations,
            imports,
            exports,
        }
    }

    pub fn javascript() -> &'static PatternTable {
        &JAVASCRIPT
    }

    pub fn python() -> &'static PatternTable {
        &PYTHON
    }

    pub fn for_language(language: Language) -> &'static PatternTable {
        match language {
            Language::JavaScript => Self::javascript(),
            Language::Python => Self::python(),
        }
    }

    pub fn for_path(path: &Path) -> &'static PatternTable {
        Self::for_language(Language::from_path(path))
    }

    pub fn get(&self, name: &str) -> Option<&Pattern> {
        self.declarations
            .iter()
            .chain(&self.imports)
            .chain(&self.exports)
            .find(|p| p.name == name)
    }
}

fn pattern(name: &'static str, re: &str, capture: Capture) -> Pattern {
    Pattern::new(name, re, capture).unwrap()
}

static JAVASCRIPT: Lazy<PatternTable> = Lazy::new(|| {
    PatternTable::new(
        vec![
            pattern("function", r"function\s+(\w+)", Capture::Group),
            pattern(
                "arrow_const",
                r"const\s+(\w+)\s*=\s*\([^)]*\)\s*=>",
                Capture::Group,
            ),
            pattern("function_const", r"const\s+(\w+)\s*=\s*function", Capture::Group),
            pattern("export_function", r"export\s+function\s+(\w+)", Capture::Group),
            pattern(
                "export_arrow_const",
                r"export\s+const\s+(\w+)\s*=\s*\([^)]*\)\s*=>",
                Capture::Group,
            ),
            pattern("class", r"class\s+(\w+)", Capture::Group),
            pattern("export_class", r"export\s+class\s+(\w+)", Capture::Group),
            pattern(
                "export_default_function",
                r"export\s+default\s+function\s+(\w+)",
                Capture::Group,
            ),
            pattern("generator_function", r"function\*\s+(\w+)", Capture::Group),
            pattern("async_function", r"async\s+function\s+(\w+)", Capture::Group),
            pattern(
                "export_async_function",
                r"export\s+async\s+function\s+(\w+)",
                Capture::Group,
            ),
            pattern(
                "export_default_async_function",
                r"export\s+default\s+async\s+function\s+(\w+)",
                Capture::Group,
            ),
            pattern(
                "export_default_class",
                r"export\s+default\s+class\s+(\w+)",
                Capture::Group,
            ),
        ],
        vec![
            pattern(
                "import_from",
                r#"import\s+.*?from\s+['"]([^'"]+)['"]"#,
                Capture::Group,
            ),
            pattern("require", r#"require\(['"]([^'"]+)['"]"#, Capture::Group),
        ],
        vec![
            pattern("export_default", r"export\s+default", Capture::Literal("export default")),
            pattern("export_list", r"export\s+\{([^}]+)\}", Capture::CommaList),
        ],
    )
});

static PYTHON: Lazy<PatternTable> = Lazy::new(|| {
    PatternTable::new(
        vec![
            pattern("def", r"(?m)^\s*def\s+(\w+)", Capture::Group),
            pattern("async_def", r"(?m)^\s*async\s+def\s+(\w+)", Capture::Group),
            pattern("class", r"(?m)^\s*class\s+(\w+)", Capture::Group),
        ],
        vec![
            pattern("import", r"(?m)^\s*import\s+([\w.]+)", Capture::Group),
            pattern(
                "from_import",
                r"(?m)^\s*from\s+([\w.]+)\s+import\b",
                Capture::Group,
            ),
        ],
        vec![pattern(
            "dunder_all",
            r"__all__\s*=\s*[\[(]([^\])]*)[\])]",
            Capture::CommaList,
        )],
    )
});

/// Splits `a, b as c, 'd'` into `["a", "c", "d"]`: items trimmed, aliases resolved to
/// the exported name, quotes dropped, empty items skipped.
pub(crate) fn split_name_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.split_once(" as ")
                .map(|(_, right)| right.trim())
                .unwrap_or(part)
                .trim_start_matches("type ")
                .trim()
                .trim_matches(|c| c == '\'' || c == '"')
                .to_string()
        })
        .filter(|name| !name.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn js(name: &str, source: &str) -> Vec<String> {
        PatternTable::javascript()
            .get(name)
            .unwrap_or_else(|| panic!("missing pattern {name}"))
            .matches(source)
    }

    fn py(name: &str, source: &str) -> Vec<String> {
        PatternTable::python()
            .get(name)
            .unwrap_or_else(|| panic!("missing pattern {name}"))
            .matches(source)
    }

    #[test]
    fn javascript_table_order_is_stable() {
        let names: Vec<&str> = PatternTable::javascript()
            .declarations
            .iter()
            .map(Pattern::name)
            .collect();
        assert_eq!(
            names,
            vec![
                "function",
                "arrow_const",
                "function_const",
                "export_function",
                "export_arrow_const",
                "class",
                "export_class",
                "export_default_function",
                "generator_function",
                "async_function",
                "export_async_function",
                "export_default_async_function",
                "export_default_class",
            ]
        );
    }

    #[test]
    fn function_declaration() {
        assert_eq!(js("function", "function loadData(a, b) {"), vec!["loadData"]);
    }

    #[test]
    fn arrow_const() {
        assert_eq!(js("arrow_const", "const sum = (a, b) => a + b;"), vec!["sum"]);
        assert!(js("arrow_const", "const sum = a => a;").is_empty());
    }

    #[test]
    fn function_const() {
        assert_eq!(
            js("function_const", "const handler = function (req) {}"),
            vec!["handler"]
        );
    }

    #[test]
    fn export_function() {
        assert_eq!(js("export_function", "export function foo() {}"), vec!["foo"]);
    }

    #[test]
    fn export_arrow_const() {
        assert_eq!(
            js("export_arrow_const", "export const useThing = () => {}"),
            vec!["useThing"]
        );
    }

    #[test]
    fn class_declaration() {
        assert_eq!(js("class", "class Store extends Base {"), vec!["Store"]);
        assert!(js("class", "<div className=\"x\" />").is_empty());
    }

    #[test]
    fn export_class() {
        assert_eq!(js("export_class", "export class Client {}"), vec!["Client"]);
    }

    #[test]
    fn export_default_function() {
        assert_eq!(
            js("export_default_function", "export default function Page() {}"),
            vec!["Page"]
        );
    }

    #[test]
    fn generator_function() {
        assert_eq!(js("generator_function", "function* walk(node) {"), vec!["walk"]);
    }

    #[test]
    fn async_function() {
        assert_eq!(js("async_function", "async function fetchRates() {"), vec!["fetchRates"]);
    }

    #[test]
    fn export_async_function() {
        assert_eq!(
            js("export_async_function", "export async function GET(req) {"),
            vec!["GET"]
        );
    }

    #[test]
    fn export_default_async_function() {
        assert_eq!(
            js(
                "export_default_async_function",
                "export default async function handler() {}"
            ),
            vec!["handler"]
        );
    }

    #[test]
    fn export_default_class() {
        assert_eq!(
            js("export_default_class", "export default class App {}"),
            vec!["App"]
        );
    }

    #[test]
    fn async_arrow_is_not_a_recognized_idiom() {
        assert!(js("arrow_const", "const load = async () => {}").is_empty());
    }

    #[test]
    fn import_from() {
        let source = "import React from 'react';\nimport { a, b } from \"./local\";";
        assert_eq!(js("import_from", source), vec!["react", "./local"]);
    }

    #[test]
    fn require_call() {
        assert_eq!(js("require", "const fs = require('fs');"), vec!["fs"]);
    }

    #[test]
    fn export_default_yields_marker_text() {
        assert_eq!(
            js("export_default", "export default Page;"),
            vec!["export default"]
        );
    }

    #[test]
    fn export_list_splits_and_trims() {
        assert_eq!(
            js("export_list", "export { alpha, beta, gamma };"),
            vec!["alpha", "beta", "gamma"]
        );
        assert_eq!(js("export_list", "export {single}"), vec!["single"]);
        assert_eq!(js("export_list", "export { a as b, }"), vec!["b"]);
    }

    #[test]
    fn python_def() {
        assert_eq!(py("def", "def main():\n    pass\n"), vec!["main"]);
    }

    #[test]
    fn python_async_def() {
        assert_eq!(py("async_def", "    async def fetch(self):"), vec!["fetch"]);
    }

    #[test]
    fn python_class() {
        assert_eq!(py("class", "class Collector(Base):"), vec!["Collector"]);
    }

    #[test]
    fn python_import() {
        assert_eq!(py("import", "import os.path\nimport re"), vec!["os.path", "re"]);
    }

    #[test]
    fn python_from_import() {
        assert_eq!(
            py("from_import", "from collections import defaultdict"),
            vec!["collections"]
        );
    }

    #[test]
    fn python_dunder_all() {
        assert_eq!(
            py("dunder_all", "__all__ = ['load', \"save\"]"),
            vec!["load", "save"]
        );
    }

    #[test]
    fn custom_pattern_rejects_invalid_regex() {
        assert!(Pattern::new("broken", "(", Capture::Group).is_err());
    }
}
