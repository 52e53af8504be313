use super::*;

/// One line where an identifier is called or opened as a markup tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Usage {
    pub file: String,
    pub line: usize,
}

impl Usage {
    pub fn new(file: impl Into<String>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

/// Line matcher for `name(` calls and `<Name>` / `<Name/` tags.
///
/// Declaration lines are not filtered out: `function foo() {` is reported as a usage
/// of `foo`. A line with both a call and a tag of the same name is reported twice.
#[derive(Debug, Clone)]
pub struct UsageMatcher {
    identifier: String,
    call: Regex,
    tag: Regex,
}

impl UsageMatcher {
    pub fn new(identifier: &str) -> Result<Self, UsageError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(UsageError::EmptyIdentifier);
        }

        let escaped = regex::escape(identifier);
        let build = |pattern: String| {
            Regex::new(&pattern).map_err(|source| UsageError::Pattern {
                identifier: identifier.to_string(),
                source,
            })
        };

        Ok(Self {
            identifier: identifier.to_string(),
            call: build(format!(r"\b{escaped}\s*\("))?,
            tag: build(format!(r"<\s*{escaped}\s*[>/]"))?,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn scan_into(&self, file: &str, text: &str, out: &mut Vec<Usage>) {
        for (idx, line) in text.split('\n').enumerate() {
            if self.call.is_match(line) {
                out.push(Usage::new(file, idx + 1));
            }
            if self.tag.is_match(line) {
                out.push(Usage::new(file, idx + 1));
            }
        }
    }

    pub fn scan_text(&self, file: &str, text: &str) -> Vec<Usage> {
        let mut out = Vec::new();
        self.scan_into(file, text, &mut out);
        out
    }
}

/// Runs a [`UsageMatcher`] for `identifier` over `(file, text)` pairs in the given order.
pub fn find_usages<'a, I>(identifier: &str, corpus: I) -> Result<Vec<Usage>, UsageError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let matcher = UsageMatcher::new(identifier)?;
    let mut out = Vec::new();
    for (file, text) in corpus {
        matcher.scan_into(file, text, &mut out);
    }
    Ok(out)
}

/// Groups usages by file (sorted) with each file's line numbers sorted. Repeats are kept.
pub fn group_by_file(usages: &[Usage]) -> BTreeMap<String, Vec<usize>> {
    let mut grouped: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for usage in usages {
        grouped
            .entry(usage.file.clone())
            .or_default()
            .push(usage.line);
    }
    for lines in grouped.values_mut() {
        lines.sort_unstable();
    }
    grouped
}
