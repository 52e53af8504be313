use super::*;

/// Names pulled out of one file. Sequences keep table order and may repeat a name.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Extraction {
    pub declared: Vec<String>,
    pub imports: Vec<String>,
    pub exports: Vec<String>,
}

impl Extraction {
    /// Declared names with repeats removed, first occurrence wins.
    pub fn unique_declared(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.declared
            .iter()
            .map(String::as_str)
            .filter(|name| seen.insert(*name))
            .collect()
    }
}

pub fn extract(source: &str, table: &PatternTable) -> Extraction {
    let mut info = Extraction::default();

    for pattern in &table.declarations {
        pattern.collect(source, &mut info.declared);
    }
    for pattern in &table.imports {
        pattern.collect(source, &mut info.imports);
    }
    for pattern in &table.exports {
        pattern.collect(source, &mut info.exports);
    }

    info
}

pub fn extract_for_path(path: &Path, source: &str) -> Extraction {
    extract(source, PatternTable::for_path(path))
}
