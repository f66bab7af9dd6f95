//! Per-language comment syntax
//!
//! Built-in defaults are keyed by file extension; project config may
//! override any extension.

use fdd_registry::CommentSyntaxConfig;
use std::collections::BTreeMap;
use std::path::Path;

/// Comment delimiters for one language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentSyntax {
    single_line: Vec<String>,
    multi_line: Vec<(String, String)>,
    continuation: Vec<String>,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(a, b)| ((*a).to_string(), (*b).to_string()))
        .collect()
}

impl CommentSyntax {
    /// Build from explicit delimiter lists
    #[must_use]
    pub fn new(
        single_line: Vec<String>,
        multi_line: Vec<(String, String)>,
        continuation: Vec<String>,
    ) -> Self {
        Self {
            single_line,
            multi_line,
            continuation,
        }
    }

    /// Syntax for unknown extensions: `//`, `#` and `/* */`
    #[must_use]
    pub fn fallback() -> Self {
        Self::new(owned(&["//", "#"]), pairs(&[("/*", "*/")]), owned(&["*"]))
    }

    /// Built-in syntax for a file extension (case-insensitive, no dot)
    #[must_use]
    pub fn for_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "rs" | "go" | "java" | "kt" | "scala" | "js" | "jsx" | "mjs" | "ts" | "tsx" | "c"
            | "h" | "cc" | "cpp" | "hpp" | "cs" | "swift" => {
                Self::new(owned(&["//"]), pairs(&[("/*", "*/")]), owned(&["*"]))
            }
            "py" => Self::new(
                owned(&["#"]),
                pairs(&[("\"\"\"", "\"\"\""), ("'''", "'''")]),
                Vec::new(),
            ),
            "sh" | "bash" | "yaml" | "yml" | "toml" | "rb" => {
                Self::new(owned(&["#"]), Vec::new(), Vec::new())
            }
            "sql" | "lua" => Self::new(owned(&["--"]), Vec::new(), Vec::new()),
            "md" | "markdown" | "html" | "xml" => {
                Self::new(Vec::new(), pairs(&[("<!--", "-->")]), Vec::new())
            }
            _ => Self::fallback(),
        }
    }

    /// Syntax for `path`, preferring a configured override for its extension
    #[must_use]
    pub fn for_path(path: &Path, overrides: &BTreeMap<String, CommentSyntaxConfig>) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match overrides.get(&ext) {
            Some(config) => Self::from(config),
            None => Self::for_extension(&ext),
        }
    }

    /// Single-line comment prefixes
    #[inline]
    #[must_use]
    pub fn single_line(&self) -> &[String] {
        &self.single_line
    }

    /// Multi-line `(start, end)` pairs
    #[inline]
    #[must_use]
    pub fn multi_line(&self) -> &[(String, String)] {
        &self.multi_line
    }

    /// Block continuation prefixes
    #[inline]
    #[must_use]
    pub fn continuation(&self) -> &[String] {
        &self.continuation
    }
}

impl From<&CommentSyntaxConfig> for CommentSyntax {
    fn from(config: &CommentSyntaxConfig) -> Self {
        Self::new(
            config.single_line.clone(),
            config.multi_line.clone(),
            config.continuation.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_by_extension() {
        assert_eq!(CommentSyntax::for_extension("RS").single_line(), &["//"]);
        assert_eq!(CommentSyntax::for_extension("py").multi_line().len(), 2);
        assert_eq!(CommentSyntax::for_extension("sql").single_line(), &["--"]);
        assert!(CommentSyntax::for_extension("md").single_line().is_empty());
        assert_eq!(CommentSyntax::for_extension("zig"), CommentSyntax::fallback());
    }

    #[test]
    fn override_wins() {
        let mut overrides = BTreeMap::new();
        overrides.insert(
            "rs".to_string(),
            CommentSyntaxConfig {
                single_line: vec![";".into()],
                ..CommentSyntaxConfig::default()
            },
        );
        let syntax = CommentSyntax::for_path(Path::new("src/lib.rs"), &overrides);
        assert_eq!(syntax.single_line(), &[";"]);
        assert!(syntax.multi_line().is_empty());
        let py = CommentSyntax::for_path(Path::new("x.py"), &overrides);
        assert_eq!(py.single_line(), &["#"]);
    }
}
