//! Tag pairing automaton
//!
//! Scans one file for `fdd-begin <ref>` / `fdd-end <ref>` markers with a
//! stack of open tags. Every malformed construct becomes a [`TagError`] and
//! scanning continues, so one pass yields both the paired tags and the
//! complete diagnostic list.
//!
//! Errors are reported everywhere, opt-out regions included. Only pairs and
//! scope annotations whose marker line lies outside every opt-out region
//! count as found.

use crate::mask::LexicalMask;
use crate::syntax::CommentSyntax;
use fdd_artifact::ScopeRef;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

/// `fdd-begin` / `fdd-end` marker word and the reference after it, if any
pub static TAG_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"fdd-(begin|end)(?:[ \t]+([A-Za-z0-9_:-]*)|[ \t]*$)").expect("valid regex")
});

static SCOPE_ANNOTATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@fdd-([a-z]+):([a-z0-9][a-z0-9:-]*)").expect("valid regex")
});

static INSTRUCTION_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[a-z0-9]+(?:-[a-z0-9]+)*:ph-\d+:inst-[a-z0-9]+(?:-[a-z0-9]+)*")
        .expect("valid regex")
});

/// Kind of tag diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TagErrorKind {
    /// Begin marker never closed
    BeginWithoutEnd,
    /// End marker with no open tag, or closing a different tag than the innermost
    EndWithoutBegin,
    /// No effective line strictly between begin and end
    EmptyBlock,
    /// Instruction tag text outside any begin/end marker
    UnwrappedTag,
    /// Marker whose reference is not a valid scope reference
    MalformedTag,
}

impl TagErrorKind {
    /// Stable kebab-case name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TagErrorKind::BeginWithoutEnd => "begin-without-end",
            TagErrorKind::EndWithoutBegin => "end-without-begin",
            TagErrorKind::EmptyBlock => "empty-block",
            TagErrorKind::UnwrappedTag => "unwrapped-tag",
            TagErrorKind::MalformedTag => "malformed-tag",
        }
    }
}

impl Display for TagErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tag diagnostic inside a file
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TagError {
    /// Diagnostic kind
    pub kind: TagErrorKind,
    /// 1-based line
    pub line: usize,
    /// 1-based column of the tag text
    pub column: usize,
    /// Tag text involved
    pub tag: String,
    /// Human-readable explanation
    pub message: String,
}

/// A correctly nested begin/end pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagPair {
    /// Tag text
    pub tag: String,
    /// Begin marker line
    pub begin: usize,
    /// End marker line
    pub end: usize,
}

/// Result of scanning one file
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TagScan {
    /// Non-empty pairs whose begin line is outside every opt-out region
    pub pairs: Vec<TagPair>,
    /// Base identifiers of found pairs and scope annotations
    pub found_scopes: BTreeSet<String>,
    /// Found instruction-level references, `<id>:ph-N:inst-X`
    pub found_instructions: BTreeSet<String>,
    /// Diagnostics in line order
    pub errors: Vec<TagError>,
}

impl TagScan {
    /// True when the file produced no diagnostics
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// True when `text` contains at least one begin or end marker
#[must_use]
pub fn has_tag_marker(text: &str) -> bool {
    text.lines().any(|line| markers(line).next().is_some())
}

struct Marker<'t> {
    begin: bool,
    tag: &'t str,
    column: usize,
}

/// Markers on one line. A marker glued to a preceding word, directly or
/// through one dash (`!no-fdd-begin`, `my-fdd-end`), is not a marker.
fn markers(line: &str) -> impl Iterator<Item = Marker<'_>> {
    TAG_MARKER.captures_iter(line).filter_map(move |caps| {
        let whole = caps.get(0)?;
        if is_compound(&line[..whole.start()]) {
            return None;
        }
        let begin = caps.get(1)?.as_str() == "begin";
        let Some(tag) = caps.get(2).filter(|m| !m.as_str().is_empty()) else {
            return Some(Marker {
                begin,
                tag: "",
                column: whole.start() + 1,
            });
        };
        // `<!-- fdd-begin x-->` closes the comment right after the reference
        let text = if line[tag.end()..].starts_with('>') {
            tag.as_str().trim_end_matches('-')
        } else {
            tag.as_str()
        };
        Some(Marker {
            begin,
            tag: text,
            column: tag.start() + 1,
        })
    })
}

fn is_compound(before: &str) -> bool {
    let word = |c: char| c.is_ascii_alphanumeric() || c == '_';
    let mut rev = before.chars().rev();
    match rev.next() {
        Some(c) if word(c) => true,
        Some('-') => rev.next().is_some_and(word),
        _ => false,
    }
}

/// Scan one file's text
#[must_use]
pub fn scan_text(text: &str, syntax: &CommentSyntax) -> TagScan {
    let mask = LexicalMask::compute(text, syntax);
    scan_with_mask(text, &mask)
}

/// Scan one file's text against a precomputed mask
#[must_use]
pub fn scan_with_mask(text: &str, mask: &LexicalMask) -> TagScan {
    let effective = mask.effective_prefix();
    let mut scan = TagScan::default();
    let mut stack: Vec<(String, usize, usize)> = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let mut is_marker_line = false;

        for Marker { begin, tag, column } in markers(line) {
            is_marker_line = true;
            if tag.is_empty() {
                let word = if begin { "fdd-begin" } else { "fdd-end" };
                scan.errors.push(TagError {
                    kind: TagErrorKind::MalformedTag,
                    line: line_no,
                    column,
                    tag: String::new(),
                    message: format!("{word} marker without a scope reference"),
                });
                continue;
            }
            let tag_text = tag.to_string();

            if ScopeRef::parse(&tag_text).is_err() {
                scan.errors.push(TagError {
                    kind: TagErrorKind::MalformedTag,
                    line: line_no,
                    column,
                    message: format!("'{tag_text}' is not a valid scope reference"),
                    tag: tag_text.clone(),
                });
            }

            if begin {
                stack.push((tag_text, line_no, column));
                continue;
            }

            match stack.last() {
                Some((open, _, _)) if *open == tag_text => {
                    let Some((tag, begin, begin_column)) = stack.pop() else {
                        continue;
                    };
                    close_pair(&mut scan, mask, &effective, tag, begin, begin_column, line_no);
                }
                Some((open, open_line, _)) => {
                    scan.errors.push(TagError {
                        kind: TagErrorKind::EndWithoutBegin,
                        line: line_no,
                        column,
                        message: format!(
                            "end marker for '{tag_text}' but innermost open tag is '{open}' (line {open_line})"
                        ),
                        tag: tag_text,
                    });
                }
                None => {
                    scan.errors.push(TagError {
                        kind: TagErrorKind::EndWithoutBegin,
                        line: line_no,
                        column,
                        message: format!("end marker for '{tag_text}' without a begin marker"),
                        tag: tag_text,
                    });
                }
            }
        }

        if !is_marker_line {
            for m in INSTRUCTION_TOKEN.find_iter(line) {
                scan.errors.push(TagError {
                    kind: TagErrorKind::UnwrappedTag,
                    line: line_no,
                    column: m.start() + 1,
                    tag: m.as_str().to_string(),
                    message: format!(
                        "instruction tag '{}' is not wrapped in fdd-begin/fdd-end",
                        m.as_str()
                    ),
                });
            }
        }

        if !mask.is_excluded(line_no) {
            for caps in SCOPE_ANNOTATION.captures_iter(line) {
                if let Some(reference) = caps.get(2).and_then(|m| ScopeRef::parse(m.as_str()).ok())
                {
                    scan.found_scopes.insert(reference.base().to_string());
                }
            }
        }
    }

    for (tag, line, column) in stack {
        scan.errors.push(TagError {
            kind: TagErrorKind::BeginWithoutEnd,
            line,
            column,
            message: format!("begin marker for '{tag}' is never closed"),
            tag,
        });
    }

    scan.errors.sort_by_key(|e| (e.line, e.column, e.kind));
    scan
}

fn close_pair(
    scan: &mut TagScan,
    mask: &LexicalMask,
    effective: &[usize],
    tag: String,
    begin: usize,
    begin_column: usize,
    end: usize,
) {
    // Effective lines strictly between begin and end
    let inner = if end > begin + 1 {
        effective[end - 1] - effective[begin]
    } else {
        0
    };
    if inner == 0 {
        scan.errors.push(TagError {
            kind: TagErrorKind::EmptyBlock,
            line: begin,
            column: begin_column,
            message: format!("tagged block '{tag}' (lines {begin}-{end}) has no code"),
            tag,
        });
        return;
    }

    if mask.is_excluded(begin) {
        return;
    }
    if let Ok(reference) = ScopeRef::parse(&tag) {
        scan.found_scopes.insert(reference.base().to_string());
        if reference.is_instruction() {
            scan.found_instructions.insert(reference.to_string());
        }
    }
    scan.pairs.push(TagPair { tag, begin, end });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TAG: &str = "ns-feature-a-algo-check:ph-1:inst-return-ok";

    fn rust(text: &str) -> TagScan {
        scan_text(text, &CommentSyntax::for_extension("rs"))
    }

    fn kinds(scan: &TagScan) -> Vec<TagErrorKind> {
        scan.errors.iter().map(|e| e.kind).collect()
    }

    #[test]
    fn paired_tag_is_found() {
        let scan = rust(&format!("// fdd-begin {TAG}\nreturn Ok(());\n// fdd-end {TAG}\n"));
        assert!(scan.is_clean(), "{:?}", scan.errors);
        assert_eq!(scan.pairs.len(), 1);
        assert!(scan.found_instructions.contains(TAG));
        assert!(scan.found_scopes.contains("ns-feature-a-algo-check"));
    }

    #[test]
    fn blank_only_block_is_empty() {
        let scan = rust(&format!("// fdd-begin {TAG}\n\n// fdd-end {TAG}\n"));
        assert_eq!(kinds(&scan), vec![TagErrorKind::EmptyBlock]);
        assert!(scan.found_instructions.is_empty());
    }

    #[test]
    fn comment_only_block_is_empty() {
        let scan = rust(&format!("// fdd-begin {TAG}\n// just words\n// fdd-end {TAG}\n"));
        assert_eq!(kinds(&scan), vec![TagErrorKind::EmptyBlock]);
    }

    #[test]
    fn deref_after_line_comment_is_code() {
        let scan = rust("// fdd-begin ns-adr-x\n// set it\n*ptr = 1;\n// fdd-end ns-adr-x\n");
        assert!(scan.is_clean(), "{:?}", scan.errors);
        assert!(scan.found_scopes.contains("ns-adr-x"));
    }

    #[test]
    fn unclosed_and_stray_markers() {
        let scan = rust("// fdd-end ns-adr-one\n// fdd-begin ns-adr-two\nx();\n");
        assert_eq!(
            kinds(&scan),
            vec![TagErrorKind::EndWithoutBegin, TagErrorKind::BeginWithoutEnd]
        );
        assert_eq!(scan.errors[1].line, 2);
    }

    #[test]
    fn mismatched_end_keeps_stack() {
        let text = "// fdd-begin ns-adr-outer\n// fdd-begin ns-adr-inner\nx();\n// fdd-end ns-adr-outer\n// fdd-end ns-adr-inner\ny();\n// fdd-end ns-adr-outer\n";
        let scan = rust(text);
        assert_eq!(kinds(&scan), vec![TagErrorKind::EndWithoutBegin]);
        assert_eq!(scan.errors[0].line, 4);
        assert_eq!(scan.pairs.len(), 2);
    }

    #[test]
    fn nested_pairs() {
        let text = "// fdd-begin ns-adr-a\n// fdd-begin ns-adr-b\nx();\n// fdd-end ns-adr-b\n// fdd-end ns-adr-a\n";
        let scan = rust(text);
        assert!(scan.is_clean());
        assert_eq!(
            scan.found_scopes.iter().cloned().collect::<Vec<_>>(),
            vec!["ns-adr-a".to_string(), "ns-adr-b".to_string()]
        );
    }

    #[test]
    fn unwrapped_instruction_tag() {
        let scan = rust(&format!("let s = \"{TAG}\";\n"));
        assert_eq!(kinds(&scan), vec![TagErrorKind::UnwrappedTag]);
        assert_eq!(scan.errors[0].column, 10);
    }

    #[test]
    fn opt_out_markers_are_not_tags() {
        assert!(!has_tag_marker("// !no-fdd-begin\n// !no-fdd-end\n"));
        assert!(!has_tag_marker("my-fdd-begin ns-adr-x"));
        assert!(has_tag_marker("<!-- fdd-begin ns-adr-x -->"));
        assert!(has_tag_marker("<!--fdd-begin ns-adr-x -->"));
        assert!(has_tag_marker("--fdd-end ns-adr-x"));
    }

    #[test]
    fn markdown_comment_spellings() {
        let md = CommentSyntax::for_extension("md");
        for text in [
            "<!--fdd-begin ns-adr-x -->
body
<!--fdd-end ns-adr-x -->
",
            "<!-- fdd-begin ns-adr-x-->
body
<!-- fdd-end ns-adr-x-->
",
        ] {
            let scan = scan_text(text, &md);
            assert!(scan.is_clean(), "{text}: {:?}", scan.errors);
            assert_eq!(scan.pairs.len(), 1, "{text}");
            assert_eq!(scan.pairs[0].tag, "ns-adr-x");
            assert!(scan.found_scopes.contains("ns-adr-x"));
        }
    }

    #[test]
    fn sql_comment_without_space() {
        let scan = scan_text(
            "--fdd-begin ns-adr-x
SELECT 1;
--fdd-end ns-adr-x
",
            &CommentSyntax::for_extension("sql"),
        );
        assert!(scan.is_clean(), "{:?}", scan.errors);
        assert!(scan.found_scopes.contains("ns-adr-x"));
    }

    #[test]
    fn bare_and_uppercase_markers_are_malformed() {
        let scan = rust("// fdd-begin
x();
// fdd-end NS-ADR-X
");
        assert_eq!(
            kinds(&scan),
            vec![
                TagErrorKind::MalformedTag,
                TagErrorKind::EndWithoutBegin,
                TagErrorKind::MalformedTag,
            ]
        );
        assert_eq!((scan.errors[0].line, scan.errors[0].column), (1, 4));
        assert_eq!(scan.errors[2].tag, "NS-ADR-X");
        assert!(scan.found_scopes.is_empty());
    }

    #[test]
    fn dangling_dashes_without_comment_close_stay_malformed() {
        let scan = rust("// fdd-begin ns-adr-x--
x();
// fdd-end ns-adr-x--
");
        assert_eq!(
            kinds(&scan),
            vec![TagErrorKind::MalformedTag, TagErrorKind::MalformedTag]
        );
    }

    #[test]
    fn excluded_pair_is_not_found_but_errors_still_count() {
        let text = format!(
            "// !no-fdd-begin\n// fdd-begin {TAG}\nx();\n// fdd-end {TAG}\n// fdd-begin ns-adr-z\n"
        );
        let scan = rust(&text);
        assert!(scan.found_instructions.is_empty());
        assert!(scan.pairs.is_empty());
        assert_eq!(kinds(&scan), vec![TagErrorKind::BeginWithoutEnd]);
    }

    #[test]
    fn scope_annotation_counts_as_found() {
        let scan = rust("/// @fdd-flow:ns-feature-a-flow-login:ph-1\nfn login() {}\n");
        assert!(scan.is_clean());
        assert!(scan.found_scopes.contains("ns-feature-a-flow-login"));
    }

    #[test]
    fn malformed_reference_is_reported() {
        let scan = rust("// fdd-begin not:an-id\nx();\n// fdd-end not:an-id\n");
        assert_eq!(
            kinds(&scan),
            vec![TagErrorKind::MalformedTag, TagErrorKind::MalformedTag]
        );
        assert!(scan.found_scopes.is_empty());
    }
}
