//! Lexical exclusion mask
//!
//! One forward pass over a file classifies every line (blank, comment-only,
//! code) and collects the line ranges wrapped in `!no-fdd-begin` /
//! `!no-fdd-end`. An opt-out region that is never closed runs to the end of
//! the file.

use crate::syntax::CommentSyntax;
use std::ops::Range;

/// Opt-out region start marker
pub const NO_FDD_BEGIN: &str = "!no-fdd-begin";
/// Opt-out region end marker
pub const NO_FDD_END: &str = "!no-fdd-end";

/// Classification of one line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineClass {
    /// Whitespace only
    Blank,
    /// Only comment text
    Comment,
    /// Anything else
    Code,
}

impl LineClass {
    /// Non-blank, non-comment-only line
    #[inline]
    #[must_use]
    pub fn is_effective(self) -> bool {
        matches!(self, LineClass::Code)
    }
}

/// Line classes plus opt-out ranges for one file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LexicalMask {
    classes: Vec<LineClass>,
    excluded: Vec<Range<usize>>,
}

impl LexicalMask {
    /// Compute the mask of `text`
    #[must_use]
    pub fn compute(text: &str, syntax: &CommentSyntax) -> Self {
        let mut classes = Vec::new();
        let mut excluded = Vec::new();
        let mut open_region: Option<usize> = None;
        let mut block: Option<usize> = None;
        let mut after_block = false;

        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;

            if line.contains(NO_FDD_BEGIN) && open_region.is_none() {
                open_region = Some(line_no);
            }
            if line.contains(NO_FDD_END) {
                if let Some(start) = open_region.take() {
                    excluded.push(start..line_no + 1);
                }
            }

            let (class, touched_block) = classify(line, syntax, &mut block, after_block);
            classes.push(class);
            after_block = class == LineClass::Comment && touched_block;
        }

        if let Some(start) = open_region {
            excluded.push(start..classes.len() + 1);
        }

        Self { classes, excluded }
    }

    /// Opt-out ranges (1-based lines, end exclusive), in file order
    #[inline]
    #[must_use]
    pub fn excluded(&self) -> &[Range<usize>] {
        &self.excluded
    }

    /// Whether 1-based `line` is inside an opt-out region
    #[must_use]
    pub fn is_excluded(&self, line: usize) -> bool {
        self.excluded.iter().any(|r| r.contains(&line))
    }

    /// Class of 1-based `line`; lines past the end are blank
    #[must_use]
    pub fn class(&self, line: usize) -> LineClass {
        line.checked_sub(1)
            .and_then(|i| self.classes.get(i))
            .copied()
            .unwrap_or(LineClass::Blank)
    }

    /// Number of lines
    #[inline]
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.classes.len()
    }

    /// Prefix sums of effective lines: `sums[n]` counts effective lines among `1..=n`
    #[must_use]
    pub fn effective_prefix(&self) -> Vec<usize> {
        let mut sums = Vec::with_capacity(self.classes.len() + 1);
        sums.push(0);
        let mut acc = 0;
        for class in &self.classes {
            if class.is_effective() {
                acc += 1;
            }
            sums.push(acc);
        }
        sums
    }
}

enum Opener {
    Single,
    Multi(usize, usize),
}

fn earliest_opener(text: &str, syntax: &CommentSyntax) -> Option<(usize, Opener)> {
    let single = syntax
        .single_line()
        .iter()
        .filter_map(|p| text.find(p.as_str()).map(|pos| (pos, Opener::Single)));
    let multi = syntax
        .multi_line()
        .iter()
        .enumerate()
        .filter_map(|(i, (start, _))| {
            text.find(start.as_str())
                .map(|pos| (pos, Opener::Multi(i, start.len())))
        });
    // Ties go to the first listed delimiter
    single.chain(multi).fold(None, |best, (pos, opener)| match best {
        Some((best_pos, _)) if best_pos <= pos => best,
        _ => Some((pos, opener)),
    })
}

/// Class of one line, and whether the line was part of a multi-line comment.
/// Continuation prefixes only count right after such a line.
fn classify(
    line: &str,
    syntax: &CommentSyntax,
    block: &mut Option<usize>,
    after_block: bool,
) -> (LineClass, bool) {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return (LineClass::Blank, false);
    }

    if block.is_none()
        && after_block
        && syntax
            .continuation()
            .iter()
            .any(|p| trimmed.starts_with(p.as_str()))
    {
        return (LineClass::Comment, true);
    }

    let mut touched_block = block.is_some();
    let mut has_code = false;
    let mut rest = trimmed;
    loop {
        if let Some(i) = *block {
            let end = syntax.multi_line()[i].1.as_str();
            match rest.find(end) {
                Some(pos) => {
                    rest = &rest[pos + end.len()..];
                    *block = None;
                }
                None => break,
            }
        }

        let r = rest.trim_start();
        if r.is_empty() {
            break;
        }
        match earliest_opener(r, syntax) {
            Some((pos, Opener::Single)) => {
                has_code |= !r[..pos].trim().is_empty();
                break;
            }
            Some((pos, Opener::Multi(i, len))) => {
                has_code |= !r[..pos].trim().is_empty();
                touched_block = true;
                *block = Some(i);
                rest = &r[pos + len..];
            }
            None => {
                has_code = true;
                break;
            }
        }
    }

    let class = if has_code {
        LineClass::Code
    } else {
        LineClass::Comment
    };
    (class, touched_block)
}
