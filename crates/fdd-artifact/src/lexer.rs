//! Line lexer
//!
//! Turns artifact text into a flat list of `(line, event)` pairs. Both the
//! section splitter and the identifier extractor consume this list, so
//! they always agree on line numbers.

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

static LETTER_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^##\s+([A-Z])\.\s+(.*?)\s*$").expect("valid regex"));
static CHANGE_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^##\s+Change\s+(\d+):\s*(.*?)\s*$").expect("valid regex"));
static NUMBERED_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^###\s+(\d+)\.\s+(.*?)\s*$").expect("valid regex"));
static PLAIN_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.*?)\s*$").expect("valid regex"));
static STEP_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:\d+\.|[-*])\s+\[([ xX])\]\s+-\s+`ph-(\d+)`\s+-\s+(.*?)\s+-\s+`inst-([a-z0-9]+(?:-[a-z0-9]+)*)`\s*$",
    )
    .expect("valid regex")
});
static FIELD_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:(?:[-*]|\d+\.)\s+)?(?:\[([ xX])\]\s+)?\*\*([^*]+?)\*\*:\s*(.*?)\s*$")
        .expect("valid regex")
});
static FENCE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(```|~~~)").expect("valid regex"));

/// Label of a heading line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadingLabel {
    /// `## X. Title`
    Letter(char),
    /// `## Change N: Title`
    Change(u32),
    /// `### N. Title`
    Numbered(u32),
    /// Any other heading
    Plain,
}

/// One classified line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// Heading line
    Heading {
        /// Number of leading `#`
        level: u8,
        /// Recognized label
        label: HeadingLabel,
        /// Heading text after the label
        title: String,
    },
    /// `**Name**: value`, optionally behind a bullet and a checkbox
    Field {
        /// Field name between the `**`
        name: String,
        /// Inline value (may be empty)
        value: String,
        /// Checkbox state when the line carries one
        checkbox: Option<bool>,
        /// Byte column of the value start within the line
        value_column: usize,
    },
    /// FDL step: `N. [ ] - \`ph-N\` - prose - \`inst-X\``
    Step {
        /// Whether the step is checked
        checked: bool,
        /// Phase number
        phase: u32,
        /// Instruction slug without the `inst-` prefix
        instruction: String,
        /// Prose between phase and instruction
        text: String,
    },
    /// Opening or closing code fence
    Fence,
    /// Line inside a fenced code block
    FencedCode,
    /// Empty or whitespace-only line
    Blank,
    /// Any other text
    Text,
}

/// Line with its event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexedLine {
    /// 1-based line number
    pub line: usize,
    /// Byte range of the line in the source (without the newline)
    pub span: Range<usize>,
    /// Classification
    pub event: LineEvent,
}

/// Split text into line byte ranges (without line terminators)
#[must_use]
pub fn line_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut start = 0;
    for (i, b) in text.bytes().enumerate() {
        if b == b'\n' {
            let end = if i > start && text.as_bytes()[i - 1] == b'\r' {
                i - 1
            } else {
                i
            };
            spans.push(start..end);
            start = i + 1;
        }
    }
    if start < text.len() {
        spans.push(start..text.len());
    }
    spans
}

/// Classify a single line outside of fenced code
#[must_use]
pub fn classify(line: &str) -> LineEvent {
    if line.trim().is_empty() {
        return LineEvent::Blank;
    }

    if line.starts_with('#') {
        if let Some(c) = LETTER_HEADING.captures(line) {
            return LineEvent::Heading {
                level: 2,
                label: HeadingLabel::Letter(c[1].chars().next().unwrap_or('?')),
                title: c[2].to_string(),
            };
        }
        if let Some(c) = CHANGE_HEADING.captures(line) {
            if let Ok(n) = c[1].parse() {
                return LineEvent::Heading {
                    level: 2,
                    label: HeadingLabel::Change(n),
                    title: c[2].to_string(),
                };
            }
        }
        if let Some(c) = NUMBERED_HEADING.captures(line) {
            if let Ok(n) = c[1].parse() {
                return LineEvent::Heading {
                    level: 3,
                    label: HeadingLabel::Numbered(n),
                    title: c[2].to_string(),
                };
            }
        }
        if let Some(c) = PLAIN_HEADING.captures(line) {
            return LineEvent::Heading {
                level: u8::try_from(c[1].len()).unwrap_or(6),
                label: HeadingLabel::Plain,
                title: c[2].to_string(),
            };
        }
    }

    if let Some(c) = STEP_LINE.captures(line) {
        if let Ok(phase) = c[2].parse() {
            return LineEvent::Step {
                checked: &c[1] != " ",
                phase,
                instruction: c[4].to_string(),
                text: c[3].to_string(),
            };
        }
    }

    if let Some(c) = FIELD_LINE.captures(line) {
        let value = c.get(3).map_or("", |m| m.as_str());
        return LineEvent::Field {
            name: c[2].trim().to_string(),
            value: value.to_string(),
            checkbox: c.get(1).map(|m| m.as_str() != " "),
            value_column: c.get(3).map_or(line.len(), |m| m.start()),
        };
    }

    LineEvent::Text
}

/// Lex a whole document
#[must_use]
pub fn tokenize(text: &str) -> Vec<LexedLine> {
    let mut in_fence = false;
    line_spans(text)
        .into_iter()
        .enumerate()
        .map(|(idx, span)| {
            let line = &text[span.clone()];
            let event = if FENCE_LINE.is_match(line) {
                in_fence = !in_fence;
                LineEvent::Fence
            } else if in_fence {
                LineEvent::FencedCode
            } else {
                classify(line)
            };
            LexedLine {
                line: idx + 1,
                span,
                event,
            }
        })
        .collect()
}
