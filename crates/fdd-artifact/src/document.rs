//! Structural document model
//!
//! A [`Document`] owns the artifact text once and indexes it by line:
//! sections, fields, subsections, identifier occurrences and FDL steps all
//! refer back to 1-based line numbers, never to copied slices.
//!
//! # Example
//!
//! ```rust
//! use fdd_artifact::{ArtifactKind, Document};
//!
//! let doc = Document::parse(
//!     ArtifactKind::FeatureDesign,
//!     "## B. Actor Flows\n- [x] **ID**: `ns-feature-a-flow-login`\n",
//! );
//! assert_eq!(doc.sections().len(), 1);
//! assert_eq!(doc.definitions().count(), 1);
//! ```

use crate::error::IdentifierError;
use crate::id::{Identifier, ScopeRef};
use crate::kind::ArtifactKind;
use crate::lexer::{tokenize, HeadingLabel, LexedLine, LineEvent};
use crate::rules::is_known_field;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};
use std::ops::Range;

static BACKTICK_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`\s]+)`").expect("valid regex"));

/// Label of a top-level section
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum SectionLabel {
    /// `## X. Title`
    Letter(char),
    /// `## Change N: Title`
    Change(u32),
}

impl Display for SectionLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SectionLabel::Letter(c) => write!(f, "{c}"),
            SectionLabel::Change(n) => write!(f, "Change {n}"),
        }
    }
}

/// Top-level section
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    /// Section label
    pub label: SectionLabel,
    /// Heading title
    pub title: String,
    /// Heading line
    pub line: usize,
    /// First line after the section
    pub end: usize,
    /// Recognized fields, in order
    pub fields: Vec<Field>,
    /// `### N. Title` subsections, in order
    pub subsections: Vec<Subsection>,
}

impl Section {
    /// Line range covered by the section, heading included
    #[inline]
    #[must_use]
    pub fn lines(&self) -> Range<usize> {
        self.line..self.end
    }

    /// Subsection containing `line`
    #[must_use]
    pub fn subsection_at(&self, line: usize) -> Option<&Subsection> {
        self.subsections.iter().find(|s| s.lines().contains(&line))
    }

    /// First field with the given name
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Numbered subsection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subsection {
    /// Number from the heading
    pub number: u32,
    /// Heading title
    pub title: String,
    /// Heading line
    pub line: usize,
    /// First line after the subsection
    pub end: usize,
}

impl Subsection {
    /// Line range covered by the subsection, heading included
    #[inline]
    #[must_use]
    pub fn lines(&self) -> Range<usize> {
        self.line..self.end
    }
}

/// `**Name**: value` entry with its continuation lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    /// Field name
    pub name: String,
    /// Inline value
    pub value: String,
    /// Checkbox state when the field line carries one
    pub checkbox: Option<bool>,
    /// Field line
    pub line: usize,
    /// 1-based column of the value
    pub column: usize,
    /// Continuation lines (1-based, end exclusive)
    pub tail: Range<usize>,
}

/// Heading that is not part of the kind's section grammar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnknownHeading {
    /// Heading line
    pub line: usize,
    /// Heading text
    pub title: String,
}

/// One place an identifier appears
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdOccurrence {
    /// The identifier
    pub identifier: Identifier,
    /// Line
    pub line: usize,
    /// 1-based column of the token
    pub column: usize,
    /// True on a checkbox-wrapped `**ID**:` line
    pub definition: bool,
    /// Checkbox state (definitions only)
    pub checked: bool,
    /// Enclosing section
    pub section: Option<SectionLabel>,
}

/// `**ID**:` value that is not a valid identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MalformedId {
    /// Offending text
    pub text: String,
    /// Line
    pub line: usize,
    /// 1-based column
    pub column: usize,
    /// Parse failure
    #[serde(serialize_with = "serialize_display")]
    pub error: IdentifierError,
}

/// FDL step attached to the nearest preceding definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    /// Owning definition, if any precedes the step in its section
    pub scope: Option<Identifier>,
    /// Whether the owning definition is checked
    pub scope_checked: bool,
    /// Whether the step itself is checked
    pub checked: bool,
    /// Phase number
    pub phase: u32,
    /// Instruction slug
    pub instruction: String,
    /// Line
    pub line: usize,
}

impl Step {
    /// Scope reference `<scope>:ph-N:inst-X`, when the step has a scope
    #[must_use]
    pub fn scope_ref(&self) -> Option<ScopeRef> {
        self.scope
            .as_ref()
            .map(|s| ScopeRef::new(s.clone(), Some(self.phase), Some(self.instruction.clone())))
    }
}

/// Parsed artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    kind: ArtifactKind,
    text: String,
    lines: Vec<LexedLine>,
    preamble: Vec<Field>,
    sections: Vec<Section>,
    unknown_headings: Vec<UnknownHeading>,
    ids: Vec<IdOccurrence>,
    malformed: Vec<MalformedId>,
    steps: Vec<Step>,
}

impl Document {
    /// Parse artifact text; never fails
    #[must_use]
    pub fn parse(kind: ArtifactKind, text: impl Into<String>) -> Self {
        let text = text.into();
        let lines = tokenize(&text);
        let mut builder = Builder::new(kind);

        for lexed in &lines {
            builder.feed(&text[lexed.span.clone()], lexed);
        }
        let end = lines.len() + 1;
        builder.finish(end);

        Self {
            kind,
            text,
            lines,
            preamble: builder.preamble,
            sections: builder.sections,
            unknown_headings: builder.unknown_headings,
            ids: builder.ids,
            malformed: builder.malformed,
            steps: builder.steps,
        }
    }

    /// Artifact kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// Full source text
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of lines
    #[inline]
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Text of a 1-based line
    #[must_use]
    pub fn line(&self, line: usize) -> Option<&str> {
        line.checked_sub(1)
            .and_then(|i| self.lines.get(i))
            .map(|l| &self.text[l.span.clone()])
    }

    /// Lexed lines
    #[inline]
    #[must_use]
    pub fn events(&self) -> &[LexedLine] {
        &self.lines
    }

    /// Fields before the first section
    #[inline]
    #[must_use]
    pub fn preamble_fields(&self) -> &[Field] {
        &self.preamble
    }

    /// Sections in document order
    #[inline]
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// First section with the given letter
    #[must_use]
    pub fn section(&self, letter: char) -> Option<&Section> {
        self.sections
            .iter()
            .find(|s| s.label == SectionLabel::Letter(letter))
    }

    /// Section containing `line`
    #[must_use]
    pub fn section_at(&self, line: usize) -> Option<&Section> {
        self.sections.iter().find(|s| s.lines().contains(&line))
    }

    /// Level-2 headings outside the section grammar
    #[inline]
    #[must_use]
    pub fn unknown_headings(&self) -> &[UnknownHeading] {
        &self.unknown_headings
    }

    /// Every identifier occurrence
    #[inline]
    #[must_use]
    pub fn ids(&self) -> &[IdOccurrence] {
        &self.ids
    }

    /// Definition occurrences
    pub fn definitions(&self) -> impl Iterator<Item = &IdOccurrence> {
        self.ids.iter().filter(|o| o.definition)
    }

    /// Reference occurrences
    pub fn references(&self) -> impl Iterator<Item = &IdOccurrence> {
        self.ids.iter().filter(|o| !o.definition)
    }

    /// Set of identifiers defined in this document
    #[must_use]
    pub fn defined_ids(&self) -> BTreeSet<&str> {
        self.definitions().map(|o| o.identifier.as_str()).collect()
    }

    /// Malformed `**ID**:` values
    #[inline]
    #[must_use]
    pub fn malformed_ids(&self) -> &[MalformedId] {
        &self.malformed
    }

    /// FDL steps
    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Continuation lines of a field, trimmed and without list bullets
    #[must_use]
    pub fn field_items<'a>(&'a self, field: &'a Field) -> Vec<&'a str> {
        let mut items: Vec<&str> = field
            .value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        items.extend(
            field
                .tail
                .clone()
                .filter_map(|l| self.line(l))
                .map(strip_bullet)
                .filter(|s| !s.is_empty()),
        );
        items
    }
}

fn strip_bullet(line: &str) -> &str {
    let t = line.trim();
    if let Some(rest) = t.strip_prefix("- ").or_else(|| t.strip_prefix("* ")) {
        return rest.trim();
    }
    match t.split_once(". ") {
        Some((n, rest)) if !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()) => rest.trim(),
        _ => t,
    }
}

fn serialize_display<S: serde::Serializer>(
    value: &IdentifierError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Single-pass accumulator over lexed lines
struct Builder {
    kind: ArtifactKind,
    preamble: Vec<Field>,
    sections: Vec<Section>,
    current: Option<Section>,
    subsection: Option<Subsection>,
    field: Option<Field>,
    definition: Option<(Identifier, bool)>,
    unknown_headings: Vec<UnknownHeading>,
    ids: Vec<IdOccurrence>,
    malformed: Vec<MalformedId>,
    steps: Vec<Step>,
}

impl Builder {
    fn new(kind: ArtifactKind) -> Self {
        Self {
            kind,
            preamble: Vec::new(),
            sections: Vec::new(),
            current: None,
            subsection: None,
            field: None,
            definition: None,
            unknown_headings: Vec::new(),
            ids: Vec::new(),
            malformed: Vec::new(),
            steps: Vec::new(),
        }
    }

    fn feed(&mut self, text: &str, lexed: &LexedLine) {
        let line = lexed.line;
        match &lexed.event {
            LineEvent::Heading {
                level,
                label,
                title,
            } => {
                self.close_field(line);
                self.definition = None;
                match label {
                    HeadingLabel::Letter(c) => {
                        self.open_section(SectionLabel::Letter(*c), title, line);
                    }
                    HeadingLabel::Change(n) => {
                        self.open_section(SectionLabel::Change(*n), title, line);
                    }
                    HeadingLabel::Numbered(n) => {
                        self.close_subsection(line);
                        if self.current.is_some() {
                            self.subsection = Some(Subsection {
                                number: *n,
                                title: title.clone(),
                                line,
                                end: line + 1,
                            });
                        }
                    }
                    HeadingLabel::Plain if *level <= 2 => {
                        self.close_section(line);
                        if *level == 2 {
                            self.unknown_headings.push(UnknownHeading {
                                line,
                                title: title.clone(),
                            });
                        }
                    }
                    HeadingLabel::Plain => {}
                }
                self.extract_references(text, line, None);
            }
            LineEvent::Field {
                name,
                value,
                checkbox,
                value_column,
            } if is_known_field(self.kind, name) => {
                self.close_field(line);
                self.field = Some(Field {
                    name: name.clone(),
                    value: value.clone(),
                    checkbox: *checkbox,
                    line,
                    column: value_column + 1,
                    tail: line + 1..line + 1,
                });

                let skip = if name == "ID" && checkbox.is_some() {
                    self.define(value, *value_column, checkbox.unwrap_or(false), line)
                } else {
                    None
                };
                self.extract_references(text, line, skip);
            }
            LineEvent::Step {
                checked,
                phase,
                instruction,
                ..
            } => {
                let (scope, scope_checked) = match &self.definition {
                    Some((id, checked)) => (Some(id.clone()), *checked),
                    None => (None, false),
                };
                self.steps.push(Step {
                    scope,
                    scope_checked,
                    checked: *checked,
                    phase: *phase,
                    instruction: instruction.clone(),
                    line,
                });
                self.extract_references(text, line, None);
            }
            LineEvent::Field { .. } | LineEvent::Text => {
                self.extract_references(text, line, None);
            }
            LineEvent::Fence | LineEvent::FencedCode | LineEvent::Blank => {}
        }
    }

    /// Record a definition; returns the byte column of the id token to skip
    fn define(&mut self, value: &str, value_column: usize, checked: bool, line: usize) -> Option<usize> {
        let (token, offset) = match BACKTICK_SPAN.captures(value) {
            Some(c) => {
                let m = c.get(1)?;
                (m.as_str(), m.start())
            }
            None => {
                let trimmed = value.trim_start();
                let word = trimmed.split_whitespace().next().unwrap_or("");
                let unticked = word.trim_start_matches('`');
                let lead = value.len() - trimmed.len() + (word.len() - unticked.len());
                (unticked.trim_end_matches('`'), lead)
            }
        };
        let column = value_column + offset;

        match Identifier::parse(token) {
            Ok(identifier) => {
                self.definition = Some((identifier.clone(), checked));
                self.ids.push(IdOccurrence {
                    identifier,
                    line,
                    column: column + 1,
                    definition: true,
                    checked,
                    section: self.current.as_ref().map(|s| s.label),
                });
            }
            Err(error) => {
                self.definition = None;
                self.malformed.push(MalformedId {
                    text: token.to_string(),
                    line,
                    column: column + 1,
                    error,
                });
            }
        }
        Some(column)
    }

    fn extract_references(&mut self, text: &str, line: usize, skip: Option<usize>) {
        for c in BACKTICK_SPAN.captures_iter(text) {
            let Some(m) = c.get(1) else { continue };
            if Some(m.start()) == skip {
                continue;
            }
            let token = m.as_str();
            let parsed = if token.contains(':') {
                ScopeRef::parse(token).map(|r| r.base().clone())
            } else {
                Identifier::parse(token)
            };
            if let Ok(identifier) = parsed {
                self.ids.push(IdOccurrence {
                    identifier,
                    line,
                    column: m.start() + 1,
                    definition: false,
                    checked: false,
                    section: self.current.as_ref().map(|s| s.label),
                });
            }
        }
    }

    fn open_section(&mut self, label: SectionLabel, title: &str, line: usize) {
        self.close_section(line);
        self.current = Some(Section {
            label,
            title: title.to_string(),
            line,
            end: line + 1,
            fields: Vec::new(),
            subsections: Vec::new(),
        });
    }

    fn close_field(&mut self, line: usize) {
        if let Some(mut field) = self.field.take() {
            field.tail = field.line + 1..line;
            match self.current.as_mut() {
                Some(section) => section.fields.push(field),
                None => self.preamble.push(field),
            }
        }
    }

    fn close_subsection(&mut self, line: usize) {
        if let Some(mut sub) = self.subsection.take() {
            sub.end = line;
            if let Some(section) = self.current.as_mut() {
                section.subsections.push(sub);
            }
        }
    }

    fn close_section(&mut self, line: usize) {
        self.close_field(line);
        self.close_subsection(line);
        if let Some(mut section) = self.current.take() {
            section.end = line;
            self.sections.push(section);
        }
    }

    fn finish(&mut self, end: usize) {
        self.close_section(end);
    }
}
