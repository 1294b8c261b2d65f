//! Note template engine
//!
//! Turns a fill-in-the-blank template into alternating literal and
//! placeholder segments, merges per-field values back into one canonical
//! text, and reports completeness.
//!
//! Field keys are positional (`field_<index>` over the split segments) so
//! re-parsing an unchanged template always yields the same keys; leading,
//! trailing and adjacent empty literals count as segments, matching a
//! capturing split. An unfilled placeholder reassembles as its original
//! bracketed text, which keeps "never filled" visibly distinct from "filled
//! with blank-looking text" in the persisted note.

use std::collections::HashMap;

/// Opening bracket of a placeholder span
pub const FIELD_OPEN: char = '【';
/// Closing bracket of a placeholder span
pub const FIELD_CLOSE: char = '】';

/// One segment of a split template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text emitted verbatim (may be empty)
    Literal(String),
    /// Fillable placeholder span
    Field {
        /// Segment index; key is `field_<index>`
        index: usize,
        /// Text between the brackets, shown as the input hint
        placeholder: String,
    },
}

/// A parsed response-format template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteTemplate {
    segments: Vec<Segment>,
}

/// Lookup key for a field segment
pub fn field_key(index: usize) -> String {
    format!("field_{}", index)
}

impl NoteTemplate {
    /// Split a template into literal and placeholder segments.
    ///
    /// Splitting alternates literal / placeholder / literal …, starting and
    /// ending with a (possibly empty) literal. An opening bracket with no
    /// closing bracket stays literal text.
    pub fn parse(template: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = template;

        while let Some(open) = rest.find(FIELD_OPEN) {
            let after_open = open + FIELD_OPEN.len_utf8();
            match rest[after_open..].find(FIELD_CLOSE) {
                Some(close) => {
                    literal.push_str(&rest[..open]);
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    segments.push(Segment::Field {
                        index: segments.len(),
                        placeholder: rest[after_open..after_open + close].to_string(),
                    });
                    rest = &rest[after_open + close + FIELD_CLOSE.len_utf8()..];
                }
                None => break,
            }
        }
        literal.push_str(rest);
        segments.push(Segment::Literal(literal));

        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Indices and placeholder texts of all fields, in order
    pub fn fields(&self) -> impl Iterator<Item = (usize, &str)> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Field { index, placeholder } => Some((*index, placeholder.as_str())),
            Segment::Literal(_) => None,
        })
    }

    pub fn has_fields(&self) -> bool {
        self.fields().next().is_some()
    }

    /// Reassemble the canonical full text from stored field values.
    ///
    /// A field with a non-empty stored value renders as the value surrounded
    /// by single spaces; otherwise the original bracketed placeholder text
    /// is emitted unchanged.
    pub fn assemble(&self, values: &HashMap<String, String>) -> String {
        let mut text = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => text.push_str(literal),
                Segment::Field { index, placeholder } => {
                    match values.get(&field_key(*index)).filter(|v| !v.is_empty()) {
                        Some(value) => {
                            text.push(' ');
                            text.push_str(value);
                            text.push(' ');
                        }
                        None => {
                            text.push(FIELD_OPEN);
                            text.push_str(placeholder);
                            text.push(FIELD_CLOSE);
                        }
                    }
                }
            }
        }
        text
    }

    /// Store one field value and recompute the full text
    pub fn apply_field_value(
        &self,
        values: &HashMap<String, String>,
        index: usize,
        text: &str,
    ) -> (HashMap<String, String>, String) {
        let mut updated = values.clone();
        updated.insert(field_key(index), text.to_string());
        let full = self.assemble(&updated);
        (updated, full)
    }

    /// Completeness check.
    ///
    /// Templates with at least one placeholder require every placeholder to
    /// have a non-empty post-trim value. A template with zero placeholders
    /// falls back to the free-form rule: the raw note must be non-empty
    /// after trimming.
    pub fn is_complete(&self, values: &HashMap<String, String>, raw_note: &str) -> bool {
        if !self.has_fields() {
            return !raw_note.trim().is_empty();
        }
        self.fields().all(|(index, _)| {
            values
                .get(&field_key(index))
                .map(|v| !v.trim().is_empty())
                .unwrap_or(false)
        })
    }
}

/// Completeness for a song that may have no template at all
pub fn is_note_complete(
    response_format: Option<&str>,
    values: &HashMap<String, String>,
    raw_note: &str,
) -> bool {
    match response_format {
        Some(template) => NoteTemplate::parse(template).is_complete(values, raw_note),
        None => !raw_note.trim().is_empty(),
    }
}
