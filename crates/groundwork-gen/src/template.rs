//! Named text templates with `${slot}` placeholders.
//!
//! `$$` writes a literal `$`; a `$` not followed by `{` or `$` is kept as is.
//! Substitution happens in a single pass, so bound values are never re-expanded.

use crate::error::{GenError, GenResult};
use std::collections::HashMap;

/// Slot name → substituted text. Bindings for slots a template does not use are ignored.
pub type Bindings<'a> = HashMap<&'a str, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot(String),
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    name: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(name: &str, source: &str) -> GenResult<Self> {
        let malformed = |detail: String| GenError::MalformedTemplate {
            template: name.to_string(),
            detail,
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = source;
        while let Some(pos) = rest.find('$') {
            literal.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];
            if let Some(stripped) = after.strip_prefix('$') {
                literal.push('$');
                rest = stripped;
            } else if let Some(body) = after.strip_prefix('{') {
                let offset = source.len() - rest.len() + pos;
                let close = body
                    .find('}')
                    .ok_or_else(|| malformed(format!("unclosed slot at byte {offset}")))?;
                let slot = &body[..close];
                let valid = |c: char| c.is_ascii_alphanumeric() || c == '_';
                if slot.is_empty() || !slot.chars().all(valid) {
                    return Err(malformed(format!("invalid slot name '{slot}'")));
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Slot(slot.to_string()));
                rest = &body[close + 1..];
            } else {
                literal.push('$');
                rest = after;
            }
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            name: name.to_string(),
            segments,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Distinct slot names in order of first appearance.
    pub fn slots(&self) -> Vec<&str> {
        let mut slots: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Slot(slot) = segment
                && !slots.contains(&slot.as_str())
            {
                slots.push(slot);
            }
        }
        slots
    }

    /// Substitute every slot. Fails on the first slot without a binding.
    pub fn render(&self, bindings: &Bindings<'_>) -> GenResult<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot(slot) => {
                    let value = bindings.get(slot.as_str()).ok_or_else(|| {
                        GenError::MissingTemplateSlot {
                            template: self.name.clone(),
                            slot: slot.clone(),
                        }
                    })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}
