//! Dense object ids, with the two boolean tokens reserved first.

use std::collections::HashMap;

/// Lexical token for boolean false in every emitted artifact.
pub const FALSE_TOKEN: &str = "_false_";
/// Lexical token for boolean true in every emitted artifact.
pub const TRUE_TOKEN: &str = "_true_";

pub fn bool_token(value: bool) -> &'static str {
    if value { TRUE_TOKEN } else { FALSE_TOKEN }
}

/// Bijection between object names and ids.
#[derive(Debug, Clone)]
pub struct ObjectIndex {
    names: Vec<String>,
    ids: HashMap<String, usize>,
}

impl ObjectIndex {
    pub fn new<'a>(objects: impl IntoIterator<Item = &'a String>) -> Self {
        let mut index = Self {
            names: Vec::new(),
            ids: HashMap::new(),
        };
        for name in [FALSE_TOKEN, TRUE_TOKEN] {
            index.insert(name);
        }
        for name in objects {
            index.insert(name);
        }
        index
    }

    // Redeclared objects keep their first id.
    fn insert(&mut self, name: &str) {
        if !self.ids.contains_key(name) {
            self.ids.insert(name.to_string(), self.names.len());
            self.names.push(name.to_string());
        }
    }

    pub fn id(&self, name: &str) -> Option<usize> {
        self.ids.get(name).copied()
    }

    pub fn name(&self, id: usize) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// One object per line, id = line number.
    pub fn to_listing(&self) -> String {
        let mut out = String::new();
        for name in &self.names {
            out.push_str(name);
            out.push('\n');
        }
        out
    }
}
