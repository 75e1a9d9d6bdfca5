//! Template store: built-in templates plus optional on-disk overrides.

use crate::error::{GenError, GenResult};
use crate::template::Template;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Templates compiled into the binary, by name.
pub const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("action", include_str!("../templates/action.tpl")),
    ("constraint", include_str!("../templates/constraint.tpl")),
    ("components", include_str!("../templates/components.tpl")),
    ("holds_unary", include_str!("../templates/holds_unary.tpl")),
    ("holds_nary", include_str!("../templates/holds_nary.tpl")),
    ("term_value", include_str!("../templates/term_value.tpl")),
    ("effect", include_str!("../templates/effect.tpl")),
    ("constraint_check", include_str!("../templates/constraint_check.tpl")),
    (
        "static_constraint_check",
        include_str!("../templates/static_constraint_check.tpl"),
    ),
];

/// Resolves template names to parsed templates, at most once per name.
///
/// A file `<override_dir>/<name>.tpl` takes precedence over the built-in
/// template of the same name. The cache is shared by reference across
/// generation workers.
#[derive(Debug, Default)]
pub struct TemplateCache {
    override_dir: Option<PathBuf>,
    entries: Mutex<HashMap<String, Arc<Template>>>,
    disk_reads: AtomicUsize,
}

impl TemplateCache {
    pub fn new(override_dir: Option<PathBuf>) -> Self {
        Self {
            override_dir,
            ..Self::default()
        }
    }

    pub fn builtin() -> Self {
        Self::new(None)
    }

    pub fn override_dir(&self) -> Option<&Path> {
        self.override_dir.as_deref()
    }

    /// Look up a template, loading and parsing it on first use.
    ///
    /// The lock is held while populating, so concurrent first requests for
    /// the same name read the override file once.
    pub fn get(&self, name: &str) -> GenResult<Arc<Template>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(template) = entries.get(name) {
            return Ok(Arc::clone(template));
        }

        let template = Arc::new(self.load(name)?);
        entries.insert(name.to_string(), Arc::clone(&template));
        Ok(template)
    }

    fn load(&self, name: &str) -> GenResult<Template> {
        if let Some(dir) = &self.override_dir {
            let path = dir.join(format!("{name}.tpl"));
            if path.is_file() {
                let source = std::fs::read_to_string(&path)
                    .map_err(|source| GenError::TemplateIo { path: path.clone(), source })?;
                self.disk_reads.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("template '{}' loaded from {}", name, path.display());
                return Template::parse(name, &source);
            }
        }

        let source =
            builtin_source(name).ok_or_else(|| GenError::UnknownTemplate(name.to_string()))?;
        Template::parse(name, source)
    }

    /// Number of override files read so far.
    pub fn disk_reads(&self) -> usize {
        self.disk_reads.load(Ordering::Relaxed)
    }
}

pub fn builtin_source(name: &str) -> Option<&'static str> {
    BUILTIN_TEMPLATES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, source)| *source)
}

pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    BUILTIN_TEMPLATES.iter().map(|(name, _)| *name)
}
