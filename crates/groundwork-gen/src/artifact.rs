//! Generated artifacts and how they land on disk.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Component, Path};

/// Written after every artifact; a directory without it is an incomplete run.
pub const MANIFEST_FILE: &str = "manifest.json";

/// One generated file, addressed by a relative path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub name: String,
    pub content: String,
}

impl Artifact {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn sha256(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.content.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// All artifacts of a run, sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactSet {
    artifacts: Vec<Artifact>,
}

impl ArtifactSet {
    pub fn new(mut artifacts: Vec<Artifact>) -> Self {
        artifacts.sort_by(|a, b| a.name.cmp(&b.name));
        Self { artifacts }
    }

    pub fn get(&self, name: &str) -> Option<&Artifact> {
        self.artifacts
            .binary_search_by(|a| a.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.artifacts[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.artifacts.iter().map(|a| a.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn manifest(&self) -> Manifest {
        Manifest {
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: Utc::now().to_rfc3339(),
            artifacts: self
                .artifacts
                .iter()
                .map(|a| ManifestEntry {
                    name: a.name.clone(),
                    sha256: a.sha256(),
                    bytes: a.content.len(),
                })
                .collect(),
        }
    }

    /// Write every artifact under `dir`, then the manifest.
    ///
    /// The previous run's manifest is removed before the first write, so an
    /// interrupted run leaves no manifest behind. Files that manifest listed
    /// and this set no longer produces are deleted.
    pub fn write_to(&self, dir: &Path) -> Result<Manifest> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
        self.clear_previous_run(dir)?;

        for artifact in &self.artifacts {
            let path = dir.join(&artifact.name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create directory {}", parent.display()))?;
            }
            fs::write(&path, &artifact.content)
                .with_context(|| format!("failed to write artifact {}", path.display()))?;
        }

        let manifest = self.manifest();
        let json =
            serde_json::to_string_pretty(&manifest).context("failed to serialize manifest")?;
        let path = dir.join(MANIFEST_FILE);
        fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!("wrote {} artifacts to {}", self.artifacts.len(), dir.display());
        Ok(manifest)
    }

    fn clear_previous_run(&self, dir: &Path) -> Result<()> {
        let path = dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(());
        }
        let previous: Option<Manifest> = fs::read_to_string(&path)
            .ok()
            .and_then(|json| serde_json::from_str(&json).ok());
        fs::remove_file(&path)
            .with_context(|| format!("failed to remove stale {}", path.display()))?;

        let Some(previous) = previous else {
            tracing::warn!("ignoring unreadable manifest in {}", dir.display());
            return Ok(());
        };
        for entry in previous.artifacts {
            let relative = Path::new(&entry.name)
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
            if !relative || self.get(&entry.name).is_some() {
                continue;
            }
            let stale = dir.join(&entry.name);
            if stale.is_file() {
                fs::remove_file(&stale)
                    .with_context(|| format!("failed to remove stale {}", stale.display()))?;
                tracing::debug!("removed stale artifact {}", entry.name);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub generated_at: String,
    pub artifacts: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub sha256: String,
    pub bytes: usize,
}
