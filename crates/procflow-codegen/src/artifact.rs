// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Generated artifacts and the deduplicating artifact set.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Category of a generated artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtifactCategory {
    /// Process entry point
    Process,
    /// Process instance wrapper
    ProcessInstance,
    /// Input/output/full data model
    Model,
    /// REST resource
    Rest,
    /// Message consumer
    MessageConsumer,
    /// Message producer
    MessageProducer,
    /// Process factory used by the host runtime
    Producer,
    /// Non-source resource (index, copied definitions)
    InternalResource,
}

impl ArtifactCategory {
    /// Get as string
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactCategory::Process => "PROCESS",
            ArtifactCategory::ProcessInstance => "PROCESS_INSTANCE",
            ArtifactCategory::Model => "MODEL",
            ArtifactCategory::Rest => "REST",
            ArtifactCategory::MessageConsumer => "MESSAGE_CONSUMER",
            ArtifactCategory::MessageProducer => "MESSAGE_PRODUCER",
            ArtifactCategory::Producer => "PRODUCER",
            ArtifactCategory::InternalResource => "INTERNAL_RESOURCE",
        }
    }
}

impl std::fmt::Display for ArtifactCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Content of a generated artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactContent {
    /// Source or other text
    Text(String),
    /// Raw bytes (e.g. a copied definition resource)
    Binary(Vec<u8>),
}

impl ArtifactContent {
    /// Content as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ArtifactContent::Text(text) => text.as_bytes(),
            ArtifactContent::Binary(bytes) => bytes,
        }
    }

    /// Content as text, if textual.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ArtifactContent::Text(text) => Some(text),
            ArtifactContent::Binary(_) => None,
        }
    }
}

/// One generated output unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    /// Target path, relative to the output root
    pub path: PathBuf,
    /// Content
    pub content: ArtifactContent,
    /// Category
    pub category: ArtifactCategory,
}

impl GeneratedArtifact {
    /// Create a text artifact.
    pub fn text(path: impl Into<PathBuf>, content: String, category: ArtifactCategory) -> Self {
        Self {
            path: path.into(),
            content: ArtifactContent::Text(content),
            category,
        }
    }

    /// Create a binary artifact.
    pub fn binary(path: impl Into<PathBuf>, content: Vec<u8>, category: ArtifactCategory) -> Self {
        Self {
            path: path.into(),
            content: ArtifactContent::Binary(content),
            category,
        }
    }

    /// Content as text, if textual.
    pub fn as_text(&self) -> Option<&str> {
        self.content.as_text()
    }
}

/// A registration that lost to an artifact already registered at the same path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedArtifact {
    /// The contested path
    pub path: PathBuf,
    /// Category of the artifact that was kept
    pub kept: ArtifactCategory,
    /// Category of the artifact that was dropped
    pub dropped: ArtifactCategory,
}

/// Outcome of [`ArtifactSet::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The artifact was added
    Added,
    /// An artifact already owns the path; the new one was dropped
    Duplicate,
}

/// Output set of a run. The first artifact registered for a path wins.
#[derive(Debug, Default)]
pub struct ArtifactSet {
    artifacts: BTreeMap<PathBuf, GeneratedArtifact>,
    dropped: Vec<DroppedArtifact>,
}

impl ArtifactSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an artifact unless its path is already taken.
    pub fn register(&mut self, artifact: GeneratedArtifact) -> Registration {
        if let Some(existing) = self.artifacts.get(&artifact.path) {
            warn!(
                path = %artifact.path.display(),
                kept = %existing.category,
                dropped = %artifact.category,
                "Artifact path already generated; dropping the later artifact"
            );
            self.dropped.push(DroppedArtifact {
                path: artifact.path,
                kept: existing.category,
                dropped: artifact.category,
            });
            return Registration::Duplicate;
        }
        self.artifacts.insert(artifact.path.clone(), artifact);
        Registration::Added
    }

    /// Check whether a path is taken.
    pub fn contains(&self, path: &Path) -> bool {
        self.artifacts.contains_key(path)
    }

    /// Look up an artifact by path.
    pub fn get(&self, path: &Path) -> Option<&GeneratedArtifact> {
        self.artifacts.get(path)
    }

    /// Number of artifacts.
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// Returns true if the set holds no artifacts.
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Artifacts ordered by path.
    pub fn iter(&self) -> impl Iterator<Item = &GeneratedArtifact> {
        self.artifacts.values()
    }

    /// Artifacts of one category, ordered by path.
    pub fn by_category(
        &self,
        category: ArtifactCategory,
    ) -> impl Iterator<Item = &GeneratedArtifact> {
        self.artifacts
            .values()
            .filter(move |a| a.category == category)
    }

    /// Registrations dropped because their path was taken.
    pub fn dropped(&self) -> &[DroppedArtifact] {
        &self.dropped
    }

    /// SHA-256 over every path and content, in path order.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for artifact in self.artifacts.values() {
            hasher.update(artifact.path.to_string_lossy().as_bytes());
            hasher.update([0u8]);
            hasher.update(artifact.content.as_bytes());
            hasher.update([0u8]);
        }
        format!("{:x}", hasher.finalize())
    }

    /// Write every artifact below `root`, creating directories as needed.
    pub fn write_to(&self, root: &Path) -> io::Result<usize> {
        for artifact in self.artifacts.values() {
            let target = root.join(&artifact.path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, artifact.content.as_bytes())?;
        }
        Ok(self.artifacts.len())
    }

    /// Consume the set, returning artifacts ordered by path.
    pub fn into_vec(self) -> Vec<GeneratedArtifact> {
        self.artifacts.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(path: &str, body: &str, category: ArtifactCategory) -> GeneratedArtifact {
        GeneratedArtifact::text(path, body.to_string(), category)
    }

    #[test]
    fn test_first_registration_wins() {
        let mut set = ArtifactSet::new();
        assert_eq!(
            set.register(source("a/x.rs", "first", ArtifactCategory::Process)),
            Registration::Added
        );
        assert_eq!(
            set.register(source("a/x.rs", "second", ArtifactCategory::Model)),
            Registration::Duplicate
        );

        assert_eq!(set.len(), 1);
        let kept = set.get(Path::new("a/x.rs")).unwrap();
        assert_eq!(kept.as_text(), Some("first"));
        assert_eq!(kept.category, ArtifactCategory::Process);

        assert_eq!(
            set.dropped(),
            &[DroppedArtifact {
                path: PathBuf::from("a/x.rs"),
                kept: ArtifactCategory::Process,
                dropped: ArtifactCategory::Model,
            }]
        );
    }

    #[test]
    fn test_iteration_is_path_ordered() {
        let mut set = ArtifactSet::new();
        set.register(source("b.rs", "", ArtifactCategory::Model));
        set.register(source("a.rs", "", ArtifactCategory::Process));
        let paths: Vec<_> = set.iter().map(|a| a.path.clone()).collect();
        assert_eq!(paths, vec![PathBuf::from("a.rs"), PathBuf::from("b.rs")]);
        assert_eq!(set.by_category(ArtifactCategory::Model).count(), 1);
    }

    #[test]
    fn test_fingerprint_depends_on_content() {
        let mut a = ArtifactSet::new();
        a.register(source("x.rs", "one", ArtifactCategory::Process));
        let mut b = ArtifactSet::new();
        b.register(source("x.rs", "two", ArtifactCategory::Process));

        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn test_write_to_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let mut set = ArtifactSet::new();
        set.register(source("com/acme/x.rs", "fn main() {}", ArtifactCategory::Process));
        set.register(GeneratedArtifact::binary(
            "resources/x.json",
            vec![1, 2, 3],
            ArtifactCategory::InternalResource,
        ));

        let written = set.write_to(dir.path()).unwrap();
        assert_eq!(written, 2);
        assert_eq!(
            fs::read_to_string(dir.path().join("com/acme/x.rs")).unwrap(),
            "fn main() {}"
        );
        assert_eq!(fs::read(dir.path().join("resources/x.json")).unwrap(), vec![1, 2, 3]);
    }
}
