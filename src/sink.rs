//! Artifact publication.
//!
//! Every artifact name is published at most once per sink. The directory
//! sink writes each file to a temporary sibling and renames it into place,
//! so readers never observe a partially written artifact.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::emit::Artifact;
use crate::error::{GenError, GenResult};

/// Destination for rendered artifacts.
pub trait ArtifactSink {
    /// Publishes one artifact. Publishing a name twice is an error.
    fn publish(&mut self, artifact: &Artifact) -> GenResult<()>;
}

/// Keeps artifacts in memory, keyed by name.
///
/// # Examples
///
/// ```rust
/// use ferrous_di_codegen::emit::{Artifact, ArtifactKind, RenderFormat};
/// use ferrous_di_codegen::sink::{ArtifactSink, MemorySink};
/// use ferrous_di_codegen::GenError;
///
/// let artifact = Artifact::new(ArtifactKind::Bootstrap, RenderFormat::Json, "{}".to_string());
/// let mut sink = MemorySink::new();
/// sink.publish(&artifact).unwrap();
///
/// assert_eq!(sink.get("Bootstrap.json"), Some("{}"));
/// assert!(matches!(sink.publish(&artifact), Err(GenError::DuplicateArtifact(_))));
/// ```
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    artifacts: BTreeMap<String, Artifact>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.artifacts.get(name).map(|a| a.contents.as_str())
    }

    /// Published names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.artifacts.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

impl ArtifactSink for MemorySink {
    fn publish(&mut self, artifact: &Artifact) -> GenResult<()> {
        if self.artifacts.contains_key(&artifact.name) {
            return Err(GenError::DuplicateArtifact(artifact.name.clone()));
        }
        self.artifacts.insert(artifact.name.clone(), artifact.clone());
        Ok(())
    }
}

/// Writes artifacts as files under one directory.
#[derive(Debug)]
pub struct DirectorySink {
    root: PathBuf,
    published: BTreeSet<String>,
}

impl DirectorySink {
    /// Creates the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> GenResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|source| GenError::Io {
            path: root.display().to_string(),
            source,
        })?;
        Ok(Self {
            root,
            published: BTreeSet::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArtifactSink for DirectorySink {
    fn publish(&mut self, artifact: &Artifact) -> GenResult<()> {
        if !self.published.insert(artifact.name.clone()) {
            return Err(GenError::DuplicateArtifact(artifact.name.clone()));
        }
        let path = self.root.join(&artifact.name);
        write_atomically(&path, &artifact.contents)?;
        tracing::debug!(path = %path.display(), bytes = artifact.contents.len(), "published artifact");
        Ok(())
    }
}

/// Writes `contents` to `path` through a temporary file in the same
/// directory, then renames it into place.
pub fn write_atomically(path: &Path, contents: &str) -> GenResult<()> {
    let io_error = |source| GenError::Io {
        path: path.display().to_string(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut file = NamedTempFile::new_in(&dir).map_err(io_error)?;
    file.write_all(contents.as_bytes()).map_err(io_error)?;
    file.flush().map_err(io_error)?;
    file.persist(path).map_err(|e| io_error(e.error))?;
    Ok(())
}
