//! Sandbox Source Provider
//!
//! The boundary through which the orchestrator acquires a project's
//! source tree. A provider clones the tree into memory once and then
//! serves file listings and file contents from the clone, so the
//! sandbox never touches the origin again after `clone_from`.
//!
//! Two implementations ship with the sandbox:
//!
//! - [`LocalDirectorySource`] for project URLs pointing at a local
//!   directory (plain paths or `file://` URLs)
//! - [`FixtureSource`] for tests, built directly from in-memory files
//!
//! Remote transports (git, archives) would implement the same trait.

#![warn(missing_docs)]

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;
use url::Url;

/// Result type for source operations
pub type Result<T> = std::result::Result<T, Error>;

/// Source acquisition error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The project source could not be reached or read.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// A file lookup inside the cloned tree missed.
    #[error("file not found: {0}")]
    NotFound(String),

    /// The provider was queried before a successful clone.
    #[error("no source tree has been cloned")]
    NotCloned,
}

/// One entry of a cloned source tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path relative to the project root, `/`-separated.
    pub path: String,
    /// Whether the entry is a directory.
    #[serde(rename = "isDirectory")]
    pub is_directory: bool,
}

/// The source-tree acquisition boundary.
#[async_trait]
pub trait SourceProvider: Send + Sync {
    /// Clones the project tree at `url` into memory, replacing any
    /// earlier clone.
    async fn clone_from(&mut self, url: &str) -> Result<()>;

    /// Lists every entry of the cloned tree.
    async fn files(&self) -> Result<Vec<SourceFile>>;

    /// Reads one file of the cloned tree.
    async fn read_file(&self, path: &str) -> Result<Vec<u8>>;
}

/// In-memory representation of a cloned tree, shared by the providers.
#[derive(Debug, Default)]
struct SourceTree {
    entries: Vec<SourceFile>,
    contents: HashMap<String, Vec<u8>>,
}

impl SourceTree {
    fn files(&self) -> Vec<SourceFile> {
        self.entries.clone()
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.contents
            .get(path)
            .cloned()
            .ok_or_else(|| Error::NotFound(path.to_string()))
    }
}

/// Serves project URLs that point at a local directory.
#[derive(Debug, Default)]
pub struct LocalDirectorySource {
    tree: Option<SourceTree>,
}

impl LocalDirectorySource {
    /// Creates a provider with no cloned tree.
    pub fn new() -> Self {
        Self::default()
    }

    fn resolve_root(url: &str) -> Result<PathBuf> {
        if let Ok(parsed) = Url::parse(url) {
            if parsed.scheme() == "file" {
                return parsed
                    .to_file_path()
                    .map_err(|_| Error::SourceUnavailable(format!("invalid file URL: {url}")));
            }
            if parsed.scheme().len() > 1 {
                return Err(Error::SourceUnavailable(format!(
                    "unsupported URL scheme '{}' (only local paths and file:// URLs are served)",
                    parsed.scheme()
                )));
            }
        }
        Ok(PathBuf::from(url))
    }

    fn read_tree(root: &Path) -> Result<SourceTree> {
        if !root.is_dir() {
            return Err(Error::SourceUnavailable(format!(
                "not a directory: {}",
                root.display()
            )));
        }
        let mut tree = SourceTree::default();
        Self::walk(root, Path::new(""), &mut tree)?;
        tree.entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(tree)
    }

    fn walk(root: &Path, relative: &Path, tree: &mut SourceTree) -> Result<()> {
        let directory = root.join(relative);
        let entries = std::fs::read_dir(&directory)
            .map_err(|e| Error::SourceUnavailable(format!("{}: {e}", directory.display())))?;
        for entry in entries {
            let entry =
                entry.map_err(|e| Error::SourceUnavailable(format!("{}: {e}", directory.display())))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == ".git" {
                continue;
            }
            let child = relative.join(&name);
            let path = child
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let file_type = entry
                .file_type()
                .map_err(|e| Error::SourceUnavailable(format!("{path}: {e}")))?;
            if file_type.is_dir() {
                tree.entries.push(SourceFile {
                    path: path.clone(),
                    is_directory: true,
                });
                Self::walk(root, &child, tree)?;
            } else if file_type.is_file() {
                let contents = std::fs::read(entry.path())
                    .map_err(|e| Error::SourceUnavailable(format!("{path}: {e}")))?;
                tree.entries.push(SourceFile {
                    path: path.clone(),
                    is_directory: false,
                });
                tree.contents.insert(path, contents);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SourceProvider for LocalDirectorySource {
    async fn clone_from(&mut self, url: &str) -> Result<()> {
        let root = Self::resolve_root(url)?;
        let tree = tokio::task::spawn_blocking(move || Self::read_tree(&root))
            .await
            .map_err(|e| Error::SourceUnavailable(format!("clone task failed: {e}")))??;
        info!(
            target: "sandbox::source",
            url,
            files = tree.contents.len(),
            "cloned project tree"
        );
        self.tree = Some(tree);
        Ok(())
    }

    async fn files(&self) -> Result<Vec<SourceFile>> {
        Ok(self.tree.as_ref().ok_or(Error::NotCloned)?.files())
    }

    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        self.tree.as_ref().ok_or(Error::NotCloned)?.read(path)
    }
}

/// An in-memory provider for tests: the "clone" is whatever files it
/// was constructed with.
#[derive(Debug, Default)]
pub struct FixtureSource {
    tree: SourceTree,
}

impl FixtureSource {
    /// Creates an empty fixture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file to the fixture tree.
    pub fn with_file(mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        let path = path.into();
        self.tree.entries.push(SourceFile {
            path: path.clone(),
            is_directory: false,
        });
        self.tree.contents.insert(path, contents.into());
        self
    }
}

#[async_trait]
impl SourceProvider for FixtureSource {
    async fn clone_from(&mut self, _url: &str) -> Result<()> {
        Ok(())
    }

    async fn files(&self) -> Result<Vec<SourceFile>> {
        Ok(self.tree.files())
    }

    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        self.tree.read(path)
    }
}
