//! Remote content API used by the blob-backed stores.
//!
//! The stores only see [`ContentApi`]; [`GitlabClient`] is the production
//! implementation.

pub mod error;
pub mod gitlab;

use serde::Serialize;

pub use error::RemoteError;
pub use gitlab::GitlabClient;

/// Content of a snippet as written by the snippet store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetFile {
    pub title: String,
    pub visibility: String,
    pub file_name: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitActionKind {
    Create,
    Update,
}

/// One file change of a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitAction {
    pub action: CommitActionKind,
    pub file_path: String,
    pub content: String,
}

/// Version-controlled content storage.
///
/// Implementations report a missing object as [`RemoteError::NotFound`].
pub trait ContentApi {
    /// Raw content of a project snippet.
    fn snippet_content(&self, project: u64, snippet_id: u64) -> Result<String, RemoteError>;

    /// Create a snippet and return its id.
    fn create_snippet(&self, project: u64, snippet: &SnippetFile) -> Result<u64, RemoteError>;

    /// Replace the content of an existing snippet.
    fn update_snippet(
        &self,
        project: u64,
        snippet_id: u64,
        snippet: &SnippetFile,
    ) -> Result<(), RemoteError>;

    /// Raw content of a repository file on `branch`.
    fn file_contents(&self, project: u64, path: &str, branch: &str) -> Result<String, RemoteError>;

    /// Create a commit on `branch` applying `actions`.
    fn create_commit(
        &self,
        project: u64,
        branch: &str,
        message: &str,
        actions: &[CommitAction],
    ) -> Result<(), RemoteError>;
}
