use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::credentials::SecureString;

/// Root configuration consumed from the driver.
#[derive(Debug, Clone, Deserialize)]
pub struct DriverConfig {
    /// Pool to lease from when the caller does not name one.
    #[serde(default = "default_pool_name")]
    pub pool_name: String,
    /// Which backend persists the pools.
    #[serde(default)]
    pub state_store: StoreKind,
    /// Backend-specific options, parsed into a typed struct by
    /// [`DriverConfig::store_options`](crate::config::DriverConfig::store_options).
    #[serde(default)]
    pub store_options: toml::Table,
    /// Return members to the pool on release instead of retiring them.
    /// Only the file and blob stores honor this.
    #[serde(default)]
    pub reuse_instances: bool,
}

/// Backend selector tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    #[default]
    File,
    GitlabSnippet,
    GitlabCommit,
    Vmpooler,
}

impl StoreKind {
    /// Stable config tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::GitlabSnippet => "gitlab_snippet",
            Self::GitlabCommit => "gitlab_commit",
            Self::Vmpooler => "vmpooler",
        }
    }

    pub fn all() -> &'static [StoreKind] {
        &[
            Self::File,
            Self::GitlabSnippet,
            Self::GitlabCommit,
            Self::Vmpooler,
        ]
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options of the local file store.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileStoreOptions {
    /// Path of the YAML pool document.
    #[serde(default = "default_pool_file")]
    pub pool_file: PathBuf,
    /// Serialize mutations across processes with an advisory lock file.
    #[serde(default = "default_true")]
    pub lock: bool,
}

/// Connection settings for the remote content API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitlabOptions {
    /// API root, e.g. `https://gitlab.com/api/v4`. Falls back to `GITLAB_API_ENDPOINT`.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Falls back to `GITLAB_API_PRIVATE_TOKEN`.
    #[serde(default)]
    pub private_token: Option<SecureString>,
}

/// Options of the snippet-backed store.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnippetStoreOptions {
    pub project_id: u64,
    /// Existing snippet holding the pools. A new snippet is created when unset.
    #[serde(default)]
    pub snippet_id: Option<u64>,
    #[serde(default = "default_remote_pool_file")]
    pub pool_file: String,
    #[serde(default = "default_snippet_title")]
    pub title: String,
    #[serde(default = "default_snippet_visibility")]
    pub visibility: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub private_token: Option<SecureString>,
}

/// Options of the commit-backed store.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommitStoreOptions {
    pub project_id: u64,
    #[serde(default = "default_remote_pool_file")]
    pub pool_file: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_commit_message")]
    pub commit_message: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub private_token: Option<SecureString>,
}

/// Options of the HTTP leasing-service store.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LeasingServiceOptions {
    /// Service root; the API lives under `/api/v1/`.
    pub host_url: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub pass: Option<SecureString>,
    /// Previously issued token, reused when the service still accepts it.
    #[serde(default)]
    pub token: Option<SecureString>,
    #[serde(default = "default_true")]
    pub ssl_verify: bool,
    /// Skip certificate verification for services with self-signed certificates.
    #[serde(default)]
    pub allow_self_signed: bool,
    /// PEM bundle of extra trusted CAs.
    #[serde(default)]
    pub ssl_cert: Option<String>,
}

/// Typed, backend-specific store options.
#[derive(Debug, Clone)]
pub enum StoreOptions {
    File(FileStoreOptions),
    GitlabSnippet(SnippetStoreOptions),
    GitlabCommit(CommitStoreOptions),
    Vmpooler(LeasingServiceOptions),
}

impl StoreOptions {
    pub fn kind(&self) -> StoreKind {
        match self {
            Self::File(_) => StoreKind::File,
            Self::GitlabSnippet(_) => StoreKind::GitlabSnippet,
            Self::GitlabCommit(_) => StoreKind::GitlabCommit,
            Self::Vmpooler(_) => StoreKind::Vmpooler,
        }
    }
}

impl SnippetStoreOptions {
    pub fn gitlab(&self) -> GitlabOptions {
        GitlabOptions {
            endpoint: self.endpoint.clone(),
            private_token: self.private_token.clone(),
        }
    }
}

impl CommitStoreOptions {
    pub fn gitlab(&self) -> GitlabOptions {
        GitlabOptions {
            endpoint: self.endpoint.clone(),
            private_token: self.private_token.clone(),
        }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            pool_name: default_pool_name(),
            state_store: StoreKind::File,
            store_options: toml::Table::new(),
            reuse_instances: false,
        }
    }
}

impl Default for FileStoreOptions {
    fn default() -> Self {
        Self {
            pool_file: default_pool_file(),
            lock: true,
        }
    }
}

fn default_pool_name() -> String {
    "pool1".to_string()
}

fn default_pool_file() -> PathBuf {
    PathBuf::from("vmpool.yaml")
}

// Some GitLab versions refuse to create repository files with a yaml extension.
fn default_remote_pool_file() -> String {
    "vmpool".to_string()
}

fn default_snippet_title() -> String {
    "Virtual Machine Pools".to_string()
}

fn default_snippet_visibility() -> String {
    "public".to_string()
}

fn default_branch() -> String {
    "master".to_string()
}

fn default_commit_message() -> String {
    "update vmpool data".to_string()
}

fn default_true() -> bool {
    true
}
