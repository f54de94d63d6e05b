//! Driver configuration.
//!
//! The driver hands over a pool name, a backend selector and a free-form
//! options table. The table is parsed once into the typed options of the
//! selected backend.

pub mod credentials;
pub mod loader;
pub mod types;

pub use credentials::{resolve_secret, SecureString};
pub use loader::ConfigError;
pub use types::{
    CommitStoreOptions, DriverConfig, FileStoreOptions, GitlabOptions, LeasingServiceOptions,
    SnippetStoreOptions, StoreKind, StoreOptions,
};
