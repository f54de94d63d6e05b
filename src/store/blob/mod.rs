//! Pool document kept in a remote, version-controlled blob.
//!
//! Both variants hydrate the pools from the fetched blob and push the whole
//! re-serialized document as a new version on every mutation. Concurrent
//! writers are not merged: the last push wins.

pub mod commit;
pub mod snippet;

pub use commit::{CommitDocument, CommitStore};
pub use snippet::{SnippetDocument, SnippetStore};
