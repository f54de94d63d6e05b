//! YAML codec for the pool document shared by the file and blob stores.

use thiserror::Error;

use super::state::{InvariantViolation, PoolCollection};

/// Errors produced while decoding a pool document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("pool '{pool}': {violation}")]
    Invariant {
        pool: String,
        violation: InvariantViolation,
    },
}

/// Parse a pool document.
///
/// An empty document, `null` or `{}` is an empty collection. Pools that break
/// the membership invariants are rejected.
pub fn decode(content: &str) -> Result<PoolCollection, DocumentError> {
    if content.trim().is_empty() {
        return Ok(PoolCollection::new());
    }

    let collection: Option<PoolCollection> = serde_yaml::from_str(content)?;
    let collection = collection.unwrap_or_default();

    for (name, pool) in collection.iter() {
        pool.check_invariants()
            .map_err(|violation| DocumentError::Invariant {
                pool: name.to_string(),
                violation,
            })?;
    }

    Ok(collection)
}

/// Serialize a collection as a full YAML document.
pub fn encode(collection: &PoolCollection) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(collection)
}

/// The document written when a remote collection does not exist yet.
pub fn empty_document() -> String {
    "{}\n".to_string()
}
