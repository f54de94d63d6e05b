//! Backend registry: maps the configured store kind to its constructor.

use crate::config::{DriverConfig, StoreOptions};
use crate::remote::GitlabClient;
use crate::store::{
    CommitStore, FileStore, LeasingServiceStore, PoolStore, SnippetStore, StoreError,
};

/// Build the store selected by `config`.
pub fn open_store(config: &DriverConfig) -> Result<Box<dyn PoolStore>, StoreError> {
    let options = config.store_options()?;
    tracing::debug!("Opening {} store", options.kind());
    open_with_options(&options)
}

/// Build a store from already parsed options.
pub fn open_with_options(options: &StoreOptions) -> Result<Box<dyn PoolStore>, StoreError> {
    let store: Box<dyn PoolStore> = match options {
        StoreOptions::File(o) => Box::new(FileStore::open(o)?),
        StoreOptions::GitlabSnippet(o) => {
            let client = GitlabClient::new(&o.gitlab())?;
            Box::new(SnippetStore::with_client(client, o))
        }
        StoreOptions::GitlabCommit(o) => {
            let client = GitlabClient::new(&o.gitlab())?;
            Box::new(CommitStore::with_client(client, o))
        }
        StoreOptions::Vmpooler(o) => Box::new(LeasingServiceStore::connect(o)?),
    };
    Ok(store)
}
