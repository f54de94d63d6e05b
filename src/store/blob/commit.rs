use crate::config::{CommitStoreOptions, StoreKind};
use crate::pool::document;
use crate::remote::{CommitAction, CommitActionKind, ContentApi, GitlabClient};
use crate::store::document::{DocumentBackend, DocumentStore};
use crate::store::StoreError;

/// Pool store backed by a repository file, updated through commits.
pub type CommitStore<C = GitlabClient> = DocumentStore<CommitDocument<C>>;

/// A pool document stored as a file on a branch; every save is a new commit.
pub struct CommitDocument<C> {
    client: C,
    project_id: u64,
    file_path: String,
    branch: String,
    message: String,
}

impl<C: ContentApi> CommitDocument<C> {
    pub fn new(client: C, options: &CommitStoreOptions) -> Self {
        Self {
            client,
            project_id: options.project_id,
            file_path: options.pool_file.clone(),
            branch: options.branch.clone(),
            message: options.commit_message.clone(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    fn commit(&self, action: CommitActionKind, content: &str) -> Result<(), StoreError> {
        let actions = [CommitAction {
            action,
            file_path: self.file_path.clone(),
            content: content.to_string(),
        }];
        self.client
            .create_commit(self.project_id, &self.branch, &self.message, &actions)?;
        Ok(())
    }
}

impl<C: ContentApi> DocumentBackend for CommitDocument<C> {
    fn kind(&self) -> StoreKind {
        StoreKind::GitlabCommit
    }

    fn location(&self) -> String {
        format!(
            "project {} file {} on {}",
            self.project_id, self.file_path, self.branch
        )
    }

    fn load(&mut self) -> Result<String, StoreError> {
        match self
            .client
            .file_contents(self.project_id, &self.file_path, &self.branch)
        {
            Ok(content) => Ok(content),
            Err(e) if e.is_not_found() => {
                tracing::info!(
                    "{} does not exist yet, committing an empty pool document",
                    self.location()
                );
                let content = document::empty_document();
                self.commit(CommitActionKind::Create, &content)?;
                Ok(content)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, content: &str) -> Result<(), StoreError> {
        self.commit(CommitActionKind::Update, content)
    }
}

impl<C: ContentApi> DocumentStore<CommitDocument<C>> {
    pub fn with_client(client: C, options: &CommitStoreOptions) -> Self {
        DocumentStore::new(CommitDocument::new(client, options))
    }
}
