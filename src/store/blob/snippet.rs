use crate::config::{SnippetStoreOptions, StoreKind};
use crate::pool::document;
use crate::remote::{ContentApi, GitlabClient, SnippetFile};
use crate::store::document::{DocumentBackend, DocumentStore};
use crate::store::StoreError;

/// Pool store backed by a project snippet.
pub type SnippetStore<C = GitlabClient> = DocumentStore<SnippetDocument<C>>;

/// A pool document stored as a project snippet, replaced wholesale on save.
pub struct SnippetDocument<C> {
    client: C,
    project_id: u64,
    snippet_id: Option<u64>,
    title: String,
    visibility: String,
    file_name: String,
}

impl<C: ContentApi> SnippetDocument<C> {
    pub fn new(client: C, options: &SnippetStoreOptions) -> Self {
        Self {
            client,
            project_id: options.project_id,
            snippet_id: options.snippet_id,
            title: options.title.clone(),
            visibility: options.visibility.clone(),
            file_name: options.pool_file.clone(),
        }
    }

    /// The snippet holding the pools; set once the snippet exists.
    pub fn snippet_id(&self) -> Option<u64> {
        self.snippet_id
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    fn snippet(&self, content: &str) -> SnippetFile {
        SnippetFile {
            title: self.title.clone(),
            visibility: self.visibility.clone(),
            file_name: self.file_name.clone(),
            content: content.to_string(),
        }
    }

    fn create(&mut self, content: &str) -> Result<(), StoreError> {
        let id = self
            .client
            .create_snippet(self.project_id, &self.snippet(content))?;
        tracing::info!(
            "Created snippet {} in project {} for pool data, set snippet_id = {} to reuse it",
            id,
            self.project_id,
            id
        );
        self.snippet_id = Some(id);
        Ok(())
    }
}

impl<C: ContentApi> DocumentBackend for SnippetDocument<C> {
    fn kind(&self) -> StoreKind {
        StoreKind::GitlabSnippet
    }

    fn location(&self) -> String {
        match self.snippet_id {
            Some(id) => format!("project {} snippet {}", self.project_id, id),
            None => format!("project {} (new snippet)", self.project_id),
        }
    }

    fn load(&mut self) -> Result<String, StoreError> {
        if let Some(id) = self.snippet_id {
            match self.client.snippet_content(self.project_id, id) {
                Ok(content) => return Ok(content),
                Err(e) if e.is_not_found() => {
                    tracing::warn!(
                        "Snippet {} not found in project {}, creating an empty pool document",
                        id,
                        self.project_id
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        let content = document::empty_document();
        self.create(&content)?;
        Ok(content)
    }

    fn save(&mut self, content: &str) -> Result<(), StoreError> {
        match self.snippet_id {
            Some(id) => {
                self.client
                    .update_snippet(self.project_id, id, &self.snippet(content))?;
                Ok(())
            }
            None => self.create(content),
        }
    }
}

impl<C: ContentApi> DocumentStore<SnippetDocument<C>> {
    pub fn with_client(client: C, options: &SnippetStoreOptions) -> Self {
        DocumentStore::new(SnippetDocument::new(client, options))
    }
}
