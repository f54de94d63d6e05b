use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;

use crate::config::{resolve_secret, GitlabOptions, SecureString};

use super::{CommitAction, ContentApi, RemoteError, SnippetFile};

pub const DEFAULT_ENDPOINT: &str = "https://gitlab.com/api/v4";
pub const ENDPOINT_ENV: &str = "GITLAB_API_ENDPOINT";
pub const PRIVATE_TOKEN_ENV: &str = "GITLAB_API_PRIVATE_TOKEN";

const TOKEN_HEADER: &str = "PRIVATE-TOKEN";

/// GitLab v4 REST client for snippets and repository files.
pub struct GitlabClient {
    client: Client,
    endpoint: Url,
    token: Option<SecureString>,
}

#[derive(Deserialize)]
struct CreatedSnippet {
    id: u64,
}

impl GitlabClient {
    /// Build a client from options, falling back to the `GITLAB_API_*`
    /// environment variables.
    pub fn new(options: &GitlabOptions) -> Result<Self, RemoteError> {
        let endpoint = options
            .endpoint
            .clone()
            .filter(|e| !e.trim().is_empty())
            .or_else(|| std::env::var(ENDPOINT_ENV).ok().filter(|e| !e.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let endpoint = Url::parse(&endpoint)
            .map_err(|e| RemoteError::Setup(format!("invalid endpoint '{}': {}", endpoint, e)))?;
        if endpoint.cannot_be_a_base() {
            return Err(RemoteError::Setup(format!(
                "endpoint '{}' cannot be used as a base URL",
                endpoint
            )));
        }

        let token = resolve_secret(options.private_token.as_ref(), PRIVATE_TOKEN_ENV);
        if token.is_none() {
            tracing::warn!("No GitLab private token configured, requests are unauthenticated");
        }

        let client = Client::builder()
            .build()
            .map_err(|e| RemoteError::Setup(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            token,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn send(&self, builder: RequestBuilder, url: &Url) -> Result<Response, RemoteError> {
        let builder = match &self.token {
            Some(token) => builder.header(TOKEN_HEADER, token.expose()),
            None => builder,
        };
        let response = builder.send().map_err(|e| RemoteError::Transport {
            uri: url.to_string(),
            source: e,
        })?;

        let status = response.status();
        tracing::debug!("GitLab {} -> {}", url, status);
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        Err(RemoteError::from_response(status.as_u16(), &body, url.as_str()))
    }

    fn text(response: Response, url: &Url) -> Result<String, RemoteError> {
        response.text().map_err(|e| RemoteError::Decode {
            uri: url.to_string(),
            reason: e.to_string(),
        })
    }
}

impl ContentApi for GitlabClient {
    fn snippet_content(&self, project: u64, snippet_id: u64) -> Result<String, RemoteError> {
        let url = self.url(&[
            "projects",
            &project.to_string(),
            "snippets",
            &snippet_id.to_string(),
            "raw",
        ]);
        let response = self.send(self.client.get(url.clone()), &url)?;
        Self::text(response, &url)
    }

    fn create_snippet(&self, project: u64, snippet: &SnippetFile) -> Result<u64, RemoteError> {
        let url = self.url(&["projects", &project.to_string(), "snippets"]);
        let body = json!({
            "title": snippet.title,
            "visibility": snippet.visibility,
            "files": [{ "file_path": snippet.file_name, "content": snippet.content }],
        });
        let response = self.send(self.client.post(url.clone()).json(&body), &url)?;
        let created: CreatedSnippet = response.json().map_err(|e| RemoteError::Decode {
            uri: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(created.id)
    }

    fn update_snippet(
        &self,
        project: u64,
        snippet_id: u64,
        snippet: &SnippetFile,
    ) -> Result<(), RemoteError> {
        let url = self.url(&[
            "projects",
            &project.to_string(),
            "snippets",
            &snippet_id.to_string(),
        ]);
        let body = json!({
            "title": snippet.title,
            "visibility": snippet.visibility,
            "files": [{
                "action": "update",
                "file_path": snippet.file_name,
                "content": snippet.content,
            }],
        });
        self.send(self.client.put(url.clone()).json(&body), &url)?;
        Ok(())
    }

    fn file_contents(&self, project: u64, path: &str, branch: &str) -> Result<String, RemoteError> {
        let mut url = self.url(&[
            "projects",
            &project.to_string(),
            "repository",
            "files",
            path,
            "raw",
        ]);
        url.query_pairs_mut().append_pair("ref", branch);
        let response = self.send(self.client.get(url.clone()), &url)?;
        Self::text(response, &url)
    }

    fn create_commit(
        &self,
        project: u64,
        branch: &str,
        message: &str,
        actions: &[CommitAction],
    ) -> Result<(), RemoteError> {
        let url = self.url(&["projects", &project.to_string(), "repository", "commits"]);
        let body = json!({
            "branch": branch,
            "commit_message": message,
            "actions": actions,
        });
        self.send(self.client.post(url.clone()).json(&body), &url)?;
        Ok(())
    }
}
