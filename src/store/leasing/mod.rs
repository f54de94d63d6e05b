//! Pool store delegating to a remote leasing service over HTTP.
//!
//! The service owns lease state; this store is a blocking RPC client. The
//! constructor fails fast: the base URL is probed and a usable token is
//! resolved before the store is handed out.

pub mod protocol;
pub mod tls;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Url;

use crate::config::{LeasingServiceOptions, SecureString, StoreKind};
use crate::pool::{PoolCollection, PoolMember};

use super::{PoolStore, ReleaseStatus, StoreError};

pub use tls::{TlsPolicy, VerifyMode};

/// Path of the API below the service root.
pub const API_PATH: &str = "/api/v1/";

/// Header carrying the token on authenticated requests.
pub const TOKEN_HEADER: &str = "X-AUTH-TOKEN";

/// Shorter tokens are never sent for validation.
pub const MIN_TOKEN_LEN: usize = 6;

const DESTROYED: &str = "destroyed";

pub struct LeasingServiceStore {
    client: Client,
    api_url: Url,
    token: Option<SecureString>,
    tls: TlsPolicy,
}

struct Reply {
    url: Url,
    status: u16,
    body: String,
}

impl Reply {
    fn unexpected(self) -> StoreError {
        StoreError::UnexpectedResponse {
            url: self.url.to_string(),
            status: self.status,
            body: self.body,
        }
    }
}

impl LeasingServiceStore {
    /// Connect to the service described by `options`.
    ///
    /// # Errors
    /// `InvalidUrl` if the service does not answer on its API path,
    /// `InvalidCredentials` or `TokenNotCreated` if a new token was needed
    /// and could not be minted.
    pub fn connect(options: &LeasingServiceOptions) -> Result<Self, StoreError> {
        let tls = TlsPolicy::from_options(options);
        let client = tls.build_client()?;
        let api_url = api_url(&options.host_url)?;

        let mut store = Self {
            client,
            api_url,
            token: None,
            tls,
        };
        store.probe()?;
        store.token = store.resolve_token(options)?;

        tracing::info!("Connected to leasing service at {}", store.api_url);
        Ok(store)
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    pub fn token(&self) -> Option<&SecureString> {
        self.token.as_ref()
    }

    pub fn tls(&self) -> &TlsPolicy {
        &self.tls
    }

    /// Remote lifecycle state of `member`, e.g. `running` or `destroyed`.
    pub fn vm_state(&self, member: &str) -> Result<Option<String>, StoreError> {
        let url = self.url(&["vm", member]);
        let reply = self.execute(self.authorized(self.client.get(url.clone())), url)?;

        match reply.status {
            200 => Ok(protocol::vm_state(member, &reply.body)),
            404 => Err(StoreError::MemberNotFound {
                member: member.to_string(),
            }),
            _ => Err(reply.unexpected()),
        }
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.api_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.header(TOKEN_HEADER, token.expose()),
            None => builder,
        }
    }

    fn execute(&self, builder: RequestBuilder, url: Url) -> Result<Reply, StoreError> {
        let response = builder.send().map_err(|e| StoreError::Transport {
            url: url.to_string(),
            source: e,
        })?;
        let status = response.status().as_u16();
        let body = response.text().map_err(|e| StoreError::Transport {
            url: url.to_string(),
            source: e,
        })?;
        tracing::debug!("Leasing service {} -> {}", url, status);
        Ok(Reply { url, status, body })
    }

    fn probe(&self) -> Result<(), StoreError> {
        let url = self.url(&["vm"]);
        let invalid = |reason: String| StoreError::InvalidUrl {
            url: self.api_url.to_string(),
            reason,
        };

        match self.execute(self.client.get(url.clone()), url) {
            Ok(reply) if reply.status == 200 => Ok(()),
            Ok(reply) => Err(invalid(format!("probe returned code {}", reply.status))),
            Err(e) => Err(invalid(e.to_string())),
        }
    }

    fn resolve_token(
        &self,
        options: &LeasingServiceOptions,
    ) -> Result<Option<SecureString>, StoreError> {
        if let Some(token) = options.token.as_ref().filter(|t| t.len() >= MIN_TOKEN_LEN) {
            if self.token_is_valid(token) {
                tracing::debug!("Reusing configured leasing service token");
                return Ok(Some(token.clone()));
            }
            tracing::info!("Configured token was rejected, requesting a new one");
        }

        match options.user.as_deref().filter(|u| !u.is_empty()) {
            Some(user) => self.create_token(user, options.pass.as_ref()).map(Some),
            None => {
                tracing::warn!("No usable token and no user configured, continuing unauthenticated");
                Ok(None)
            }
        }
    }

    fn token_is_valid(&self, token: &SecureString) -> bool {
        let url = self.url(&["token", token.expose()]);
        match self.execute(self.client.get(url.clone()), url) {
            Ok(reply) => reply.status == 200,
            Err(e) => {
                tracing::debug!("Token validation failed: {}", e);
                false
            }
        }
    }

    fn create_token(&self, user: &str, pass: Option<&SecureString>) -> Result<SecureString, StoreError> {
        let url = self.url(&["token"]);
        let request = self
            .client
            .post(url.clone())
            .basic_auth(user, pass.map(SecureString::expose));
        let reply = self.execute(request, url)?;

        match reply.status {
            200 => match serde_json::from_str::<protocol::TokenResponse>(&reply.body) {
                Ok(parsed) => {
                    tracing::info!("Created a new leasing service token for {}", user);
                    Ok(SecureString::new(parsed.token))
                }
                Err(_) => Err(reply.unexpected()),
            },
            401 => Err(StoreError::InvalidCredentials),
            status => Err(StoreError::TokenNotCreated { status }),
        }
    }
}

impl PoolStore for LeasingServiceStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Vmpooler
    }

    fn acquire(&mut self, pool: &str) -> Result<PoolMember, StoreError> {
        let url = self.url(&["vm"]);
        let request = self
            .authorized(self.client.post(url.clone()))
            .json(&protocol::lease_request(pool, 1));
        let reply = self.execute(request, url)?;

        match reply.status {
            200 => match protocol::leased_hostname(pool, &reply.body) {
                Some(hostname) => {
                    tracing::info!("Leased {} from pool {}", hostname, pool);
                    Ok(PoolMember::new(hostname))
                }
                None => Err(reply.unexpected()),
            },
            503 => Err(StoreError::PoolMemberUnavailable {
                pool: pool.to_string(),
            }),
            404 => Err(StoreError::PoolNotFound {
                pool: pool.to_string(),
            }),
            _ => Err(reply.unexpected()),
        }
    }

    fn release(
        &mut self,
        member: &str,
        _pool: &str,
        reuse: bool,
    ) -> Result<ReleaseStatus, StoreError> {
        if reuse {
            tracing::debug!("Leasing service members cannot be reused, destroying {}", member);
        }

        match self.vm_state(member) {
            Ok(Some(state)) if state == DESTROYED => {
                tracing::info!("{} is already destroyed", member);
                return Ok(ReleaseStatus::Destroyed);
            }
            Ok(_) => {}
            Err(e @ StoreError::MemberNotFound { .. }) => return Err(e),
            Err(e) => tracing::debug!("Existence check for {} failed: {}", member, e),
        }

        let url = self.url(&["vm", member]);
        let reply = self.execute(self.authorized(self.client.delete(url.clone())), url)?;

        match reply.status {
            200 => {
                tracing::info!("{} successfully destroyed", member);
                Ok(ReleaseStatus::Destroyed)
            }
            404 => Err(StoreError::MemberNotFound {
                member: member.to_string(),
            }),
            status => Err(StoreError::PoolMemberNotDestroyed {
                member: member.to_string(),
                status,
                body: reply.body,
            }),
        }
    }

    fn current_state(&mut self, _refresh: bool) -> Result<PoolCollection, StoreError> {
        Err(StoreError::Unsupported {
            store: StoreKind::Vmpooler,
            operation: "current_state",
        })
    }
}

/// `<host_url>/api/v1/`, replacing any path of `host_url`.
pub fn api_url(host_url: &str) -> Result<Url, StoreError> {
    let invalid = |reason: String| StoreError::InvalidUrl {
        url: host_url.to_string(),
        reason,
    };

    let base = Url::parse(host_url.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", base.scheme())));
    }
    base.join(API_PATH).map_err(|e| invalid(e.to_string()))
}
