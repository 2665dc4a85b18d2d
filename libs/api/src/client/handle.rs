//! The built client handle.

use crate::error::{ClientError, ClientResult};
use lab_shared::tls_client::{Transport, TransportKind};
use reqwest::{Client, Method, RequestBuilder, Url, header};
use serde_json::{Value, json};

/// Sent on every request
pub const USER_AGENT: &str = "Lab - GitLab CLI";

/// Header carrying a personal access token on REST requests
pub const PRIVATE_TOKEN_HEADER: &str = "PRIVATE-TOKEN";

/// Which API surface a handle is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Rest,
    GraphQL,
}

/// Parse a resolved base URL, rejecting anything requests cannot be joined onto.
pub(crate) fn parse_base_url(raw: &str) -> ClientResult<Url> {
    let mut url = Url::parse(raw)
        .map_err(|e| ClientError::ClientInit(format!("invalid base URL {:?}: {}", raw, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ClientError::ClientInit(format!(
            "unsupported protocol {:?} in base URL {:?}",
            url.scheme(),
            raw
        )));
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(ClientError::ClientInit(format!(
            "base URL {:?} has no host",
            raw
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// A ready-to-use client bound to one transport and one base URL.
#[derive(Clone, Debug)]
pub struct LabClient {
    transport: Transport,
    base_url: Url,
    endpoint: Endpoint,
    token: Option<String>,
}

impl LabClient {
    pub(crate) fn new(
        transport: Transport,
        base_url: Url,
        endpoint: Endpoint,
        token: &str,
    ) -> Self {
        Self {
            transport,
            base_url,
            endpoint,
            token: (!token.is_empty()).then(|| token.to_string()),
        }
    }

    /// Swap the transport while keeping base URL and credentials.
    pub(crate) fn rebind(&mut self, transport: Transport) {
        self.transport = transport;
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub fn transport_kind(&self) -> TransportKind {
        self.transport.kind()
    }

    pub fn http_client(&self) -> &Client {
        self.transport.client()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Resolve `path` against the base URL. Leading slashes are ignored so
    /// `"/user"` and `"user"` both land under the API prefix.
    pub fn url(&self, path: &str) -> ClientResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::ClientInit(format!("invalid request path {:?}: {}", path, e)))
    }

    /// Start a request with the user agent and credentials attached.
    pub fn request(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        let url = self.url(path)?;
        Ok(self.authorize(self.http_client().request(method, url)))
    }

    pub fn get(&self, path: &str) -> ClientResult<RequestBuilder> {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> ClientResult<RequestBuilder> {
        self.request(Method::POST, path)
    }

    /// POST a GraphQL document to the GraphQL endpoint.
    pub fn graphql(&self, query: &str, variables: Value) -> ClientResult<RequestBuilder> {
        if self.endpoint != Endpoint::GraphQL {
            return Err(ClientError::EndpointMismatch(
                "client is bound to the REST endpoint; rebuild it with GraphQL enabled",
            ));
        }
        let body = json!({ "query": query, "variables": variables });
        Ok(self
            .authorize(self.http_client().post(self.base_url.clone()))
            .json(&body))
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header(header::USER_AGENT, USER_AGENT);
        match (&self.token, self.endpoint) {
            (None, _) => builder,
            (Some(token), Endpoint::Rest) => builder.header(PRIVATE_TOKEN_HEADER, token),
            (Some(token), Endpoint::GraphQL) => builder.bearer_auth(token),
        }
    }
}
