//! Authenticated request pipeline.
//!
//! Every call issues a fresh admin token, builds one HTTP request, performs
//! exactly one network attempt and classifies the response. Bodies of
//! successful responses are returned untouched for the caller to decode.

use std::time::Duration;

use chrono::Utc;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};
use url::Url;

use ghostwriter_shared::{ApiError, Endpoint, GhostwriterError, Result};

use crate::token::issue_token;

/// Admin API version pinned via the `Accept-Version` header.
pub const ACCEPT_VERSION: &str = "v5.0";

/// Scheme prefix of the `Authorization` header value.
pub const AUTH_SCHEME: &str = "Ghost";

/// Default per-request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User-Agent string for API requests.
const USER_AGENT: &str = concat!("ghostwriter/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Request parts
// ---------------------------------------------------------------------------

/// Methods the Admin API pipeline issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered query parameters, URL-encoded onto the request only when non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query(Vec<(String, String)>);

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style append.
    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: &str, value: impl ToString) {
        self.0.push((key.to_string(), value.to_string()));
    }

    /// Append every pair of `other`.
    pub fn extend(&mut self, other: &Query) {
        self.0.extend(other.0.iter().cloned());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

// ---------------------------------------------------------------------------
// AdminClient
// ---------------------------------------------------------------------------

/// Options for building an [`AdminClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Timeout applied to each request.
    pub timeout: Duration,
    /// Aborts in-flight requests and pagination walks when cancelled.
    pub cancel: CancellationToken,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cancel: CancellationToken::new(),
        }
    }
}

/// Admin API client bound to a borrowed [`Endpoint`].
pub struct AdminClient<'a> {
    endpoint: &'a Endpoint,
    http: Client,
    cancel: CancellationToken,
}

impl<'a> AdminClient<'a> {
    /// Create a client for `endpoint`.
    pub fn new(endpoint: &'a Endpoint, opts: ClientOptions) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(opts.timeout)
            .build()
            .map_err(|e| GhostwriterError::transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint,
            http,
            cancel: opts.cancel,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        self.endpoint
    }

    /// Fail with [`GhostwriterError::Cancelled`] if cancellation was requested.
    pub fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(GhostwriterError::Cancelled);
        }
        Ok(())
    }

    /// Run `fut` unless cancellation is requested first.
    pub async fn cancellable<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(GhostwriterError::Cancelled),
            result = fut => result,
        }
    }

    /// Perform one request against `path` (relative to the Admin API root).
    ///
    /// Status below 400 returns the raw body. Otherwise the body is decoded
    /// as an [`ApiError`]; if that yields no items the raw text and status
    /// come back as a transport error.
    #[instrument(skip_all, fields(method = %method, path = %path))]
    pub async fn execute<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        query: &Query,
        body: Option<&B>,
    ) -> Result<Vec<u8>> {
        let payload = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| GhostwriterError::validation(format!("marshaling body: {e}")))?;

        let mut request = self.request(method, path, query)?;
        if let Some(bytes) = payload {
            request = request.header(CONTENT_TYPE, "application/json").body(bytes);
        }

        self.dispatch(request).await
    }

    /// GET with optional query parameters.
    pub async fn get(&self, path: &str, query: &Query) -> Result<Vec<u8>> {
        self.execute::<()>(HttpMethod::Get, path, query, None).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Query,
        body: &B,
    ) -> Result<Vec<u8>> {
        self.execute(HttpMethod::Post, path, query, Some(body)).await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Query,
        body: &B,
    ) -> Result<Vec<u8>> {
        self.execute(HttpMethod::Put, path, query, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Vec<u8>> {
        self.execute::<()>(HttpMethod::Delete, path, &Query::new(), None)
            .await
    }

    /// Build an authenticated request with the common headers.
    ///
    /// The token is created here, per call, and dropped once it is in the header.
    pub(crate) fn request(
        &self,
        method: HttpMethod,
        path: &str,
        query: &Query,
    ) -> Result<RequestBuilder> {
        let token = issue_token(self.endpoint.admin_key(), Utc::now())?;
        let url = build_url(self.endpoint, path, query)?;

        Ok(self
            .http
            .request(method.into(), url)
            .header(AUTHORIZATION, format!("{AUTH_SCHEME} {}", token.encode()))
            .header("Accept-Version", ACCEPT_VERSION))
    }

    /// Send the request, racing the cancellation token, and classify the response.
    pub(crate) async fn dispatch(&self, request: RequestBuilder) -> Result<Vec<u8>> {
        let exchange = async {
            let response = request
                .send()
                .await
                .map_err(|e| GhostwriterError::transport(format!("request failed: {e}")))?;
            let status = response.status().as_u16();
            let body = response
                .bytes()
                .await
                .map_err(|e| GhostwriterError::transport(format!("reading response: {e}")))?;
            Ok::<_, GhostwriterError>((status, body.to_vec()))
        };

        let (status, body) = self.cancellable(exchange).await?;

        debug!(status, bytes = body.len(), "response received");
        classify(status, body)
    }
}

/// Map a status code and body to the pipeline's result.
pub(crate) fn classify(status: u16, body: Vec<u8>) -> Result<Vec<u8>> {
    if status < 400 {
        return Ok(body);
    }

    if let Some(api_error) = ApiError::decode(&body) {
        return Err(api_error.into());
    }

    Err(GhostwriterError::Transport {
        status: Some(status),
        message: String::from_utf8_lossy(&body).into_owned(),
    })
}

/// `baseUrl + API root + path`, plus `?query` when there is any.
fn build_url(endpoint: &Endpoint, path: &str, query: &Query) -> Result<Url> {
    let mut url = Url::parse(&endpoint.api_url(path))
        .map_err(|e| GhostwriterError::validation(format!("invalid request URL for {path}: {e}")))?;

    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query.pairs());
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const KEY: &str = "abc123:deadbeef";

    fn endpoint(server: &MockServer) -> Endpoint {
        Endpoint::new(&server.uri(), KEY).unwrap()
    }

    #[test]
    fn url_has_no_query_when_empty() {
        let endpoint = Endpoint::new("https://blog.example.com", KEY).unwrap();
        let url = build_url(&endpoint, "/posts/", &Query::new()).unwrap();
        assert_eq!(url.as_str(), "https://blog.example.com/ghost/api/admin/posts/");
    }

    #[test]
    fn url_encodes_query() {
        let endpoint = Endpoint::new("https://blog.example.com", KEY).unwrap();
        let query = Query::new().with("filter", "slug:hello world").with("limit", 5);
        let url = build_url(&endpoint, "/posts/", &query).unwrap();
        assert_eq!(
            url.as_str(),
            "https://blog.example.com/ghost/api/admin/posts/?filter=slug%3Ahello+world&limit=5"
        );
    }

    #[test]
    fn classify_passes_success_through() {
        let body = b"{\"posts\":[]}".to_vec();
        assert_eq!(classify(200, body.clone()).unwrap(), body);
        assert_eq!(classify(204, Vec::new()).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn classify_keeps_error_items_without_message() {
        for body in [
            r#"{"errors":[{"type":"NotFoundError","context":"Post not found."}]}"#,
            r#"{"errors":[{"message":null,"context":"Post not found."}]}"#,
        ] {
            match classify(404, body.as_bytes().to_vec()) {
                Err(GhostwriterError::Api(api)) => {
                    assert_eq!(api.errors[0].context.as_deref(), Some("Post not found."));
                }
                other => panic!("expected API error for {body}, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn sends_auth_and_version_headers() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ghost/api/admin/site/"))
            .and(header("Accept-Version", ACCEPT_VERSION))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"site":{}}"#))
            .expect(1)
            .mount(&server)
            .await;

        let endpoint = endpoint(&server);
        let client = AdminClient::new(&endpoint, ClientOptions::default()).unwrap();
        let body = client.get("/site/", &Query::new()).await.unwrap();
        assert_eq!(body, br#"{"site":{}}"#);

        let requests = server.received_requests().await.unwrap();
        let auth = requests[0].headers.get("authorization").unwrap().to_str().unwrap();
        assert!(auth.starts_with("Ghost "));
        assert_eq!(auth.trim_start_matches("Ghost ").split('.').count(), 3);
        assert!(requests[0].headers.get("content-type").is_none());
    }

    #[tokio::test]
    async fn json_body_sets_content_type() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/ghost/api/admin/tags/"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({"tags": [{"name": "rust"}]})))
            .respond_with(ResponseTemplate::new(201).set_body_string(r#"{"tags":[]}"#))
            .expect(1)
            .mount(&server)
            .await;

        let endpoint = endpoint(&server);
        let client = AdminClient::new(&endpoint, ClientOptions::default()).unwrap();
        let payload = serde_json::json!({"tags": [{"name": "rust"}]});
        client.post("/tags/", &Query::new(), &payload).await.unwrap();
    }

    #[tokio::test]
    async fn query_parameters_are_sent() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ghost/api/admin/posts/"))
            .and(query_param("filter", "slug:hello"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"posts":[]}"#))
            .expect(1)
            .mount(&server)
            .await;

        let endpoint = endpoint(&server);
        let client = AdminClient::new(&endpoint, ClientOptions::default()).unwrap();
        client
            .get("/posts/", &Query::new().with("filter", "slug:hello"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn structured_error_becomes_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(404).set_body_string(r#"{"errors":[{"message":"Not found"}]}"#),
            )
            .mount(&server)
            .await;

        let endpoint = endpoint(&server);
        let client = AdminClient::new(&endpoint, ClientOptions::default()).unwrap();
        let err = client.get("/posts/missing/", &Query::new()).await.unwrap_err();

        match err {
            GhostwriterError::Api(api) => assert_eq!(api.message(), Some("Not found")),
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_error_becomes_transport_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&server)
            .await;

        let endpoint = endpoint(&server);
        let client = AdminClient::new(&endpoint, ClientOptions::default()).unwrap();
        let err = client.get("/site/", &Query::new()).await.unwrap_err();

        match err {
            GhostwriterError::Transport { status, message } => {
                assert_eq!(status, Some(500));
                assert_eq!(message, "Internal Server Error");
            }
            other => panic!("expected Transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn bad_key_fails_before_any_request() {
        let server = MockServer::start().await;

        let endpoint = Endpoint::new(&server.uri(), "noColonHere").unwrap();
        let client = AdminClient::new(&endpoint, ClientOptions::default()).unwrap();
        let err = client.get("/site/", &Query::new()).await.unwrap_err();

        assert!(matches!(err, GhostwriterError::Auth(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancelled_client_does_not_wait_for_response() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("{}")
                    .set_delay(Duration::from_secs(30)),
            )
            .mount(&server)
            .await;

        let endpoint = endpoint(&server);
        let opts = ClientOptions::default();
        opts.cancel.cancel();
        let client = AdminClient::new(&endpoint, opts).unwrap();

        let err = client.get("/site/", &Query::new()).await.unwrap_err();
        assert!(matches!(err, GhostwriterError::Cancelled));
    }
}
