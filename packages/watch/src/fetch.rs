//! Page fetching over HTTP(S)

use crate::error::{ConfigError, FetchError};
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::warn;

/// Desktop browser identity, so basic bot filters let the request through
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:146.0) Gecko/20100101 Firefox/146.0";

/// How strictly the peer certificate is checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsPolicy {
    #[default]
    Strict,
    /// Accept invalid, self-signed and expired certificates.
    ///
    /// Only for known public pages with broken certificates. The channel can
    /// be intercepted, so never point this at anything confidential.
    AcceptInvalidCerts,
}

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub user_agent: String,
    pub tls: TlsPolicy,
    /// `None` keeps the transport default
    pub timeout: Option<Duration>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            tls: TlsPolicy::Strict,
            timeout: None,
        }
    }
}

/// Source of raw page markup
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError>;
}

/// [`Fetcher`] backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(options: &FetchOptions) -> Result<Self, ConfigError> {
        let mut builder = Client::builder().user_agent(options.user_agent.as_str());

        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        if options.tls == TlsPolicy::AcceptInvalidCerts {
            warn!(
                "TLS certificate verification is DISABLED for all watched pages - \
                 traffic can be intercepted, only use this for public pages"
            );
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                message: error_chain(&e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| FetchError::Body {
            url: url.to_string(),
            message: error_chain(&e),
        })
    }
}

// reqwest keeps the interesting part (dns, tls, refused) in the source chain
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn url(server: &MockServer, route: &str) -> Url {
        Url::parse(&format!("{}{}", server.uri(), route)).unwrap()
    }

    #[tokio::test]
    async fn sends_browser_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dsp/grades"))
            .and(header("user-agent", DEFAULT_USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string("<body>ok</body>"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&FetchOptions::default()).unwrap();
        let body = fetcher.fetch(&url(&server, "/dsp/grades")).await.unwrap();
        assert_eq!(body, "<body>ok</body>");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&FetchOptions::default()).unwrap();
        let err = fetcher.fetch(&url(&server, "/cps")).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        // Grab a free port, then close it again so nothing is listening
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let dead = Url::parse(&format!("http://127.0.0.1:{port}/gone")).unwrap();

        let fetcher = HttpFetcher::new(&FetchOptions {
            timeout: Some(Duration::from_secs(5)),
            ..FetchOptions::default()
        })
        .unwrap();
        let err = fetcher.fetch(&dead).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
    }
}
