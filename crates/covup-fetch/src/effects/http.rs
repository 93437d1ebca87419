use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;
use url::Url;

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Response head plus the body stream of a single GET.
pub struct HttpResponse<E> {
    pub status:         u16,
    pub content_length: Option<u64>,
    /// Raw `Location` header, present on redirects.
    pub location:       Option<String>,
    pub body:           BoxStream<'static, Result<Bytes, E>>,
}

impl<E> std::fmt::Debug for HttpResponse<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("content_length", &self.content_length)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

/// Asynchronous HTTP client abstraction.
///
/// Implementations must NOT follow redirects on their own: the fetcher
/// follows them so that the redirect limit is enforced in one place.
///
/// # Implementations
///
/// - [`ReqwestClient`]: Production implementation using `reqwest`
/// - Mock implementations for testing
pub trait HttpClient: Send + Sync {
    /// Error type for transport failures (DNS, connect, TLS, reset).
    type Error: std::error::Error + Send + 'static;

    /// Issue a GET and return once the response head is available.
    ///
    /// Non-2xx statuses are not errors at this layer; they are reported in
    /// [`HttpResponse::status`].
    fn get(&self, url: &Url) -> impl Future<Output = Result<HttpResponse<Self::Error>, Self::Error>> + Send;
}

impl<C: HttpClient> HttpClient for &C {
    type Error = C::Error;

    fn get(&self, url: &Url) -> impl Future<Output = Result<HttpResponse<Self::Error>, Self::Error>> + Send {
        (**self).get(url)
    }
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use super::*;
    use futures_util::StreamExt;

    const USER_AGENT: &str = concat!("covup/", env!("CARGO_PKG_VERSION"));

    /// Production HTTP client implementation using reqwest.
    #[derive(Debug, Clone)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        /// Create a client with redirects disabled.
        pub fn new() -> Result<Self, reqwest::Error> {
            let client = reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .user_agent(USER_AGENT)
                .build()?;
            Ok(Self { client })
        }
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn get(&self, url: &Url) -> Result<HttpResponse<Self::Error>, Self::Error> {
            let response = self.client.get(url.clone()).send().await?;
            let status = response.status().as_u16();
            let content_length = response.content_length();
            let location = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            let body = response.bytes_stream().map(|chunk| chunk.map(Bytes::from));

            Ok(HttpResponse {
                status,
                content_length,
                location,
                body: Box::pin(body),
            })
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;
