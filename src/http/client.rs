use std::time::Duration;

use reqwest::{
    Client, Method, RequestBuilder, Url,
    header::{HeaderMap, HeaderName, HeaderValue},
    redirect,
};
use tracing::error;

use crate::args::HttpMethod;
use crate::error::HttpError;

pub(crate) const DEFAULT_USER_AGENT: &str = concat!("pacer-loadgen/", env!("CARGO_PKG_VERSION"));
/// Redirect hops followed before the response is taken as final.
const REDIRECT_LIMIT: usize = 10;

/// Transport-level options for the shared HTTP client.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub connect_timeout: Duration,
    /// Idle keep-alive connections kept per host.
    pub max_idle_per_host: usize,
    pub insecure: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            max_idle_per_host: crate::engine::DEFAULT_MAX_CONCURRENCY,
            insecure: false,
        }
    }
}

/// Builds the pooled client shared by every request of a run.
///
/// # Errors
///
/// Returns an error when the TLS backend or client cannot be initialised.
pub fn build_client(settings: &ClientSettings) -> Result<Client, HttpError> {
    let mut client_builder = Client::builder()
        .connect_timeout(settings.connect_timeout)
        .user_agent(DEFAULT_USER_AGENT)
        .redirect(redirect::Policy::limited(REDIRECT_LIMIT))
        .pool_max_idle_per_host(settings.max_idle_per_host);

    if settings.insecure {
        client_builder = client_builder
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true);
    }

    client_builder.build().map_err(|err| {
        error!("Failed to build HTTP client: {}", err);
        HttpError::BuildClientFailed { source: err }
    })
}

/// Method, headers and body reused for every dispatched request.
#[derive(Debug, Clone)]
pub struct RequestTemplate {
    method: Method,
    headers: HeaderMap,
    body: Option<String>,
}

impl Default for RequestTemplate {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

impl RequestTemplate {
    /// Validates headers and captures the request shape.
    ///
    /// # Errors
    ///
    /// Returns an error when a header name or value is not valid HTTP.
    pub fn new(
        method: HttpMethod,
        headers: &[(String, String)],
        body: &str,
    ) -> Result<Self, HttpError> {
        let mut header_map = HeaderMap::with_capacity(headers.len());
        for (key, value) in headers {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|err| {
                HttpError::InvalidHeaderName {
                    header: key.clone(),
                    source: err,
                }
            })?;
            let val =
                HeaderValue::from_str(value).map_err(|err| HttpError::InvalidHeaderValue {
                    header: key.clone(),
                    source: err,
                })?;
            header_map.append(name, val);
        }

        Ok(Self {
            method: to_reqwest_method(method),
            headers: header_map,
            body: if body.is_empty() {
                None
            } else {
                Some(body.to_owned())
            },
        })
    }

    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    pub(crate) fn build(&self, client: &Client, url: &Url) -> RequestBuilder {
        let mut request_builder = client
            .request(self.method.clone(), url.clone())
            .headers(self.headers.clone());
        if let Some(body) = self.body.as_ref() {
            request_builder = request_builder.body(body.clone());
        }
        request_builder
    }
}

const fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Post => Method::POST,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}
