//! HTTP plumbing between the typed API and the Toxiproxy server.

use http::{header::CONTENT_TYPE, Method, StatusCode};
use reqwest::{blocking::Client, Url};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::net::TcpStream;
use std::sync::Arc;
use tracing::debug;

use super::config::Config;
use super::error::{Error, Resource, Result};

/// Status and body of a finished round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
}

impl Reply {
    pub fn new<B: Into<String>>(status: StatusCode, body: B) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Joins `segments` into an absolute API path, percent-encoding each one so
/// a name containing `/` or `?` stays a single segment.
pub(crate) fn api_path(segments: &[&str]) -> String {
    let mut url = match Url::parse("http://localhost/") {
        Ok(url) => url,
        Err(_) => return String::from("/"),
    };
    if let Ok(mut path) = url.path_segments_mut() {
        path.clear().extend(segments);
    }
    url.path().to_owned()
}

/// One request/response exchange with the server. `path` is absolute
/// (`/proxies/...`) and `body` is JSON when present.
///
/// [`HttpClient`] is the real implementation; anything else that speaks the
/// same API (an in-process fake in tests, for one) can stand in for it.
pub trait Transport: fmt::Debug + Send + Sync {
    fn request(&self, method: Method, path: &str, body: Option<String>) -> Result<Reply>;

    fn is_alive(&self) -> bool;
}

#[derive(Debug)]
pub struct HttpClient {
    client: Client,
    config: Config,
}

impl HttpClient {
    pub fn new(config: Config) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            config,
        })
    }
}

impl Transport for HttpClient {
    fn request(&self, method: Method, path: &str, body: Option<String>) -> Result<Reply> {
        let url = self.config.url_for(path);
        debug!(%method, %url, "toxiproxy request");

        let mut request = self
            .client
            .request(method, url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send()?;
        let status = response.status();
        let body = response.text()?;
        debug!(%status, "toxiproxy response");

        Ok(Reply { status, body })
    }

    fn is_alive(&self) -> bool {
        self.config
            .socket_addr()
            .map(|addr| TcpStream::connect(addr).is_ok())
            .unwrap_or(false)
    }
}

/// Shared handle the client and its proxies talk through. Turns replies
/// into typed values or into the error taxonomy.
#[derive(Debug, Clone)]
pub(crate) struct Session {
    transport: Arc<dyn Transport>,
}

impl Session {
    pub(crate) fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.transport.is_alive()
    }

    pub(crate) fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        resource: Resource,
        name: &str,
    ) -> Result<T> {
        let body = self.send(Method::GET, path, None, resource, name)?;
        Ok(serde_json::from_str(&body)?)
    }

    pub(crate) fn get_text(&self, path: &str) -> Result<String> {
        self.send(Method::GET, path, None, Resource::Proxy, "")
    }

    pub(crate) fn post(&self, path: &str) -> Result<()> {
        self.send(Method::POST, path, None, Resource::Proxy, "")
            .map(|_| ())
    }

    pub(crate) fn post_with_data<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        payload: &B,
        resource: Resource,
        name: &str,
    ) -> Result<T> {
        let body = serde_json::to_string(payload)?;
        let reply = self.send(Method::POST, path, Some(body), resource, name)?;
        Ok(serde_json::from_str(&reply)?)
    }

    pub(crate) fn delete(&self, path: &str, resource: Resource, name: &str) -> Result<()> {
        self.send(Method::DELETE, path, None, resource, name)
            .map(|_| ())
    }

    fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
        resource: Resource,
        name: &str,
    ) -> Result<String> {
        let reply = self.transport.request(method, path, body)?;
        if reply.status.is_success() {
            Ok(reply.body)
        } else {
            Err(Error::from_status(reply.status, reply.body, resource, name))
        }
    }
}
