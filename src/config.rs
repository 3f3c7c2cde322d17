//! Where the Toxiproxy server lives and how long to wait for it.

use reqwest::Url;
use std::net::{SocketAddr, ToSocketAddrs};
use std::str::FromStr;
use std::time::Duration;

use super::consts::*;
use super::error::{Result, TransportError};

/// Immutable connection settings handed to [`crate::client::Client::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    base_url: Url,
    timeout: Option<Duration>,
}

impl Config {
    /// # Examples
    ///
    /// ```
    /// # use toxiproxy_client::config::Config;
    /// let config = Config::new("http://127.0.0.1:8474").expect("valid url");
    /// assert_eq!(8474, config.base_url().port().unwrap());
    /// ```
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::from_str(base_url)
            .map_err(|err| TransportError::Address(format!("{}: {}", base_url, err)))?;

        match base_url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(TransportError::Address(format!("unsupported scheme `{}`", other)).into())
            }
        }
        if base_url.host_str().is_none() {
            return Err(TransportError::Address(format!("no host in `{}`", base_url)).into());
        }

        Ok(Self {
            base_url,
            timeout: None,
        })
    }

    /// Builds a plain `http://` config from a socket address such as
    /// `"localhost:8474"`.
    pub fn from_addr<U: ToSocketAddrs>(addr: U) -> Result<Self> {
        let addr = addr
            .to_socket_addrs()
            .map_err(|err| TransportError::Address(err.to_string()))?
            .next()
            .ok_or_else(|| TransportError::Address("address resolved to nothing".into()))?;

        Self::new(&format!("http://{}", addr))
    }

    /// Defaults overridden by `TOXIPROXY_URL` and `TOXIPROXY_TIMEOUT_MS`.
    /// Unparseable timeouts are ignored, an unparseable URL is an error.
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var(ENV_URL) {
            Ok(url) => Self::new(&url)?,
            Err(_) => Self::default(),
        };
        if let Ok(s) = std::env::var(ENV_TIMEOUT_MS) {
            if let Ok(ms) = s.parse::<u64>() {
                config.timeout = Some(Duration::from_millis(ms));
            }
        }
        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// `base_url` with `path` replacing its path.
    pub(crate) fn url_for(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(path);
        url
    }

    pub(crate) fn socket_addr(&self) -> Option<SocketAddr> {
        let host = self.base_url.host_str()?;
        let port = self.base_url.port_or_known_default()?;
        (host, port).to_socket_addrs().ok()?.next()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_URL).expect("default url is valid"),
            timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_points_at_local_server() {
        let config = Config::default();
        assert_eq!("127.0.0.1", config.base_url().host_str().unwrap());
        assert_eq!(Some(8474), config.base_url().port());
        assert_eq!(None, config.timeout());
    }

    #[test]
    fn test_url_for_replaces_path() {
        let config = Config::new("http://localhost:8474/ignored").unwrap();
        assert_eq!(
            "http://localhost:8474/proxies/socket/toxics",
            config.url_for("/proxies/socket/toxics").as_str()
        );
    }

    #[test]
    fn test_from_addr() {
        let config = Config::from_addr("127.0.0.1:9000").unwrap();
        assert_eq!("http://127.0.0.1:9000/", config.base_url().as_str());
    }

    #[test]
    fn test_rejects_bad_urls() {
        assert!(Config::new("not a url").is_err());
        assert!(Config::new("ftp://127.0.0.1:8474").is_err());
    }

    #[test]
    fn test_with_timeout() {
        let config = Config::default().with_timeout(Duration::from_secs(2));
        assert_eq!(Some(Duration::from_secs(2)), config.timeout());
    }
}
