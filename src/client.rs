//! Main client for communicating with the Toxiproxy server.

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use super::config::Config;
use super::error::{Resource, Result};
use super::http_client::*;
use super::proxy::*;

#[derive(Deserialize)]
struct PopulateReply {
    #[serde(default)]
    proxies: Vec<ProxyPack>,
}

/// Server client.
#[derive(Clone, Debug)]
pub struct Client {
    session: Session,
}

impl Client {
    /// Creates a client talking HTTP to the server described by `config`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use toxiproxy_client::{client::Client, config::Config};
    /// let client = Client::new(Config::default()).expect("client is built");
    /// ```
    pub fn new(config: Config) -> Result<Self> {
        let transport = HttpClient::new(config)?;
        Ok(Self::with_transport(Arc::new(transport)))
    }

    /// Creates a client over any [`Transport`].
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            session: Session::new(transport),
        }
    }

    /// Creates a proxy. A proxy with the same name is a conflict.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use toxiproxy_client::{client::Client, config::Config, proxy::ProxyPack};
    /// let client = Client::new(Config::default()).unwrap();
    /// let proxy = client
    ///     .add_proxy(&ProxyPack::new(
    ///         "socket".into(),
    ///         "127.0.0.1:2001".into(),
    ///         "127.0.0.1:2000".into(),
    ///     ))
    ///     .expect("proxy is created");
    /// ```
    pub fn add_proxy(&self, proxy_pack: &ProxyPack) -> Result<Proxy> {
        let created: ProxyPack = self.session.post_with_data(
            "/proxies",
            proxy_pack,
            Resource::Proxy,
            &proxy_pack.name,
        )?;
        info!(proxy = %created.name, listen = %created.listen, "proxy added");
        Ok(Proxy::new(created, self.session.clone()))
    }

    /// Establish a set of proxies to work with. Existing proxies with the
    /// same names are updated rather than rejected.
    pub fn populate(&self, proxies: Vec<ProxyPack>) -> Result<Vec<Proxy>> {
        let reply: PopulateReply =
            self.session
                .post_with_data("/populate", &proxies, Resource::Proxy, "")?;

        Ok(reply
            .proxies
            .into_iter()
            .map(|proxy_pack| Proxy::new(proxy_pack, self.session.clone()))
            .collect())
    }

    /// Enable all proxies and remove all active toxics.
    pub fn reset(&self) -> Result<()> {
        self.session.post("/reset")?;
        info!("toxiproxy reset");
        Ok(())
    }

    /// Returns all registered proxies keyed by name.
    pub fn all(&self) -> Result<HashMap<String, Proxy>> {
        let proxy_map: HashMap<String, ProxyPack> =
            self.session.get("/proxies", Resource::Proxy, "")?;

        Ok(proxy_map
            .into_iter()
            .map(|(name, proxy_pack)| (name, Proxy::new(proxy_pack, self.session.clone())))
            .collect())
    }

    /// Health check for the Toxiproxy server.
    pub fn is_running(&self) -> bool {
        self.session.is_alive()
    }

    /// Version of the Toxiproxy server.
    pub fn version(&self) -> Result<String> {
        self.session.get_text("/version")
    }

    /// Fetches a proxy and resets its state (removes active toxics, enables
    /// it). Usually a good way to start a test.
    pub fn find_and_reset_proxy(&self, name: &str) -> Result<Proxy> {
        let proxy = self.find_proxy(name)?;
        proxy.delete_all_toxics()?;
        proxy.enable()
    }

    /// Fetches a proxy for finer grained control over it and its toxics.
    pub fn find_proxy(&self, name: &str) -> Result<Proxy> {
        let path = api_path(&["proxies", name]);
        let proxy_pack: ProxyPack = self.session.get(&path, Resource::Proxy, name)?;
        Ok(Proxy::new(proxy_pack, self.session.clone()))
    }

    pub fn remove_proxy(&self, name: &str) -> Result<()> {
        let path = api_path(&["proxies", name]);
        self.session.delete(&path, Resource::Proxy, name)?;
        info!(proxy = %name, "proxy removed");
        Ok(())
    }
}
