//! Proxies and the toxics attached to them.

use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;
use tracing::info;

use super::error::{Resource, Result};
use super::http_client::*;
use super::toxic::*;

fn default_enabled() -> bool {
    true
}

/// Config of a proxy, as sent to and returned by the server.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProxyPack {
    pub name: String,
    pub listen: String,
    pub upstream: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl ProxyPack {
    pub fn new(name: String, listen: String, upstream: String) -> Self {
        Self {
            name,
            listen,
            upstream,
            enabled: true,
        }
    }
}

#[derive(Serialize)]
struct EnabledPayload {
    enabled: bool,
}

/// A proxy confirmed by the server. Every method is a round trip; the
/// fields are a snapshot from the moment the handle was returned.
#[derive(Clone)]
pub struct Proxy {
    pub name: String,
    pub listen: String,
    pub upstream: String,
    pub enabled: bool,

    session: Session,
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("name", &self.name)
            .field("listen", &self.listen)
            .field("upstream", &self.upstream)
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl Proxy {
    pub(crate) fn new(proxy_pack: ProxyPack, session: Session) -> Self {
        Self {
            name: proxy_pack.name,
            listen: proxy_pack.listen,
            upstream: proxy_pack.upstream,
            enabled: proxy_pack.enabled,
            session,
        }
    }

    pub fn to_pack(&self) -> ProxyPack {
        ProxyPack {
            name: self.name.clone(),
            listen: self.listen.clone(),
            upstream: self.upstream.clone(),
            enabled: self.enabled,
        }
    }

    fn path(&self) -> String {
        api_path(&["proxies", &self.name])
    }

    fn toxics_path(&self) -> String {
        api_path(&["proxies", &self.name, "toxics"])
    }

    fn toxic_path(&self, toxic_name: &str) -> String {
        api_path(&["proxies", &self.name, "toxics", toxic_name])
    }

    fn toxic_resource(&self) -> Resource {
        Resource::Toxic {
            proxy: self.name.clone(),
        }
    }

    pub fn disable(&self) -> Result<Proxy> {
        self.set_enabled(false)
    }

    pub fn enable(&self) -> Result<Proxy> {
        self.set_enabled(true)
    }

    fn set_enabled(&self, enabled: bool) -> Result<Proxy> {
        let proxy_pack: ProxyPack = self.session.post_with_data(
            &self.path(),
            &EnabledPayload { enabled },
            Resource::Proxy,
            &self.name,
        )?;
        info!(proxy = %self.name, enabled, "proxy toggled");
        Ok(Proxy::new(proxy_pack, self.session.clone()))
    }

    /// Overwrites `listen`, `upstream` and `enabled`. The proxy keeps its name.
    pub fn update(&self, proxy_pack: &ProxyPack) -> Result<Proxy> {
        let proxy_pack: ProxyPack = self.session.post_with_data(
            &self.path(),
            proxy_pack,
            Resource::Proxy,
            &self.name,
        )?;
        Ok(Proxy::new(proxy_pack, self.session.clone()))
    }

    pub fn delete(&self) -> Result<()> {
        self.session
            .delete(&self.path(), Resource::Proxy, &self.name)?;
        info!(proxy = %self.name, "proxy deleted");
        Ok(())
    }

    /// Every toxic currently attached, each decoded to its concrete kind,
    /// in the order the server lists them.
    pub fn toxics(&self) -> Result<Vec<Toxic>> {
        let toxic_packs: Vec<ToxicPack> =
            self.session
                .get(&self.toxics_path(), Resource::Proxy, &self.name)?;
        toxic_packs.into_iter().map(Toxic::try_from).collect()
    }

    pub fn toxic(&self, toxic_name: &str) -> Result<Toxic> {
        let toxic_pack: ToxicPack = self.session.get(
            &self.toxic_path(toxic_name),
            self.toxic_resource(),
            toxic_name,
        )?;
        Toxic::try_from(toxic_pack)
    }

    /// Attaches `toxic` and returns the server's copy, defaults included.
    /// A toxic with the same name on this proxy is a conflict.
    pub fn add_toxic(&self, toxic: &Toxic) -> Result<Toxic> {
        let toxic_pack: ToxicPack = self.session.post_with_data(
            &self.toxics_path(),
            toxic,
            self.toxic_resource(),
            &toxic.name,
        )?;
        let created = Toxic::try_from(toxic_pack)?;
        info!(
            proxy = %self.name,
            toxic = %created.name,
            kind = created.type_name(),
            "toxic added"
        );
        Ok(created)
    }

    /// Overwrites the attributes and toxicity of the toxic called
    /// `toxic_name`.
    ///
    /// The server never renames a toxic nor changes its stream, so the
    /// `name` and `stream` of `toxic` have no effect. The returned value is
    /// what the server kept.
    pub fn update_toxic(&self, toxic_name: &str, toxic: &Toxic) -> Result<Toxic> {
        let toxic_pack: ToxicPack = self.session.post_with_data(
            &self.toxic_path(toxic_name),
            toxic,
            self.toxic_resource(),
            toxic_name,
        )?;
        Toxic::try_from(toxic_pack)
    }

    pub fn remove_toxic(&self, toxic_name: &str) -> Result<()> {
        self.session
            .delete(&self.toxic_path(toxic_name), self.toxic_resource(), toxic_name)?;
        info!(proxy = %self.name, toxic = %toxic_name, "toxic removed");
        Ok(())
    }

    /// Removes every toxic, stopping at the first failure.
    pub fn delete_all_toxics(&self) -> Result<()> {
        for toxic in self.toxics()? {
            self.remove_toxic(&toxic.name)?;
        }
        Ok(())
    }

    /// Runs `closure` with the proxy disabled, then enables it again.
    pub fn down<F>(&self, closure: F) -> Result<()>
    where
        F: FnOnce(),
    {
        self.disable()?;
        closure();
        self.enable().map(|_| ())
    }

    /// Runs `closure` with the current toxics in place, then removes all
    /// of them.
    pub fn apply<F>(&self, closure: F) -> Result<()>
    where
        F: FnOnce(),
    {
        closure();
        self.delete_all_toxics()
    }
}
