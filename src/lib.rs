//! A typed, blocking client for the [Toxiproxy] control API.
//!
//! Proxies and toxics are plain values mirrored from the server; every
//! operation on them is a single HTTP round trip. Toxics are decoded into a
//! closed set of kinds ([`toxic::ToxicKind`]) keyed by their `type` field.
//!
//! ```no_run
//! use toxiproxy_client::*;
//!
//! let client = Client::new(Config::from_env()?)?;
//! let proxy = client.add_proxy(&ProxyPack::new(
//!     "redis".into(),
//!     "127.0.0.1:26379".into(),
//!     "127.0.0.1:6379".into(),
//! ))?;
//! proxy.add_toxic(&Toxic::latency(ToxicDirection::DownStream, 500, 50))?;
//! # Ok::<(), toxiproxy_client::Error>(())
//! ```
//!
//! [Toxiproxy]: https://github.com/Shopify/toxiproxy

pub mod client;
pub mod codec;
pub mod config;
mod consts;
pub mod error;
pub mod http_client;
pub mod proxy;
pub mod toxic;

pub use client::Client;
pub use config::Config;
pub use error::{Error, Resource, Result, TransportError};
pub use http_client::{HttpClient, Reply, Transport};
pub use proxy::{Proxy, ProxyPack};
pub use toxic::{Toxic, ToxicDirection, ToxicKind, ToxicPack};
