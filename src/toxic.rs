//! Represents a [Toxic] - an effect on the network connection.
//!
//! Every toxic kind the server knows is a variant of [`ToxicKind`] carrying
//! its own attribute record. On the wire a toxic is a flat [`ToxicPack`]
//! whose `type` field selects the variant when decoding.
//!
//! [Toxic]: https://github.com/Shopify/toxiproxy#toxics

use serde::{de, ser, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::convert::TryFrom;

use super::codec::lowercase_enum;
use super::consts::*;
use super::error::{Error, Result};

pub type ToxicValueType = u32;

/// Direction of the connection a toxic acts on.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToxicDirection {
    /// Client to upstream.
    UpStream,
    /// Upstream to client. The server's default.
    DownStream,
}

impl Default for ToxicDirection {
    fn default() -> Self {
        ToxicDirection::DownStream
    }
}

/// Adds a delay to all data going through the proxy.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
#[serde(default)]
pub struct LatencyAttributes {
    /// Milliseconds.
    pub latency: ToxicValueType,
    /// Milliseconds, added or subtracted at random.
    pub jitter: ToxicValueType,
}

/// Limits throughput.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
#[serde(default)]
pub struct BandwidthAttributes {
    /// KB/s.
    pub rate: ToxicValueType,
}

/// Delays the TCP socket from closing until `delay` has elapsed.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
#[serde(default)]
pub struct SlowCloseAttributes {
    /// Milliseconds.
    pub delay: ToxicValueType,
}

/// Stops all data and closes the connection after `timeout`. A zero
/// timeout keeps the connection open without passing data.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
#[serde(default)]
pub struct TimeoutAttributes {
    /// Milliseconds.
    pub timeout: ToxicValueType,
}

/// Slices data into smaller packets, optionally delaying between them.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
#[serde(default)]
pub struct SlicerAttributes {
    /// Average packet size in bytes.
    pub average_size: ToxicValueType,
    /// Bytes to vary the packet size by.
    pub size_variation: ToxicValueType,
    /// Microseconds between packets.
    pub delay: ToxicValueType,
}

/// Simulates a TCP RESET on the connection after `timeout`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
#[serde(default)]
pub struct ResetPeerAttributes {
    /// Milliseconds.
    pub timeout: ToxicValueType,
}

/// Closes the connection once `bytes` have been transmitted.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
#[serde(default)]
pub struct LimitDataAttributes {
    pub bytes: u64,
}

/// The closed set of toxic kinds. Serializes as the bare attribute record.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ToxicKind {
    Latency(LatencyAttributes),
    Bandwidth(BandwidthAttributes),
    SlowClose(SlowCloseAttributes),
    Timeout(TimeoutAttributes),
    Slicer(SlicerAttributes),
    ResetPeer(ResetPeerAttributes),
    LimitData(LimitDataAttributes),
}

impl ToxicKind {
    /// The `type` discriminator used on the wire.
    pub fn type_name(&self) -> &'static str {
        match self {
            ToxicKind::Latency(_) => TYPE_LATENCY,
            ToxicKind::Bandwidth(_) => TYPE_BANDWIDTH,
            ToxicKind::SlowClose(_) => TYPE_SLOW_CLOSE,
            ToxicKind::Timeout(_) => TYPE_TIMEOUT,
            ToxicKind::Slicer(_) => TYPE_SLICER,
            ToxicKind::ResetPeer(_) => TYPE_RESET_PEER,
            ToxicKind::LimitData(_) => TYPE_LIMIT_DATA,
        }
    }

    /// Whether the kind acts on one direction. `reset_peer` resets the whole
    /// connection, so its stream is left at the default.
    pub fn is_directional(&self) -> bool {
        !matches!(self, ToxicKind::ResetPeer(_))
    }

    /// Builds the variant named by `type_name` from its raw attributes.
    pub fn decode(type_name: &str, attributes: Value) -> Result<Self> {
        let attributes = match attributes {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };

        let kind = match type_name {
            TYPE_LATENCY => ToxicKind::Latency(serde_json::from_value(attributes)?),
            TYPE_BANDWIDTH => ToxicKind::Bandwidth(serde_json::from_value(attributes)?),
            TYPE_SLOW_CLOSE => ToxicKind::SlowClose(serde_json::from_value(attributes)?),
            TYPE_TIMEOUT => ToxicKind::Timeout(serde_json::from_value(attributes)?),
            TYPE_SLICER => ToxicKind::Slicer(serde_json::from_value(attributes)?),
            TYPE_RESET_PEER => ToxicKind::ResetPeer(serde_json::from_value(attributes)?),
            TYPE_LIMIT_DATA => ToxicKind::LimitData(serde_json::from_value(attributes)?),
            other => return Err(Error::UnrecognizedToxicType(other.to_owned())),
        };
        Ok(kind)
    }
}

fn default_toxicity() -> f32 {
    1.0
}

/// Wire form of a toxic.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToxicPack {
    pub name: String,
    pub r#type: String,
    #[serde(with = "lowercase_enum", default)]
    pub stream: ToxicDirection,
    #[serde(default = "default_toxicity")]
    pub toxicity: f32,
    #[serde(default)]
    pub attributes: Value,
}

/// A toxic as the client sees it: common fields plus the kind-specific
/// attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Toxic {
    pub name: String,
    pub stream: ToxicDirection,
    /// Probability in `[0, 1]` that the toxic applies to a connection.
    pub toxicity: f32,
    pub kind: ToxicKind,
}

impl Toxic {
    /// New toxic named `<type>_<stream>`, the name the server would pick,
    /// or just `<type>` for kinds without a direction.
    pub fn new(kind: ToxicKind, stream: ToxicDirection) -> Self {
        let name = if kind.is_directional() {
            let stream_name = match stream {
                ToxicDirection::UpStream => "upstream",
                ToxicDirection::DownStream => "downstream",
            };
            format!("{}_{}", kind.type_name(), stream_name)
        } else {
            kind.type_name().to_owned()
        };
        Self {
            name,
            stream,
            toxicity: default_toxicity(),
            kind,
        }
    }

    pub fn latency(
        stream: ToxicDirection,
        latency: ToxicValueType,
        jitter: ToxicValueType,
    ) -> Self {
        Self::new(
            ToxicKind::Latency(LatencyAttributes { latency, jitter }),
            stream,
        )
    }

    pub fn bandwidth(stream: ToxicDirection, rate: ToxicValueType) -> Self {
        Self::new(ToxicKind::Bandwidth(BandwidthAttributes { rate }), stream)
    }

    pub fn slow_close(stream: ToxicDirection, delay: ToxicValueType) -> Self {
        Self::new(ToxicKind::SlowClose(SlowCloseAttributes { delay }), stream)
    }

    pub fn timeout(stream: ToxicDirection, timeout: ToxicValueType) -> Self {
        Self::new(ToxicKind::Timeout(TimeoutAttributes { timeout }), stream)
    }

    pub fn slicer(
        stream: ToxicDirection,
        average_size: ToxicValueType,
        size_variation: ToxicValueType,
        delay: ToxicValueType,
    ) -> Self {
        Self::new(
            ToxicKind::Slicer(SlicerAttributes {
                average_size,
                size_variation,
                delay,
            }),
            stream,
        )
    }

    pub fn reset_peer(timeout: ToxicValueType) -> Self {
        Self::new(
            ToxicKind::ResetPeer(ResetPeerAttributes { timeout }),
            ToxicDirection::default(),
        )
    }

    pub fn limit_data(stream: ToxicDirection, bytes: u64) -> Self {
        Self::new(ToxicKind::LimitData(LimitDataAttributes { bytes }), stream)
    }

    pub fn named<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_toxicity(mut self, toxicity: f32) -> Self {
        self.toxicity = toxicity;
        self
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    pub fn to_pack(&self) -> Result<ToxicPack> {
        Ok(ToxicPack {
            name: self.name.clone(),
            r#type: self.type_name().to_owned(),
            stream: self.stream,
            toxicity: self.toxicity,
            attributes: serde_json::to_value(&self.kind)?,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_pack()?)?)
    }

    /// Decodes a single toxic, dispatching on its `type` field.
    pub fn from_json(json: &str) -> Result<Self> {
        let pack: ToxicPack = serde_json::from_str(json)?;
        Toxic::try_from(pack)
    }
}

impl TryFrom<ToxicPack> for Toxic {
    type Error = Error;

    fn try_from(pack: ToxicPack) -> Result<Self> {
        let kind = ToxicKind::decode(&pack.r#type, pack.attributes)?;
        Ok(Self {
            name: pack.name,
            stream: pack.stream,
            toxicity: pack.toxicity,
            kind,
        })
    }
}

impl Serialize for Toxic {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_pack()
            .map_err(ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Toxic {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let pack = ToxicPack::deserialize(deserializer)?;
        Toxic::try_from(pack).map_err(de::Error::custom)
    }
}
