pub(crate) const DEFAULT_URL: &str = "http://127.0.0.1:8474";
pub(crate) const ENV_URL: &str = "TOXIPROXY_URL";
pub(crate) const ENV_TIMEOUT_MS: &str = "TOXIPROXY_TIMEOUT_MS";

pub(crate) const TYPE_LATENCY: &str = "latency";
pub(crate) const TYPE_BANDWIDTH: &str = "bandwidth";
pub(crate) const TYPE_SLOW_CLOSE: &str = "slow_close";
pub(crate) const TYPE_TIMEOUT: &str = "timeout";
pub(crate) const TYPE_SLICER: &str = "slicer";
pub(crate) const TYPE_RESET_PEER: &str = "reset_peer";
pub(crate) const TYPE_LIMIT_DATA: &str = "limit_data";
