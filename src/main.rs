use toxiproxy_client::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let client = Client::new(Config::from_env()?)?;
    if !client.is_running() {
        tracing::error!("toxiproxy server is not reachable");
        std::process::exit(1);
    }
    info!(version = %client.version()?.trim(), "connected");

    client.reset()?;
    let proxies = client.populate(vec![ProxyPack::new(
        "socket".into(),
        "127.0.0.1:2000".into(),
        "127.0.0.1:2001".into(),
    )])?;

    for proxy in &proxies {
        proxy.add_toxic(&Toxic::latency(ToxicDirection::DownStream, 100, 10))?;
        for toxic in proxy.toxics()? {
            info!(proxy = %proxy.name, toxic = %toxic.name, kind = toxic.type_name(), "active");
        }
    }

    client.reset()
}
