pub mod artifacts;
pub mod config;
pub mod ctaphid;
pub mod diagnostics;
pub mod error;
pub mod hid;
pub mod up;

pub use error::{Error, Result};

pub fn run(cfg: config::Config) -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;
    let level = match cfg.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .init();

    tracing::info!("Starting fidoprobe");

    if cfg.list {
        return diagnostics::print_fido_devices();
    }

    diagnostics::check(&cfg)?;

    let path = cfg
        .device
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("--device is required unless --list is given"))?;
    let connector = hid::FidoConnector::from_path(path)?;
    let mut session =
        ctaphid::Session::with_seed(connector, cfg.seed).verbose(cfg.verbose >= 2);

    session.init()?;
    tracing::info!("INIT handshake complete");

    session.ping(b"fidoprobe transport self-test")?;
    tracing::info!("PING round-trip verified");

    if cfg.wink {
        if let Err(e) = session.wink() {
            tracing::warn!("WINK failed: {e}");
        }
    }

    diagnostics::print_capability_report(&session);
    Ok(())
}
