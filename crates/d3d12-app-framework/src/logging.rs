use crate::error::HostResult;
use tracing_subscriber::EnvFilter;

/// Installs the eyre panic/report hooks and a stdout subscriber.
///
/// `RUST_LOG` overrides the default `info` filter.
pub fn init() -> HostResult<()> {
    color_eyre::install()?;
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt::SubscriberBuilder::default()
        .with_env_filter(env_filter)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .with_target(false)
        .init();
    Ok(())
}
