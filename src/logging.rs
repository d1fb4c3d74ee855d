use tracing_subscriber::filter::ParseError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "warn,pdf_chat_lib=info";
const VERBOSE_FILTER: &str = "info,pdf_chat_lib=debug";

/// Install a stderr subscriber. `RUST_LOG` wins over `verbose`.
pub fn init(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = build_filter(std::env::var("RUST_LOG").ok(), verbose)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()?;
    Ok(())
}

fn build_filter(env_spec: Option<String>, verbose: bool) -> Result<EnvFilter, ParseError> {
    match env_spec {
        Some(spec) => EnvFilter::try_new(spec),
        None if verbose => EnvFilter::try_new(VERBOSE_FILTER),
        None => EnvFilter::try_new(DEFAULT_FILTER),
    }
}
