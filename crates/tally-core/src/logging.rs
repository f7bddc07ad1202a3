use crate::{errors::Error, Result};

/// Initialize tracing for the bot.
///
/// Default filter is `info` for the tally crates and `warn` for everything
/// else; `RUST_LOG` overrides it.
pub fn init(service_name: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(default_directives(service_name))
    });

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .try_init()
        .map_err(|e| Error::Config(format!("failed to install tracing subscriber: {e}")))
}

fn default_directives(service_name: &str) -> String {
    let service = service_name.replace('-', "_");
    format!(
        "warn,tally=info,tally_core=info,tally_jsonbin=info,tally_telegram=info,tower_http=info,{service}=info"
    )
}
