use std::sync::Arc;

use tracing::{info, warn};

use tally_core::{
    config::Config,
    store::{DisabledStore, RegistryStore},
};
use tally_jsonbin::JsonBinStore;

#[tokio::main]
async fn main() -> Result<(), tally_core::Error> {
    tally_core::logging::init("tally")?;

    let cfg = Arc::new(Config::load()?);

    let store: Arc<dyn RegistryStore> = match cfg.jsonbin_credentials() {
        Some((api_key, bin_id)) => {
            info!("registry stored in jsonbin bin {bin_id}");
            Arc::new(JsonBinStore::new(
                cfg.jsonbin_base_url.clone(),
                bin_id,
                api_key,
                cfg.http_timeout,
            )?)
        }
        None => {
            warn!("JSONBIN_API_KEY / JSONBIN_BIN_ID not set; users will not be recorded");
            Arc::new(DisabledStore)
        }
    };

    tally_telegram::router::run_webhook(cfg, store)
        .await
        .map_err(|e| tally_core::Error::External(format!("webhook server failed: {e}")))?;

    Ok(())
}
