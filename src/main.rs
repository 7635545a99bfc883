mod app;
mod probe;

use anyhow::Result;
use wxpanel_core::Config;

use crate::app::App;

#[tokio::main]
async fn main() -> Result<()> {
    wxpanel_core::init()?;

    let (config, validation) = Config::load_validated()?;
    if !config.weather.has_api_key() {
        tracing::warn!("No weather API key configured; requests will be rejected");
    }
    tracing::debug!(warnings = validation.warnings.len(), "Configuration loaded");

    App::new(config).run().await
}
