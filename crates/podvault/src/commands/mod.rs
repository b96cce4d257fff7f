//! CLI command implementations

pub mod backup;
pub mod restore;

use anyhow::{Context, Result};
use camino::Utf8Path;
use podvault_core::EngineConfig;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Load engine configuration from `--config` or the default search path.
pub(crate) fn load_config(path: Option<&Utf8Path>) -> Result<EngineConfig> {
    EngineConfig::load(path).context("Failed to load configuration")
}

/// Token cancelled on the first Ctrl-C.
pub(crate) fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping remote process");
            trigger.cancel();
        }
    });
    token
}
