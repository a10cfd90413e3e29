//! Reading list service
//!
//! Book search proxy for the autocomplete widget and the `/book` chat
//! slash command, served as modules on the shared HTTP facade.

pub mod modules;
pub mod utils;

use anyhow::Context;
use readlist_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// Build every module from `settings`, serve until shutdown, then stop them.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(
        env = ?settings.environment,
        host = %settings.server.host,
        port = settings.server.port,
        "readlist bootstrap starting"
    );

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &settings).context("failed to build modules")?;

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    tracing::info!(modules = registry.len(), "readlist bootstrap complete");

    let served = readlist_http::start_server(&registry, &settings).await;
    registry.stop_modules().await?;
    served
}
