pub mod search;
pub mod slack;

use readlist_kernel::{settings::Settings, ModuleRegistry};

/// Register all service modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, settings: &Settings) -> anyhow::Result<()> {
    registry.register(search::create_module(&settings.search)?)?;
    registry.register(slack::create_module(&settings.bot, &settings.reading_list)?)?;
    Ok(())
}
