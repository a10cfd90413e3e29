use anyhow::Context;
use readlist_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load readlist settings")?;
    readlist_telemetry::init(&settings.telemetry)?;

    readlist_app::run(settings).await
}
