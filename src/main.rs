use anyhow::Context;
use folio_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load folio settings")?;

    folio_telemetry::init(&settings.telemetry).context("failed to initialize tracing")?;

    folio_app::run(settings).await
}
