use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ycprov_orchestrator::provider_manager::ProviderManager;
use ycprov_orchestrator::provisioning;
use ycprov_orchestrator::settings::{load_config, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Everything that can fail without the network is checked first.
    let settings = Settings::from_env().context("loading settings")?;
    let config = load_config(&settings.config_path).context("loading VM descriptor")?;
    let credentials = settings.credentials().context("loading credentials")?;
    let provider =
        ProviderManager::get_provider(&settings, &credentials).context("building provider")?;
    info!(
        "📋 [ycprov] descriptor={}, endpoint={}, provider={}",
        settings.config_path.display(),
        settings.compute_endpoint,
        provider.name()
    );

    let op = provisioning::provision(provider.as_ref(), &config, &credentials)
        .await
        .context("provisioning failed")?;

    println!("Running Yandex.Cloud operation. ID: {}", op.id);
    Ok(())
}
