use webplab_core::ServerConfig;
use webplab_infra::{init_telemetry, LogFormat};

// Use mimalloc as the global allocator
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = ServerConfig::from_env()?;

    init_telemetry(
        LogFormat::parse(&config.log_format),
        env!("CARGO_PKG_NAME"),
        &config.environment,
    )
    .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    let (state, router) = webplab_api::setup::initialize_app(config.clone())?;

    webplab_api::setup::server::start_server(&config, router, state.shutdown.clone()).await?;

    Ok(())
}
