use helloworld_core::HelloworldConfig;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = HelloworldConfig::from_env()?;

    helloworld_api::telemetry::init_telemetry()
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    let (_state, router) = helloworld_api::setup::initialize_app(config.clone()).await?;

    helloworld_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
