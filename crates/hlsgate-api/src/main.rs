use hlsgate_core::Config;

// Use mimalloc as the global allocator for better performance and lower fragmentation,
// especially when running on musl-based systems inside containers.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    let (state, router) = hlsgate_api::setup::initialize_app(config.clone()).await?;

    hlsgate_api::setup::server::start_server(&config, router, state.transcoder.clone()).await?;

    Ok(())
}
