use clap::Parser;
use hail_lookup_broker::adapters::server;
use hail_lookup_broker::utils::{logger, validation::Validate};
use hail_lookup_broker::{HttpIngress, ServerArgs};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    tracing::info!("🌩️ Starting hail lookup broker");

    let settings = match args.resolve() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("❌ Failed to load configuration: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    if args.verbose {
        tracing::debug!("Broker config: {:?}", settings.broker);
    }

    // 驗證配置
    if let Err(e) = settings.broker.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    if settings.broker.census_scaling_enabled() {
        tracing::info!("📊 Census population scaling enabled");
    } else {
        tracing::warn!(
            "CENSUS_API_KEY not set, census lookups report {} for every location",
            settings.broker.policy.default_population
        );
    }
    if !settings.broker.property_lookup_enabled() {
        tracing::warn!("GEOCODIO_API_KEY not set, property lookups will fail");
    }

    let ingress = Arc::new(HttpIngress::from_config(&settings.broker));
    let app = server::router(ingress);

    let listener = tokio::net::TcpListener::bind(&settings.bind).await?;
    tracing::info!(
        "🚀 Listening on {} (allowed origin {})",
        settings.bind,
        settings.broker.allowed_origin
    );

    axum::serve(listener, app).await?;

    Ok(())
}
