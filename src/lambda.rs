#[cfg(feature = "lambda")]
use hail_lookup_broker::adapters::lambda::{handle_event, FunctionUrlRequest, FunctionUrlResponse};
#[cfg(feature = "lambda")]
use hail_lookup_broker::utils::{logger, validation::Validate};
#[cfg(feature = "lambda")]
use hail_lookup_broker::{BrokerConfig, HttpIngress};
#[cfg(feature = "lambda")]
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
#[cfg(feature = "lambda")]
use std::sync::Arc;

#[cfg(feature = "lambda")]
async fn function_handler(
    ingress: &HttpIngress,
    event: LambdaEvent<FunctionUrlRequest>,
) -> Result<FunctionUrlResponse, Error> {
    tracing::debug!(request_id = %event.context.request_id, "Handling lookup request");

    Ok(handle_event(ingress, event.payload).await)
}

#[cfg(feature = "lambda")]
#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    // 冷啟動時讀取一次配置
    let config = BrokerConfig::from_env()
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;
    config
        .validate()
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;

    tracing::info!(
        census_scaling = config.census_scaling_enabled(),
        property_lookup = config.property_lookup_enabled(),
        "Lookup broker Lambda initialized"
    );

    let ingress = Arc::new(HttpIngress::from_config(&config));

    run(service_fn(move |event: LambdaEvent<FunctionUrlRequest>| {
        let ingress = Arc::clone(&ingress);
        async move { function_handler(&ingress, event).await }
    }))
    .await
}
