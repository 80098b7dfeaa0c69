use std::sync::Arc;

use lambda_runtime::{service_fn, Error, LambdaEvent};
use purge_core::config::DispatcherConfig;
use purge_lambda::adapters::cdn::{CdnInvalidator, CloudFrontInvalidator, NoopInvalidator};
use purge_lambda::adapters::edge::CloudflarePurger;
use purge_lambda::handlers::dispatch::handle_object_created;
use serde_json::Value;

async fn handle_request(
    event: LambdaEvent<Value>,
    config: &DispatcherConfig,
    invalidator: &Arc<dyn CdnInvalidator>,
    purger: &CloudflarePurger,
) -> Result<Option<String>, Error> {
    handle_object_created(&event.payload, config, invalidator, purger)
        .await
        .map_err(Error::from)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = DispatcherConfig::from_env();

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let invalidator: Arc<dyn CdnInvalidator> = match config.cdn_distribution() {
        Some(_) => Arc::new(CloudFrontInvalidator::new(aws_sdk_cloudfront::Client::new(
            &aws_config,
        ))),
        None => Arc::new(NoopInvalidator),
    };
    let purger = CloudflarePurger;

    lambda_runtime::run(service_fn(|event| {
        handle_request(event, &config, &invalidator, &purger)
    }))
    .await
}
