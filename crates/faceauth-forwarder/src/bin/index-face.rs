//! index-face: Lambda entry point adding faces to the shared collection

use aws_config::BehaviorVersion;
use faceauth_forwarder::rekognition::RekognitionProvider;
use faceauth_forwarder::{index_face, logging};
use lambda_runtime::{Error, LambdaEvent, service_fn};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    logging::init();

    let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
    let provider = RekognitionProvider::new(&config);
    let provider = &provider;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        Ok::<_, Error>(index_face::handle_value(provider, event.payload).await)
    }))
    .await
}
