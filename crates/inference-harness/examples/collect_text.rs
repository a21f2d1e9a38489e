use std::sync::Arc;

use inference_harness::observability::init_observability;
use inference_harness::prelude::*;
use inference_harness::vendors::azure_inference::{
    AZURE_INFERENCE_PROVIDER, AzureInferenceProvider, AzureInferenceRequestOptions,
    AzureInferenceRunBuilderExt,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), HarnessError> {
    init_observability("info");

    let harness = Harness::builder()
        .register_provider(Arc::new(AzureInferenceProvider::from_env()?))
        .build()?;

    let output = harness
        .run(ModelRef::new(AZURE_INFERENCE_PROVIDER, "gpt-4o-mini"))
        .system_prompt("You are a concise assistant. Reply with a short sentence.")
        .user_text("Say hello")
        .azure_inference_options(AzureInferenceRequestOptions::default().max_tokens(64))
        .collect_output()
        .await?;

    println!("{}", output.text);
    if let Some(usage) = &output.usage {
        for (metric, value) in usage.metrics() {
            println!("{metric} = {value}");
        }
    }
    Ok(())
}
