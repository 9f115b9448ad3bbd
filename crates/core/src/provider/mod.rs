mod openai;

use crate::completion::CompletionModel;
use crate::config::GatewayConfig;
use anyhow::Result;
use tracing::instrument;

/// Builds the completion provider serving every model in the registry.
#[instrument(skip(gateway), fields(base_url = %gateway.base_url))]
pub fn get_completion_llm(gateway: &GatewayConfig) -> Result<Box<dyn CompletionModel>> {
    let model = openai::OpenAIProvider::new(gateway)?;
    Ok(Box::new(model))
}
