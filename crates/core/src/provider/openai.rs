use crate::completion::{ChatMessage, CompletionChunk, CompletionModel};
use crate::config::GatewayConfig;
use anyhow::{Result, anyhow};
use async_openai::config::OpenAIConfig;
use async_openai::{Client as OpenAIClient, error::OpenAIError};
use async_trait::async_trait;
use futures::stream::{BoxStream, Stream, StreamExt};
use serde_json::{Value, json};
use std::pin::Pin;
use tracing::debug;

type ChunkStream = Pin<Box<dyn Stream<Item = Result<Value, OpenAIError>> + Send>>;

/// Streams chat completions from an OpenAI-compatible gateway.
///
/// Requests go through the client's bring-your-own-types path so any model
/// identifier the gateway accepts, such as `anthropic/claude-3.7-sonnet`, is
/// passed through unchanged.
pub struct OpenAIProvider {
    client: OpenAIClient<OpenAIConfig>,
    // Resolution error is kept so it surfaces on the first request instead of
    // at startup.
    api_key: Result<(), String>,
}

impl OpenAIProvider {
    pub fn new(gateway: &GatewayConfig) -> Result<Self> {
        // If api_key starts with "env:", read from environment variable
        let api_key = match gateway.api_key.strip_prefix("env:") {
            Some(env_key) => {
                let env_key = env_key.trim();
                std::env::var(env_key)
                    .map_err(|_| format!("Environment variable {env_key} not found"))
            }
            None => Ok(gateway.api_key.clone()),
        };

        let config = OpenAIConfig::new()
            .with_api_key(api_key.clone().unwrap_or_default())
            .with_api_base(gateway.base_url.trim_end_matches('/'));

        Ok(Self {
            client: OpenAIClient::with_config(config),
            api_key: api_key.map(|_| ()),
        })
    }

    fn to_openai_message(msg: &ChatMessage) -> Value {
        json!({"role": msg.sender.as_str(), "content": msg.text})
    }
}

async fn open_stream(client: &OpenAIClient<OpenAIConfig>, request: Value) -> Result<ChunkStream> {
    let stream = client.chat().create_stream_byot(request).await?;
    Ok(stream)
}

/// Maps the first choice of a stream chunk; usage-only chunks carry none.
fn to_completion_chunk(chunk: &Value) -> Option<CompletionChunk> {
    let choice = chunk.get("choices")?.get(0)?;
    let text = choice
        .pointer("/delta/content")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let finish_reason = choice
        .get("finish_reason")
        .and_then(Value::as_str)
        .map(str::to_string);
    Some(CompletionChunk {
        text: text.to_string(),
        finish_reason,
    })
}

#[async_trait]
impl CompletionModel for OpenAIProvider {
    async fn complete(
        &self,
        model_id: &str,
        messages: &[ChatMessage],
    ) -> BoxStream<'static, Result<CompletionChunk>> {
        if let Err(e) = &self.api_key {
            let e = e.clone();
            return Box::pin(futures::stream::once(async move { Err(anyhow!(e)) }));
        }

        let openai_messages: Vec<Value> = messages
            .iter()
            .map(OpenAIProvider::to_openai_message)
            .collect();
        let request = json!({
            "model": model_id,
            "messages": openai_messages,
            "stream": true,
        });
        debug!(model = model_id, "Requesting chat completion");

        let client = self.client.clone();
        let outer_stream = async_stream::stream! {
            let mut stream = match open_stream(&client, request).await {
                Ok(stream) => stream,
                Err(err) => {
                    yield Err(anyhow!("Request failed: {err}"));
                    return;
                }
            };

            while let Some(next) = stream.next().await {
                match next {
                    Ok(chunk) => {
                        if let Some(chunk) = to_completion_chunk(&chunk) {
                            yield Ok(chunk);
                        }
                    }
                    Err(err) => {
                        yield Err(anyhow!("Request failed: {err}"));
                        return;
                    }
                }
            }
        };

        Box::pin(outer_stream)
    }
}
