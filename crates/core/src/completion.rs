use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderType {
    User,
    Assistant,
}

impl From<SenderType> for String {
    fn from(val: SenderType) -> Self {
        val.as_str().into()
    }
}

impl SenderType {
    pub fn as_str(&self) -> &'static str {
        match &self {
            SenderType::User => "user",
            SenderType::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: SenderType,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: SenderType::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            sender: SenderType::Assistant,
            text: text.into(),
        }
    }
}

/// Ordered conversation, oldest message first.
pub type ChatHistory = Vec<ChatMessage>;

/// One incremental piece of a streamed response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionChunk {
    /// Text delta; empty for framing chunks such as the final `finish_reason`.
    pub text: String,
    pub finish_reason: Option<String>,
}

/// A hosted model that can stream a chat completion.
///
/// Failures to send the request are reported as the first item of the
/// returned stream, so callers handle invocation and mid-stream errors alike.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(
        &self,
        model_id: &str,
        messages: &[ChatMessage],
    ) -> BoxStream<'static, Result<CompletionChunk>>;
}
