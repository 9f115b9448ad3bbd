//! A streaming turn between the user and the model.
//!
//! The session sends the conversation plus the new prompt to a
//! [`CompletionModel`], accumulates the streamed fragments and hands the growing
//! text to a [`ResponseRenderer`]. History is taken by value and a new history
//! is returned, so the caller's copy is only replaced once the turn is over.
use crate::completion::{ChatHistory, ChatMessage, CompletionModel};
use crate::registry::ProviderModelId;
use anyhow::Result;
use futures::StreamExt;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Displays a response while it streams in.
pub trait ResponseRenderer {
    /// Called once before the request is sent.
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    /// Redraws the response; `text` is everything received so far.
    fn update(&mut self, text: &str) -> Result<()>;

    /// Draws the complete response once the stream has ended.
    fn finish(&mut self, text: &str) -> Result<()>;

    /// Tells the user a completion request failed.
    fn report_failure(&mut self, error: &anyhow::Error) -> Result<()>;
}

/// Caps how often a streamed response is redrawn.
#[derive(Debug, Clone)]
pub struct RedrawThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl RedrawThrottle {
    pub fn per_second(rate: u32) -> Self {
        Self {
            interval: Duration::from_secs(1) / rate.max(1),
            last: None,
        }
    }

    /// Returns true, and records `now`, if a redraw is allowed at `now`.
    pub fn ready(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

pub struct StreamingSession<'a> {
    model: &'a dyn CompletionModel,
    refresh_per_second: u32,
}

impl<'a> StreamingSession<'a> {
    pub fn new(model: &'a dyn CompletionModel, refresh_per_second: u32) -> Self {
        Self {
            model,
            refresh_per_second,
        }
    }

    /// Streams a reply to `prompt` and returns the updated history.
    ///
    /// On a provider failure the failure is reported through `renderer` and
    /// `history` comes back unchanged. An `Err` is only returned when the
    /// renderer itself fails.
    pub async fn stream(
        &self,
        prompt: &str,
        model_id: &ProviderModelId,
        history: ChatHistory,
        renderer: &mut dyn ResponseRenderer,
    ) -> Result<ChatHistory> {
        let mut messages = history;
        messages.push(ChatMessage::user(prompt));

        debug!(model = %model_id, messages = messages.len(), "Sending completion request");
        renderer.start()?;

        let mut stream = self.model.complete(model_id.as_str(), &messages).await;
        let mut throttle = RedrawThrottle::per_second(self.refresh_per_second);
        let mut response = String::new();
        let mut finish_reason = None;

        while let Some(next) = stream.next().await {
            match next {
                Ok(chunk) => {
                    if chunk.finish_reason.is_some() {
                        finish_reason = chunk.finish_reason;
                    }
                    if chunk.text.is_empty() {
                        continue;
                    }
                    response.push_str(&chunk.text);
                    if throttle.ready(Instant::now()) {
                        renderer.update(&response)?;
                    }
                }
                Err(e) => {
                    warn!(model = %model_id, error = %e, "Completion failed");
                    if !response.is_empty() {
                        renderer.finish(&response)?;
                    }
                    renderer.report_failure(&e)?;
                    messages.pop();
                    return Ok(messages);
                }
            }
        }

        renderer.finish(&response)?;
        debug!(
            model = %model_id,
            chars = response.len(),
            finish_reason = finish_reason.as_deref().unwrap_or("none"),
            "Completion finished"
        );

        if !response.is_empty() {
            messages.push(ChatMessage::assistant(response));
        }
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::SenderType;
    use crate::registry::ModelRegistry;
    use crate::test_utils::{MockCompletionModel, RecordingRenderer};

    fn model_id() -> ProviderModelId {
        ModelRegistry::default()
            .resolve("openai/gpt-4.1-nano")
            .unwrap()
    }

    fn earlier_history() -> ChatHistory {
        vec![
            ChatMessage::user("What is 2+2?"),
            ChatMessage::assistant("4"),
        ]
    }

    #[tokio::test]
    async fn test_stream_appends_user_and_assistant_messages() {
        let model = MockCompletionModel::with_fragments(&["Hel", "lo"]);
        let session = StreamingSession::new(&model, 15);
        let mut renderer = RecordingRenderer::default();

        let history = session
            .stream("Say hello", &model_id(), earlier_history(), &mut renderer)
            .await
            .unwrap();

        assert_eq!(history.len(), 4);
        assert_eq!(history[2], ChatMessage::user("Say hello"));
        assert_eq!(history[3], ChatMessage::assistant("Hello"));
        assert_eq!(renderer.finished.as_deref(), Some("Hello"));
        assert!(renderer.failures.is_empty());
    }

    #[tokio::test]
    async fn test_stream_starts_renderer_once_per_turn() {
        let model = MockCompletionModel::with_fragments(&["a", "b", "c"]);
        let session = StreamingSession::new(&model, 1000);
        let mut renderer = RecordingRenderer::default();

        let history = session
            .stream("one", &model_id(), Vec::new(), &mut renderer)
            .await
            .unwrap();
        assert_eq!(renderer.started, 1);

        session
            .stream("two", &model_id(), history, &mut renderer)
            .await
            .unwrap();
        assert_eq!(renderer.started, 2);
    }

    #[tokio::test]
    async fn test_stream_sends_history_and_prompt_to_provider() {
        let model = MockCompletionModel::with_fragments(&["ok"]);
        let session = StreamingSession::new(&model, 15);
        let mut renderer = RecordingRenderer::default();

        session
            .stream("next", &model_id(), earlier_history(), &mut renderer)
            .await
            .unwrap();

        let requests = model.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, "gpt-4.1-nano");
        let senders: Vec<_> = requests[0].1.iter().map(|m| m.sender).collect();
        assert_eq!(
            senders,
            vec![SenderType::User, SenderType::Assistant, SenderType::User]
        );
        assert_eq!(requests[0].1[2].text, "next");
    }

    #[tokio::test]
    async fn test_stream_failure_returns_history_unchanged() {
        let model = MockCompletionModel::failing("connection refused");
        let session = StreamingSession::new(&model, 15);
        let mut renderer = RecordingRenderer::default();

        let history = session
            .stream("hello?", &model_id(), earlier_history(), &mut renderer)
            .await
            .unwrap();

        assert_eq!(history, earlier_history());
        assert_eq!(renderer.failures.len(), 1);
        assert!(renderer.failures[0].contains("connection refused"));
        assert_eq!(renderer.finished, None);
        assert_eq!(renderer.started, 1);
    }

    #[tokio::test]
    async fn test_stream_failure_mid_stream_discards_partial_reply() {
        let model = MockCompletionModel::failing_after(&["par", "tial"], "stream reset");
        let session = StreamingSession::new(&model, 15);
        let mut renderer = RecordingRenderer::default();

        let history = session
            .stream("hello?", &model_id(), Vec::new(), &mut renderer)
            .await
            .unwrap();

        assert!(history.is_empty());
        assert_eq!(renderer.finished.as_deref(), Some("partial"));
        assert_eq!(renderer.failures.len(), 1);
    }

    #[tokio::test]
    async fn test_stream_empty_reply_keeps_user_message_only() {
        let model = MockCompletionModel::with_fragments(&[]);
        let session = StreamingSession::new(&model, 15);
        let mut renderer = RecordingRenderer::default();

        let history = session
            .stream("anyone there?", &model_id(), Vec::new(), &mut renderer)
            .await
            .unwrap();

        assert_eq!(history, vec![ChatMessage::user("anyone there?")]);
        assert_eq!(renderer.finished.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_stream_skips_empty_fragments() {
        let model = MockCompletionModel::with_fragments(&["", "a", "", "b", ""]);
        let session = StreamingSession::new(&model, 1000);
        let mut renderer = RecordingRenderer::default();

        let history = session
            .stream("x", &model_id(), Vec::new(), &mut renderer)
            .await
            .unwrap();

        assert_eq!(history.last(), Some(&ChatMessage::assistant("ab")));
        // Every redraw shows a prefix of the final text, in order.
        for update in &renderer.updates {
            assert!("ab".starts_with(update.as_str()));
            assert!(!update.is_empty());
        }
    }

    #[tokio::test]
    async fn test_stream_throttles_redraws_but_keeps_all_text() {
        let fragments: Vec<String> = (0..200).map(|i| format!("{i} ")).collect();
        let refs: Vec<&str> = fragments.iter().map(String::as_str).collect();
        let model = MockCompletionModel::with_fragments(&refs);
        let session = StreamingSession::new(&model, 1);
        let mut renderer = RecordingRenderer::default();

        let history = session
            .stream("count", &model_id(), Vec::new(), &mut renderer)
            .await
            .unwrap();

        let expected: String = fragments.concat();
        assert!(renderer.updates.len() < fragments.len());
        assert_eq!(renderer.finished.as_deref(), Some(expected.as_str()));
        assert_eq!(history.last(), Some(&ChatMessage::assistant(expected)));
    }

    #[test]
    fn test_redraw_throttle() {
        let mut throttle = RedrawThrottle::per_second(10);
        let t0 = Instant::now();
        assert!(throttle.ready(t0));
        assert!(!throttle.ready(t0 + Duration::from_millis(50)));
        assert!(throttle.ready(t0 + Duration::from_millis(100)));
        assert!(!throttle.ready(t0 + Duration::from_millis(150)));
        assert!(throttle.ready(t0 + Duration::from_millis(250)));
    }

    #[test]
    fn test_redraw_throttle_zero_rate_is_clamped() {
        let mut throttle = RedrawThrottle::per_second(0);
        let t0 = Instant::now();
        assert!(throttle.ready(t0));
        assert!(!throttle.ready(t0 + Duration::from_millis(999)));
        assert!(throttle.ready(t0 + Duration::from_secs(1)));
    }
}
