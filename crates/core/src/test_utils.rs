//! Test utilities for litechat-core
//!
//! Fakes for the completion provider and the renderer so the streaming session
//! and everything built on it can be exercised without a network or terminal.
//! Enabled for this crate's tests and, through the `test-utils` feature, for
//! dependent crates' tests.

use crate::completion::{ChatMessage, CompletionChunk, CompletionModel};
use crate::session::ResponseRenderer;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::Builder;

/// A scripted `CompletionModel`.
///
/// Streams the configured fragments, optionally followed by an error, and
/// records every request it receives.
#[derive(Debug, Default)]
pub struct MockCompletionModel {
    fragments: Vec<String>,
    error: Option<String>,
    requests: Mutex<Vec<(String, Vec<ChatMessage>)>>,
}

impl MockCompletionModel {
    /// A model that streams `fragments` and then a `stop` framing chunk.
    pub fn with_fragments(fragments: &[&str]) -> Self {
        Self {
            fragments: fragments.iter().map(|f| f.to_string()).collect(),
            ..Default::default()
        }
    }

    /// A model whose request fails before any fragment arrives.
    pub fn failing(error: &str) -> Self {
        Self::failing_after(&[], error)
    }

    /// A model that streams `fragments` and then fails.
    pub fn failing_after(fragments: &[&str], error: &str) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::with_fragments(fragments)
        }
    }

    /// Model identifiers and messages of every request received so far.
    pub fn requests(&self) -> Vec<(String, Vec<ChatMessage>)> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests().len()
    }
}

#[async_trait]
impl CompletionModel for MockCompletionModel {
    async fn complete(
        &self,
        model_id: &str,
        messages: &[ChatMessage],
    ) -> BoxStream<'static, Result<CompletionChunk>> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push((model_id.to_string(), messages.to_vec()));
        }

        let mut items: Vec<Result<CompletionChunk>> = self
            .fragments
            .iter()
            .map(|text| {
                Ok(CompletionChunk {
                    text: text.clone(),
                    finish_reason: None,
                })
            })
            .collect();
        match &self.error {
            Some(error) => items.push(Err(anyhow!("{error}"))),
            None => items.push(Ok(CompletionChunk {
                text: String::new(),
                finish_reason: Some("stop".to_string()),
            })),
        }
        Box::pin(stream::iter(items))
    }
}

/// A `ResponseRenderer` that keeps everything it is asked to draw.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub started: usize,
    pub updates: Vec<String>,
    pub finished: Option<String>,
    pub failures: Vec<String>,
}

impl ResponseRenderer for RecordingRenderer {
    fn start(&mut self) -> Result<()> {
        self.started += 1;
        Ok(())
    }

    fn update(&mut self, text: &str) -> Result<()> {
        self.updates.push(text.to_string());
        Ok(())
    }

    fn finish(&mut self, text: &str) -> Result<()> {
        self.finished = Some(text.to_string());
        Ok(())
    }

    fn report_failure(&mut self, error: &anyhow::Error) -> Result<()> {
        self.failures.push(error.to_string());
        Ok(())
    }
}

/// Creates a temporary config file with the given content.
/// Uses tempfile::Builder to ensure unique directories for parallel tests.
///
/// # Panics
/// Panics if temp directory creation or file writing fails.
pub fn create_temp_config(content: &str) -> PathBuf {
    let temp_dir = Builder::new()
        .prefix("litechat-test")
        .rand_bytes(8)
        .tempdir()
        .unwrap();
    let config_path = temp_dir.path().join("litechat.yml");
    fs::write(&config_path, content).unwrap();
    // Keep the temp directory alive by leaking it (this is just for tests)
    let _ = Box::leak(Box::new(temp_dir));
    config_path
}
