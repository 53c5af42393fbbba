//! LLM calls: text cleanup before parsing, and the shared retry loop.
//!
//! All prompt text lives in [`crate::prompts`]. This module only builds the
//! message list, applies the per-call timeout, and retries.
//!
//! ## Retry Strategy
//!
//! Exponential backoff (`retry_backoff_ms * 2^attempt`): with a 500 ms base
//! and 3 retries the waits are 500 ms → 1 s → 2 s.

use crate::config::ExtractionConfig;
use crate::error::Pdf2XyzError;
use crate::pipeline::postprocess::clean_llm_output;
use crate::prompts::CleanupRole;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

/// Text returned by a successful LLM call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LlmReply {
    pub content: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Failed attempts before this one succeeded.
    pub retries: u32,
}

/// Send `messages` to the provider, retrying transient failures.
///
/// Returns [`Pdf2XyzError::ApiTimeout`] when the last attempt timed out and
/// [`Pdf2XyzError::LlmApiError`] for any other final failure.
pub async fn chat_with_retry(
    provider: &Arc<dyn LLMProvider>,
    messages: &[ChatMessage],
    config: &ExtractionConfig,
    label: &str,
) -> Result<LlmReply, Pdf2XyzError> {
    let options = build_options(config);
    let call_timeout = Duration::from_secs(config.api_timeout_secs);
    let mut last_err = Pdf2XyzError::LlmApiError {
        message: "no attempt made".into(),
    };

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = backoff_ms(config.retry_backoff_ms, attempt);
            warn!(
                "{}: retry {}/{} after {}ms",
                label, attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        let start = Instant::now();
        match timeout(call_timeout, provider.chat(messages, Some(&options))).await {
            Ok(Ok(response)) => {
                debug!(
                    "{}: {} input tokens, {} output tokens, {:?}",
                    label,
                    response.prompt_tokens,
                    response.completion_tokens,
                    start.elapsed()
                );
                return Ok(LlmReply {
                    content: response.content,
                    input_tokens: response.prompt_tokens as u64,
                    output_tokens: response.completion_tokens as u64,
                    retries: attempt,
                });
            }
            Ok(Err(e)) => {
                warn!("{}: attempt {} failed: {}", label, attempt + 1, e);
                last_err = Pdf2XyzError::LlmApiError {
                    message: e.to_string(),
                };
            }
            Err(_) => {
                let elapsed_ms = start.elapsed().as_millis() as u64;
                warn!("{}: attempt {} timed out after {}ms", label, attempt + 1, elapsed_ms);
                last_err = Pdf2XyzError::ApiTimeout { elapsed_ms };
            }
        }
    }

    Err(last_err)
}

/// Run the cleanup role over raw document text.
///
/// The reply is stripped of fences and invisible characters before it is
/// returned.
pub async fn clean_text(
    provider: &Arc<dyn LLMProvider>,
    text: &str,
    role: CleanupRole,
    config: &ExtractionConfig,
    label: &str,
) -> Result<LlmReply, Pdf2XyzError> {
    info!("{}: LLM cleanup ({}), {} chars in", label, role, text.len());
    let messages = vec![
        ChatMessage::system(role.system_prompt()),
        ChatMessage::user(text),
    ];
    let mut reply = chat_with_retry(provider, &messages, config, label).await?;
    reply.content = clean_llm_output(&reply.content);
    Ok(reply)
}

fn backoff_ms(base_ms: u64, attempt: u32) -> u64 {
    base_ms.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
}

/// Build `CompletionOptions` from the extraction config.
fn build_options(config: &ExtractionConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_defaults() {
        let config = ExtractionConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.0));
        assert_eq!(opts.max_tokens, Some(8192));
    }

    #[test]
    fn backoff_doubles() {
        assert_eq!(backoff_ms(500, 1), 500);
        assert_eq!(backoff_ms(500, 2), 1000);
        assert_eq!(backoff_ms(500, 3), 2000);
        assert_eq!(backoff_ms(u64::MAX, 5), u64::MAX);
    }
}
