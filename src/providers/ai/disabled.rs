//! No-op provider used when AI features are turned off.

use async_trait::async_trait;

use super::traits::{CompletionRequest, CompletionResponse, LlmError, LlmProvider, LlmResult};

/// Provider that refuses every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledProvider;

#[async_trait]
impl LlmProvider for DisabledProvider {
    fn name(&self) -> &str {
        "disabled"
    }

    fn model(&self) -> &str {
        "none"
    }

    async fn complete(&self, _request: &CompletionRequest) -> LlmResult<CompletionResponse> {
        Err(LlmError::Unavailable("AI backend is disabled".to_string()))
    }

    fn is_enabled(&self) -> bool {
        false
    }
}
