//! The capability contract every provider adapter satisfies.

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::types::{CompletionOptions, CompletionResponse, Message};

/// A boundary adapter for one chat-completion backend.
///
/// Implementations translate the generic request shape into their backend's
/// wire format, perform the call, and normalize the raw reply into a
/// [`CompletionResponse`]. Backend failures of any kind surface as
/// [`ProviderError`].
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// The provider key this adapter serves.
    fn name(&self) -> &str;

    /// Make a chat completion request.
    ///
    /// Callers guarantee `model` and `messages` are non-empty.
    async fn complete(
        &self,
        model: &str,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, ProviderError>;
}
