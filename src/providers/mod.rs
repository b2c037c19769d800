//! Boundary adapters for concrete chat-completion backends.

mod anthropic;
mod cohere;
mod google;
mod openai;

pub use anthropic::AnthropicProvider;
pub use cohere::CohereProvider;
pub use google::GoogleProvider;
pub use openai::OpenAiCompatibleProvider;
