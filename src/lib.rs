//! llmux - one client, many chat-completion providers.
//!
//! Requests are addressed as `provider:model` and every backend's reply is
//! normalized into the same [`CompletionResponse`] shape:
//!
//! ```no_run
//! use std::collections::HashMap;
//! use llmux::{Client, CompletionOptions, Message, ProviderConfig};
//!
//! # async fn run() -> Result<(), llmux::Error> {
//! let client = Client::new(HashMap::from([(
//!     "openai".to_string(),
//!     ProviderConfig::with_api_key("sk-..."),
//! )]));
//!
//! let response = client
//!     .complete(
//!         "openai:gpt-4o-mini",
//!         vec![Message::user("Hello!")],
//!         CompletionOptions::default(),
//!     )
//!     .await?;
//!
//! println!("{}", response.content());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod provider;
pub mod providers;
pub mod registry;
pub mod types;

pub use client::Client;
pub use config::{Config, ConfigError, ProviderConfig};
pub use error::{Error, ProviderError};
pub use provider::ChatProvider;
pub use registry::Registry;
pub use types::{Choice, CompletionOptions, CompletionResponse, Message, Role, Usage};
