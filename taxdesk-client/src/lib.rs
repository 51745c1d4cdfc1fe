//! # taxdesk-client
//!
//! HTTP transport for the taxdesk chat backend.
//!
//! ## Example
//!
//! ```rust,no_run
//! use taxdesk_client::{ChatClient, ClientConfig};
//! use taxdesk_core::ResponseMode;
//! use taxdesk_streaming::ConversationAccumulator;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ChatClient::new(ClientConfig::from_env()?)?;
//! let acc = ConversationAccumulator::new();
//! acc.submit("2023年净利润是多少");
//!
//! let handle = client.stream_chat("2023年净利润是多少", Some(1), ResponseMode::Detailed, acc.handlers());
//! let outcome = handle.join().await;
//! println!("{outcome:?}: {}", acc.snapshot().to_markdown());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod chat;
pub mod config;
pub mod error;
pub mod handle;

pub use chat::{ChatClient, ChatEventStream, CHAT_PATH};
pub use config::{ClientConfig, DEFAULT_BASE_URL, ENV_ACCESS_TOKEN, ENV_API_URL};
pub use error::{ClientError, ClientResult};
pub use handle::{AbortHandle, StreamHandle, StreamOutcome};
