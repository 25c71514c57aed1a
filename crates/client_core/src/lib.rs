use async_trait::async_trait;
use serde_json::Value;
use shared::{error::InvokeError, protocol::Command};

pub mod chat_actions;
pub mod commands;
pub mod config;
pub mod error;
pub mod response;
pub mod transport;
pub mod window_events;

pub use chat_actions::{ChatActions, ChatContext, ChatEvent, ChatStatePort, TurnOutcome};
pub use commands::Commands;
pub use config::{load_settings, ClientSettings};
pub use error::{ChatOperation, CommandError, FailurePolicy};
pub use response::RawJson;
pub use transport::HttpInvoker;
pub use window_events::{AppStore, WindowEvent, WindowPlatform, WindowWatcher};

/// The bridge every backend command goes through: a command name plus a
/// named-parameter bag in, a JSON value out.
#[async_trait]
pub trait Invoker: Send + Sync {
    async fn invoke(&self, command: Command, args: Value) -> Result<Value, InvokeError>;
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
