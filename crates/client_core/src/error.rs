use shared::{error::InvokeError, protocol::Command};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("backend invocation failed: {0}")]
    Invoke(#[from] InvokeError),
    #[error("unexpected reply shape from {command}: {source}")]
    Decode {
        command: Command,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to parse JSON reply: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },
}

/// What happens to a failure once it has been logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Best-effort work: the failure stops here.
    Swallow,
    /// State-producing work: the failure flips the error flag.
    Surface,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatOperation {
    Close,
    Cancel,
    History,
    CreateChat,
    SendMessage,
    OpenSession,
    ListHistory,
    CreateWindow,
}

impl ChatOperation {
    pub fn failure_policy(self) -> FailurePolicy {
        match self {
            ChatOperation::CreateChat | ChatOperation::SendMessage => FailurePolicy::Surface,
            ChatOperation::Close
            | ChatOperation::Cancel
            | ChatOperation::History
            | ChatOperation::OpenSession
            | ChatOperation::ListHistory
            | ChatOperation::CreateWindow => FailurePolicy::Swallow,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ChatOperation::Close => "chat_close",
            ChatOperation::Cancel => "cancel_chat",
            ChatOperation::History => "chat_history",
            ChatOperation::CreateChat => "create_new_chat",
            ChatOperation::SendMessage => "send_message",
            ChatOperation::OpenSession => "open_session_chat",
            ChatOperation::ListHistory => "get_chat_history",
            ChatOperation::CreateWindow => "create_chat_window",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_state_producing_operations_surface() {
        let surfaced: Vec<_> = [
            ChatOperation::Close,
            ChatOperation::Cancel,
            ChatOperation::History,
            ChatOperation::CreateChat,
            ChatOperation::SendMessage,
            ChatOperation::OpenSession,
            ChatOperation::ListHistory,
            ChatOperation::CreateWindow,
        ]
        .into_iter()
        .filter(|op| op.failure_policy() == FailurePolicy::Surface)
        .collect();
        assert_eq!(
            surfaced,
            vec![ChatOperation::CreateChat, ChatOperation::SendMessage]
        );
    }
}
