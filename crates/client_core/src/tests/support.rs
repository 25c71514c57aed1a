use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};

use async_trait::async_trait;
use serde_json::Value;
use shared::{domain::Chat, error::InvokeError, protocol::Command};

use crate::{chat_actions::ChatStatePort, Invoker};

/// Invoker that records every call and answers from per-command scripts.
/// Unscripted commands answer `null`.
#[derive(Default)]
pub struct RecordingInvoker {
    calls: Mutex<Vec<(Command, Value)>>,
    replies: Mutex<HashMap<Command, VecDeque<Result<Value, InvokeError>>>>,
}

impl RecordingInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, command: Command, value: Value) -> Self {
        self.push(command, Ok(value));
        self
    }

    pub fn fail(self, command: Command, message: &str) -> Self {
        self.push(command, Err(InvokeError::transport(message)));
        self
    }

    fn push(&self, command: Command, reply: Result<Value, InvokeError>) {
        self.replies
            .lock()
            .expect("replies lock")
            .entry(command)
            .or_default()
            .push_back(reply);
    }

    pub fn calls(&self) -> Vec<(Command, Value)> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn commands(&self) -> Vec<Command> {
        self.calls().into_iter().map(|(command, _)| command).collect()
    }
}

#[async_trait]
impl Invoker for RecordingInvoker {
    async fn invoke(&self, command: Command, args: Value) -> Result<Value, InvokeError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((command, args));
        self.replies
            .lock()
            .expect("replies lock")
            .get_mut(&command)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Ok(Value::Null))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StateChange {
    ActiveChat(Option<Chat>),
    ChatEnd(bool),
    ErrorShown(bool),
    TimedOutShown(bool),
    ClearChunks,
    Question(String),
    Input(String),
}

#[derive(Default)]
pub struct RecordingState {
    changes: Mutex<Vec<StateChange>>,
}

impl RecordingState {
    pub fn changes(&self) -> Vec<StateChange> {
        self.changes.lock().expect("changes lock").clone()
    }

    pub fn last_active_chat(&self) -> Option<Chat> {
        self.changes().into_iter().rev().find_map(|change| match change {
            StateChange::ActiveChat(chat) => chat,
            _ => None,
        })
    }

    pub fn last_error_shown(&self) -> Option<bool> {
        self.changes().into_iter().rev().find_map(|change| match change {
            StateChange::ErrorShown(shown) => Some(shown),
            _ => None,
        })
    }

    pub fn last_chat_end(&self) -> Option<bool> {
        self.changes().into_iter().rev().find_map(|change| match change {
            StateChange::ChatEnd(ended) => Some(ended),
            _ => None,
        })
    }

    fn record(&self, change: StateChange) {
        self.changes.lock().expect("changes lock").push(change);
    }
}

impl ChatStatePort for RecordingState {
    fn set_active_chat(&self, chat: Option<Chat>) {
        self.record(StateChange::ActiveChat(chat));
    }

    fn set_chat_end(&self, ended: bool) {
        self.record(StateChange::ChatEnd(ended));
    }

    fn set_error_shown(&self, shown: bool) {
        self.record(StateChange::ErrorShown(shown));
    }

    fn set_timed_out_shown(&self, shown: bool) {
        self.record(StateChange::TimedOutShown(shown));
    }

    fn clear_chunk_data(&self) {
        self.record(StateChange::ClearChunks);
    }

    fn set_question(&self, question: &str) {
        self.record(StateChange::Question(question.to_string()));
    }

    fn change_input(&self, value: &str) {
        self.record(StateChange::Input(value.to_string()));
    }
}
