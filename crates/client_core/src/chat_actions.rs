//! Chat lifecycle orchestration on top of [`Commands`].
//!
//! UI state is not owned here. It is reached through a [`ChatStatePort`],
//! and every operation snapshots the current [`ChatContext`] before it
//! touches the backend. Failures never escape: they are logged, broadcast
//! as [`ChatEvent::Failed`], and either dropped or turned into the error
//! flag according to [`ChatOperation::failure_policy`].

use std::sync::{Arc, RwLock};

use futures::join;
use serde_json::Value;
use shared::{
    domain::{present, Chat, ChatSource, MessageId, MessageRecord, ServerId, SessionId},
    protocol::{ChatWindowOptions, NewChatRequest, Pagination, QueryParams, SendMessageRequest},
};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::{
    commands::Commands,
    error::{ChatOperation, CommandError, FailurePolicy},
    window_events::WindowPlatform,
};

/// Setters for the chat state owned by the UI layer.
pub trait ChatStatePort: Send + Sync {
    fn set_active_chat(&self, chat: Option<Chat>);
    fn set_chat_end(&self, ended: bool);
    fn set_error_shown(&self, shown: bool);
    fn set_timed_out_shown(&self, shown: bool);
    fn clear_chunk_data(&self);
    fn set_question(&self, question: &str);
    /// Input-box setter; UIs without one keep the default.
    fn change_input(&self, _value: &str) {}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatContext {
    pub current_service_id: Option<ServerId>,
    pub is_search_active: bool,
    pub is_deep_think_active: bool,
    pub source_data_ids: Vec<String>,
    pub websocket_session_id: Option<String>,
}

impl ChatContext {
    fn server_id(&self) -> Option<&ServerId> {
        present(self.current_service_id.as_ref())
    }

    fn query_params(&self) -> QueryParams {
        QueryParams::new(
            self.is_search_active,
            self.is_deep_think_active,
            &self.source_data_ids,
        )
    }

    /// The configured websocket session wins over the per-call id.
    fn routing_id(&self, id: Option<&str>) -> Option<String> {
        self.websocket_session_id
            .as_deref()
            .filter(|ws| !ws.is_empty())
            .or(id.filter(|id| !id.is_empty()))
            .map(str::to_string)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// The message the UI should follow for streamed output.
    CurrentMessage {
        chat_id: SessionId,
        message_id: Option<MessageId>,
    },
    Failed {
        operation: ChatOperation,
        message: String,
    },
}

/// Result of a turn that produced new chat state.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub chat: Chat,
    pub current_message_id: Option<MessageId>,
}

pub struct ChatActions {
    commands: Commands,
    state: Arc<dyn ChatStatePort>,
    context: RwLock<ChatContext>,
    events: broadcast::Sender<ChatEvent>,
}

impl ChatActions {
    pub fn new(commands: Commands, state: Arc<dyn ChatStatePort>, context: ChatContext) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            commands,
            state,
            context: RwLock::new(context),
            events,
        }
    }

    pub fn commands(&self) -> &Commands {
        &self.commands
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ChatEvent> {
        self.events.subscribe()
    }

    pub fn context(&self) -> ChatContext {
        match self.context.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_context(&self, context: ChatContext) {
        match self.context.write() {
            Ok(mut guard) => *guard = context,
            Err(poisoned) => *poisoned.into_inner() = context,
        }
    }

    /// Releases the backend session of `active_chat`. Best effort.
    pub async fn chat_close(&self, active_chat: Option<&Chat>) {
        let ctx = self.context();
        let (Some(chat), Some(server_id)) = (active(active_chat), ctx.server_id()) else {
            return;
        };
        match self.commands.close_session_chat(server_id, &chat.id).await {
            Ok(raw) => match raw.value() {
                Ok(reply) => debug!(session_id = %chat.id, ?reply, "chat session closed"),
                Err(err) => self.fail(ChatOperation::Close, &err),
            },
            Err(err) => self.fail(ChatOperation::Close, &err),
        }
    }

    /// Marks the turn finished right away, then asks the backend to cancel.
    pub async fn cancel_chat(&self, active_chat: Option<&Chat>) {
        self.state.set_chat_end(true);
        let ctx = self.context();
        let (Some(chat), Some(server_id)) = (active(active_chat), ctx.server_id()) else {
            return;
        };
        match self.commands.cancel_session_chat(server_id, &chat.id).await {
            Ok(raw) => match raw.value() {
                Ok(reply) => debug!(session_id = %chat.id, ?reply, "chat session cancelled"),
                Err(err) => self.fail(ChatOperation::Cancel, &err),
            },
            Err(err) => self.fail(ChatOperation::Cancel, &err),
        }
    }

    /// Replaces the chat's messages with the first history page. Returns the
    /// updated chat only on success.
    pub async fn chat_history(&self, chat: &Chat) -> Option<Chat> {
        let ctx = self.context();
        let server_id = ctx.server_id()?;
        if chat.id.is_missing() {
            return None;
        }
        let hits = self
            .commands
            .session_chat_history(server_id, &chat.id, Pagination::default())
            .await
            .and_then(|raw| raw.hits());
        match hits {
            Ok(hits) => {
                let updated = chat.clone().with_messages(hits);
                debug!(
                    session_id = %updated.id,
                    messages = updated.messages.len(),
                    "chat history refreshed"
                );
                self.state.set_active_chat(Some(updated.clone()));
                Some(updated)
            }
            Err(err) => {
                self.fail(ChatOperation::History, &err);
                None
            }
        }
    }

    pub async fn create_new_chat(
        &self,
        value: &str,
        active_chat: Option<&Chat>,
        id: Option<&str>,
    ) -> Option<TurnOutcome> {
        self.state.set_timed_out_shown(false);
        self.state.set_error_shown(false);
        self.state.clear_chunk_data();
        self.state.set_question(value);

        // The previous session is released alongside the creation.
        let ((), outcome) = join!(self.chat_close(active_chat), self.start_chat(value, id));
        outcome
    }

    async fn start_chat(&self, value: &str, id: Option<&str>) -> Option<TurnOutcome> {
        let ctx = self.context();
        let server_id = ctx.server_id()?;
        let Some(websocket_id) = ctx.routing_id(id) else {
            self.missing_routing_id(ChatOperation::CreateChat, &ctx, id);
            return None;
        };
        debug!(
            sources = ?ctx.source_data_ids,
            %websocket_id,
            "creating chat"
        );

        let request = NewChatRequest {
            server_id: server_id.clone(),
            websocket_id: Some(websocket_id),
            message: value.to_string(),
            query_params: Some(ctx.query_params()),
        };
        let reply = match self.commands.new_chat(&request).await {
            Ok(reply) => reply,
            Err(err) => {
                self.fail(ChatOperation::CreateChat, &err);
                return None;
            }
        };

        let current_message_id = reply.payload_id();
        let mut chat = Chat::from(reply);
        chat.source = Some(ChatSource {
            message: value.to_string(),
        });
        let seed = chat.to_record();
        let chat = chat.with_messages(vec![seed]);
        info!(session_id = %chat.id, "chat created");

        Some(self.finish_turn(chat, current_message_id))
    }

    /// Sends `content` into `chat` and appends whatever records come back.
    pub async fn send_message(
        &self,
        content: &str,
        chat: &Chat,
        id: Option<&str>,
    ) -> Option<TurnOutcome> {
        let ctx = self.context();
        let server_id = ctx.server_id()?;
        if chat.id.is_missing() || content.is_empty() {
            return None;
        }

        self.state.clear_chunk_data();
        let Some(websocket_id) = ctx.routing_id(id) else {
            self.missing_routing_id(ChatOperation::SendMessage, &ctx, id);
            return None;
        };

        let request = SendMessageRequest {
            server_id: server_id.clone(),
            websocket_id: Some(websocket_id),
            session_id: chat.id.clone(),
            message: content.to_string(),
            query_params: Some(ctx.query_params()),
        };
        let records = self
            .commands
            .send_message(&request)
            .await
            .and_then(|raw| raw.records());
        let records = match records {
            Ok(records) => records,
            Err(err) => {
                self.fail(ChatOperation::SendMessage, &err);
                return None;
            }
        };
        debug!(session_id = %chat.id, received = records.len(), "message sent");

        let current_message_id = records.first().and_then(|record| record.id.clone());
        let mut updated = chat.clone();
        updated.messages.extend(records);

        Some(self.finish_turn(updated, current_message_id))
    }

    /// Refreshes history, then sends. The send only happens when the history
    /// refresh succeeded.
    pub async fn handle_send_message(
        &self,
        content: &str,
        active_chat: Option<&Chat>,
        id: Option<&str>,
    ) -> Option<TurnOutcome> {
        let chat = active(active_chat)?;
        if content.is_empty() {
            return None;
        }
        self.state.set_question(content);
        self.state.set_timed_out_shown(false);
        self.state.set_error_shown(false);

        let refreshed = self.chat_history(chat).await?;
        self.send_message(content, &refreshed, id).await
    }

    pub async fn open_session_chat(&self, chat: &Chat) -> Option<Value> {
        let ctx = self.context();
        let server_id = ctx.server_id()?;
        if chat.id.is_missing() {
            return None;
        }
        let reply = self
            .commands
            .open_session_chat(server_id, &chat.id)
            .await
            .and_then(|raw| raw.value());
        match reply {
            Ok(reply) => {
                debug!(session_id = %chat.id, ?reply, "chat session opened");
                Some(reply)
            }
            Err(err) => {
                self.fail(ChatOperation::OpenSession, &err);
                None
            }
        }
    }

    /// First page of the server-wide chat history.
    pub async fn get_chat_history(&self) -> Vec<MessageRecord> {
        let ctx = self.context();
        let Some(server_id) = ctx.server_id() else {
            return Vec::new();
        };
        let hits = self
            .commands
            .chat_history(server_id, Pagination::default())
            .await
            .and_then(|raw| raw.hits());
        match hits {
            Ok(hits) => {
                debug!(count = hits.len(), "chat history listed");
                hits
            }
            Err(err) => {
                self.fail(ChatOperation::ListHistory, &err);
                Vec::new()
            }
        }
    }

    /// Opens the standalone chat window when running inside the desktop shell.
    pub async fn create_chat_window(&self, platform: &dyn WindowPlatform) {
        if !platform.is_desktop_shell() {
            return;
        }
        if let Err(err) = platform
            .create_window(ChatWindowOptions::chat_window())
            .await
        {
            self.report(ChatOperation::CreateWindow, format!("{err:#}"));
        }
    }

    fn finish_turn(&self, chat: Chat, current_message_id: Option<MessageId>) -> TurnOutcome {
        let _ = self.events.send(ChatEvent::CurrentMessage {
            chat_id: chat.id.clone(),
            message_id: current_message_id.clone(),
        });
        self.state.change_input("");
        self.state.set_active_chat(Some(chat.clone()));
        self.state.set_chat_end(false);
        TurnOutcome {
            chat,
            current_message_id,
        }
    }

    fn missing_routing_id(&self, operation: ChatOperation, ctx: &ChatContext, id: Option<&str>) {
        self.state.set_error_shown(true);
        error!(
            operation = operation.label(),
            websocket_session_id = ?ctx.websocket_session_id,
            ?id,
            "no websocket session to route the chat through"
        );
    }

    fn fail(&self, operation: ChatOperation, err: &CommandError) {
        self.report(operation, err.to_string());
    }

    fn report(&self, operation: ChatOperation, message: String) {
        match operation.failure_policy() {
            FailurePolicy::Surface => {
                error!(operation = operation.label(), error = %message, "chat action failed");
                self.state.set_error_shown(true);
            }
            FailurePolicy::Swallow => {
                warn!(operation = operation.label(), error = %message, "chat action failed");
            }
        }
        let _ = self.events.send(ChatEvent::Failed { operation, message });
    }
}

fn active(chat: Option<&Chat>) -> Option<&Chat> {
    chat.filter(|chat| !chat.id.is_missing())
}

#[cfg(test)]
#[path = "tests/chat_actions_tests.rs"]
mod tests;
