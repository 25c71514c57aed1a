use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{MessageRecord, ServerId, SessionId};

pub const DEFAULT_PAGE_FROM: u32 = 0;
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Named backend operations reachable over the invoke bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    GetServerToken,
    ListCocoServers,
    AddCocoServer,
    EnableServer,
    DisableServer,
    RemoveCocoServer,
    LogoutCocoServer,
    RefreshCocoServerInfo,
    HandleSsoCallback,
    GetConnectorsByServer,
    GetDatasourcesByServer,
    ConnectToServer,
    Disconnect,
    ChatHistory,
    SessionChatHistory,
    CloseSessionChat,
    OpenSessionChat,
    CancelSessionChat,
    NewChat,
    SendMessage,
}

impl Command {
    pub const ALL: [Command; 20] = [
        Command::GetServerToken,
        Command::ListCocoServers,
        Command::AddCocoServer,
        Command::EnableServer,
        Command::DisableServer,
        Command::RemoveCocoServer,
        Command::LogoutCocoServer,
        Command::RefreshCocoServerInfo,
        Command::HandleSsoCallback,
        Command::GetConnectorsByServer,
        Command::GetDatasourcesByServer,
        Command::ConnectToServer,
        Command::Disconnect,
        Command::ChatHistory,
        Command::SessionChatHistory,
        Command::CloseSessionChat,
        Command::OpenSessionChat,
        Command::CancelSessionChat,
        Command::NewChat,
        Command::SendMessage,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Command::GetServerToken => "get_server_token",
            Command::ListCocoServers => "list_coco_servers",
            Command::AddCocoServer => "add_coco_server",
            Command::EnableServer => "enable_server",
            Command::DisableServer => "disable_server",
            Command::RemoveCocoServer => "remove_coco_server",
            Command::LogoutCocoServer => "logout_coco_server",
            Command::RefreshCocoServerInfo => "refresh_coco_server_info",
            Command::HandleSsoCallback => "handle_sso_callback",
            Command::GetConnectorsByServer => "get_connectors_by_server",
            Command::GetDatasourcesByServer => "get_datasources_by_server",
            Command::ConnectToServer => "connect_to_server",
            Command::Disconnect => "disconnect",
            Command::ChatHistory => "chat_history",
            Command::SessionChatHistory => "session_chat_history",
            Command::CloseSessionChat => "close_session_chat",
            Command::OpenSessionChat => "open_session_chat",
            Command::CancelSessionChat => "cancel_session_chat",
            Command::NewChat => "new_chat",
            Command::SendMessage => "send_message",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.name() == name)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IdArgs<'a> {
    pub id: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct EndpointArgs<'a> {
    pub endpoint: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SsoCallbackArgs<'a> {
    pub server_id: &'a str,
    pub request_id: &'a str,
    pub code: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectArgs<'a> {
    pub id: &'a str,
    pub client_id: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectArgs<'a> {
    pub client_id: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub from: u32,
    pub size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            from: DEFAULT_PAGE_FROM,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistoryArgs<'a> {
    pub server_id: &'a str,
    pub from: u32,
    pub size: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionHistoryArgs<'a> {
    pub server_id: &'a str,
    pub session_id: &'a str,
    pub from: u32,
    pub size: u32,
}

/// Arguments shared by open, close and cancel.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionArgs<'a> {
    pub server_id: &'a str,
    pub session_id: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryParams {
    pub search: bool,
    pub deep_thinking: bool,
    pub datasource: String,
}

impl QueryParams {
    pub fn new(search: bool, deep_thinking: bool, source_ids: &[String]) -> Self {
        Self {
            search,
            deep_thinking,
            datasource: source_ids.join(","),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChatArgs<'a> {
    pub server_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub websocket_id: Option<&'a str>,
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_params: Option<&'a QueryParams>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageArgs<'a> {
    pub server_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub websocket_id: Option<&'a str>,
    pub session_id: &'a str,
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_params: Option<&'a QueryParams>,
}

/// Request parameters for a `new_chat` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChatRequest {
    pub server_id: ServerId,
    pub websocket_id: Option<String>,
    pub message: String,
    pub query_params: Option<QueryParams>,
}

/// Request parameters for a `send_message` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessageRequest {
    pub server_id: ServerId,
    pub websocket_id: Option<String>,
    pub session_id: SessionId,
    pub message: String,
    pub query_params: Option<QueryParams>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchHits {
    #[serde(default)]
    pub hits: Option<Vec<MessageRecord>>,
}

/// Search-shaped reply used by the history endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub hits: Option<SearchHits>,
}

impl SearchResponse {
    pub fn into_hits(self) -> Vec<MessageRecord> {
        self.hits.and_then(|hits| hits.hits).unwrap_or_default()
    }
}

/// Window request for the standalone chat window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatWindowOptions {
    pub label: String,
    pub title: String,
    pub drag_drop_enabled: bool,
    pub center: bool,
    pub width: u32,
    pub height: u32,
    pub min_width: u32,
    pub min_height: u32,
    pub always_on_top: bool,
    pub skip_taskbar: bool,
    pub decorations: bool,
    pub closable: bool,
    pub url: String,
}

impl ChatWindowOptions {
    pub fn chat_window() -> Self {
        Self {
            label: "chat".into(),
            title: "Coco Chat".into(),
            drag_drop_enabled: true,
            center: true,
            width: 1000,
            height: 800,
            min_width: 1000,
            min_height: 800,
            always_on_top: false,
            skip_taskbar: false,
            decorations: true,
            closable: true,
            url: "/ui/chat".into(),
        }
    }
}
