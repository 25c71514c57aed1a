//! One wrapper per backend command.
//!
//! Arguments are forwarded as-is; nothing here validates, retries or caches.

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use shared::{
    domain::{
        ClientId, Connector, DataSource, GetResponse, Server, ServerId, ServerTokenResponse,
        SessionId,
    },
    error::InvokeError,
    protocol::{
        ChatHistoryArgs, Command, ConnectArgs, DisconnectArgs, EndpointArgs, IdArgs, NewChatArgs,
        NewChatRequest, Pagination, SendMessageArgs, SendMessageRequest, SessionArgs,
        SessionHistoryArgs, SsoCallbackArgs,
    },
};
use tracing::debug;

use crate::{
    error::CommandError,
    response::{decode, RawJson},
    Invoker,
};

#[derive(Clone)]
pub struct Commands {
    invoker: Arc<dyn Invoker>,
}

impl Commands {
    pub fn new(invoker: Arc<dyn Invoker>) -> Self {
        Self { invoker }
    }

    async fn call(&self, command: Command, args: Value) -> Result<Value, CommandError> {
        debug!(command = command.name(), "invoking backend command");
        Ok(self.invoker.invoke(command, args).await?)
    }

    async fn call_with<A: Serialize>(
        &self,
        command: Command,
        args: A,
    ) -> Result<Value, CommandError> {
        let args = serde_json::to_value(args).map_err(|err| {
            InvokeError::internal(format!("failed to encode {command} args: {err}"))
        })?;
        self.call(command, args).await
    }

    async fn typed<T: DeserializeOwned, A: Serialize>(
        &self,
        command: Command,
        args: A,
    ) -> Result<T, CommandError> {
        decode(command, self.call_with(command, args).await?)
    }

    async fn raw<A: Serialize>(&self, command: Command, args: A) -> Result<RawJson, CommandError> {
        Ok(RawJson::from_reply(self.call_with(command, args).await?))
    }

    async fn unit<A: Serialize>(&self, command: Command, args: A) -> Result<(), CommandError> {
        self.call_with(command, args).await.map(|_| ())
    }

    pub async fn get_server_token(
        &self,
        id: &ServerId,
    ) -> Result<ServerTokenResponse, CommandError> {
        self.typed(Command::GetServerToken, IdArgs { id: id.as_str() }).await
    }

    pub async fn list_coco_servers(&self) -> Result<Vec<Server>, CommandError> {
        decode(
            Command::ListCocoServers,
            self.call(Command::ListCocoServers, Value::Object(Map::new()))
                .await?,
        )
    }

    pub async fn add_coco_server(&self, endpoint: &str) -> Result<Server, CommandError> {
        self.typed(Command::AddCocoServer, EndpointArgs { endpoint }).await
    }

    pub async fn enable_server(&self, id: &ServerId) -> Result<(), CommandError> {
        self.unit(Command::EnableServer, IdArgs { id: id.as_str() }).await
    }

    pub async fn disable_server(&self, id: &ServerId) -> Result<(), CommandError> {
        self.unit(Command::DisableServer, IdArgs { id: id.as_str() }).await
    }

    pub async fn remove_coco_server(&self, id: &ServerId) -> Result<(), CommandError> {
        self.unit(Command::RemoveCocoServer, IdArgs { id: id.as_str() }).await
    }

    pub async fn logout_coco_server(&self, id: &ServerId) -> Result<(), CommandError> {
        self.unit(Command::LogoutCocoServer, IdArgs { id: id.as_str() }).await
    }

    pub async fn refresh_coco_server_info(&self, id: &ServerId) -> Result<Server, CommandError> {
        self.typed(Command::RefreshCocoServerInfo, IdArgs { id: id.as_str() })
            .await
    }

    pub async fn handle_sso_callback(
        &self,
        server_id: &ServerId,
        request_id: &str,
        code: &str,
    ) -> Result<(), CommandError> {
        self.unit(
            Command::HandleSsoCallback,
            SsoCallbackArgs {
                server_id: server_id.as_str(),
                request_id,
                code,
            },
        )
        .await
    }

    pub async fn get_connectors_by_server(
        &self,
        id: &ServerId,
    ) -> Result<Vec<Connector>, CommandError> {
        self.typed(Command::GetConnectorsByServer, IdArgs { id: id.as_str() })
            .await
    }

    pub async fn get_datasources_by_server(
        &self,
        id: &ServerId,
    ) -> Result<Vec<DataSource>, CommandError> {
        self.typed(Command::GetDatasourcesByServer, IdArgs { id: id.as_str() })
            .await
    }

    pub async fn connect_to_server(
        &self,
        id: &ServerId,
        client_id: &ClientId,
    ) -> Result<(), CommandError> {
        self.unit(
            Command::ConnectToServer,
            ConnectArgs {
                id: id.as_str(),
                client_id: client_id.as_str(),
            },
        )
        .await
    }

    pub async fn disconnect(&self, client_id: &ClientId) -> Result<(), CommandError> {
        self.unit(
            Command::Disconnect,
            DisconnectArgs {
                client_id: client_id.as_str(),
            },
        )
        .await
    }

    pub async fn chat_history(
        &self,
        server_id: &ServerId,
        page: Pagination,
    ) -> Result<RawJson, CommandError> {
        self.raw(
            Command::ChatHistory,
            ChatHistoryArgs {
                server_id: server_id.as_str(),
                from: page.from,
                size: page.size,
            },
        )
        .await
    }

    pub async fn session_chat_history(
        &self,
        server_id: &ServerId,
        session_id: &SessionId,
        page: Pagination,
    ) -> Result<RawJson, CommandError> {
        self.raw(
            Command::SessionChatHistory,
            SessionHistoryArgs {
                server_id: server_id.as_str(),
                session_id: session_id.as_str(),
                from: page.from,
                size: page.size,
            },
        )
        .await
    }

    pub async fn close_session_chat(
        &self,
        server_id: &ServerId,
        session_id: &SessionId,
    ) -> Result<RawJson, CommandError> {
        self.raw(Command::CloseSessionChat, session_args(server_id, session_id))
            .await
    }

    pub async fn open_session_chat(
        &self,
        server_id: &ServerId,
        session_id: &SessionId,
    ) -> Result<RawJson, CommandError> {
        self.raw(Command::OpenSessionChat, session_args(server_id, session_id))
            .await
    }

    pub async fn cancel_session_chat(
        &self,
        server_id: &ServerId,
        session_id: &SessionId,
    ) -> Result<RawJson, CommandError> {
        self.raw(Command::CancelSessionChat, session_args(server_id, session_id))
            .await
    }

    pub async fn new_chat(&self, request: &NewChatRequest) -> Result<GetResponse, CommandError> {
        self.typed(
            Command::NewChat,
            NewChatArgs {
                server_id: request.server_id.as_str(),
                websocket_id: request.websocket_id.as_deref(),
                message: &request.message,
                query_params: request.query_params.as_ref(),
            },
        )
        .await
    }

    pub async fn send_message(
        &self,
        request: &SendMessageRequest,
    ) -> Result<RawJson, CommandError> {
        self.raw(
            Command::SendMessage,
            SendMessageArgs {
                server_id: request.server_id.as_str(),
                websocket_id: request.websocket_id.as_deref(),
                session_id: request.session_id.as_str(),
                message: &request.message,
                query_params: request.query_params.as_ref(),
            },
        )
        .await
    }
}

fn session_args<'a>(server_id: &'a ServerId, session_id: &'a SessionId) -> SessionArgs<'a> {
    SessionArgs {
        server_id: server_id.as_str(),
        session_id: session_id.as_str(),
    }
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
