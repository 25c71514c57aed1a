use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{load_settings, ChatActions, ChatContext, ChatStatePort, Commands, HttpInvoker};
use shared::domain::{Chat, ClientId, ServerId};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Args {
    /// Backend base URL; overrides coco.toml and COCO_ENDPOINT.
    #[arg(long)]
    endpoint: Option<String>,
    #[arg(long)]
    server_id: Option<String>,
    #[arg(long)]
    websocket_id: Option<String>,
    #[arg(long)]
    search: bool,
    #[arg(long)]
    deep_thinking: bool,
    /// Datasource ids to scope the chat to.
    #[arg(long = "datasource")]
    datasources: Vec<String>,
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// List the servers known to the backend.
    Servers,
    /// Show the first page of chat history for the server.
    History,
    /// Start a new chat with a first message.
    Ask { message: String },
    /// Refresh a chat's history, then send a message into it.
    Send {
        #[arg(long)]
        session: String,
        message: String,
    },
    Close {
        #[arg(long)]
        session: String,
    },
    Cancel {
        #[arg(long)]
        session: String,
    },
    Connect {
        #[arg(long)]
        client_id: Option<String>,
    },
    Disconnect {
        #[arg(long)]
        client_id: String,
    },
}

/// Prints chat state changes instead of rendering them.
struct ConsoleState;

impl ChatStatePort for ConsoleState {
    fn set_active_chat(&self, chat: Option<Chat>) {
        let Some(chat) = chat else {
            return;
        };
        println!("chat {} ({} messages)", chat.id, chat.messages.len());
        for record in &chat.messages {
            match serde_json::to_string(record) {
                Ok(line) => println!("  {line}"),
                Err(err) => eprintln!("  <unprintable record: {err}>"),
            }
        }
    }

    fn set_chat_end(&self, ended: bool) {
        info!(ended, "chat end");
    }

    fn set_error_shown(&self, shown: bool) {
        if shown {
            eprintln!("chat action failed; see log for details");
        }
    }

    fn set_timed_out_shown(&self, _shown: bool) {}

    fn clear_chunk_data(&self) {}

    fn set_question(&self, question: &str) {
        info!(question, "question");
    }
}

fn context(args: &Args, mut ctx: ChatContext) -> ChatContext {
    if let Some(id) = &args.server_id {
        ctx.current_service_id = Some(ServerId::from(id.as_str()));
    }
    if let Some(id) = &args.websocket_id {
        ctx.websocket_session_id = Some(id.clone());
    }
    ctx.is_search_active |= args.search;
    ctx.is_deep_think_active |= args.deep_thinking;
    if !args.datasources.is_empty() {
        ctx.source_data_ids = args.datasources.clone();
    }
    ctx
}

fn require_server(ctx: &ChatContext) -> Result<ServerId> {
    match &ctx.current_service_id {
        Some(id) if !id.is_missing() => Ok(id.clone()),
        _ => bail!("no server selected; pass --server-id or set COCO_SERVER_ID"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();
    let settings = load_settings();
    let endpoint = args.endpoint.clone().unwrap_or_else(|| settings.endpoint.clone());

    let invoker = HttpInvoker::new(&endpoint)
        .with_context(|| format!("failed to set up backend at {endpoint}"))?;
    let commands = Commands::new(Arc::new(invoker));
    let ctx = context(&args, settings.chat_context());
    let actions = ChatActions::new(commands.clone(), Arc::new(ConsoleState), ctx.clone());

    match args.command {
        Cmd::Servers => {
            for server in commands.list_coco_servers().await? {
                println!(
                    "{}\t{}\t{}\tenabled={}",
                    server.id, server.name, server.endpoint, server.enabled
                );
            }
        }
        Cmd::History => {
            require_server(&ctx)?;
            for record in actions.get_chat_history().await {
                println!("{}", serde_json::to_string(&record)?);
            }
        }
        Cmd::Ask { message } => {
            require_server(&ctx)?;
            let outcome = actions
                .create_new_chat(&message, None, None)
                .await
                .context("chat was not created")?;
            println!("session: {}", outcome.chat.id);
            if let Some(id) = outcome.current_message_id {
                println!("reply id: {id}");
            }
        }
        Cmd::Send { session, message } => {
            require_server(&ctx)?;
            let chat = Chat::new(session);
            let outcome = actions
                .handle_send_message(&message, Some(&chat), None)
                .await
                .context("message was not sent")?;
            if let Some(id) = outcome.current_message_id {
                println!("reply id: {id}");
            }
        }
        Cmd::Close { session } => {
            require_server(&ctx)?;
            actions.chat_close(Some(&Chat::new(session))).await;
        }
        Cmd::Cancel { session } => {
            require_server(&ctx)?;
            actions.cancel_chat(Some(&Chat::new(session))).await;
        }
        Cmd::Connect { client_id } => {
            let server_id = require_server(&ctx)?;
            let client_id = ClientId::from(
                client_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            );
            commands.connect_to_server(&server_id, &client_id).await?;
            println!("connected as {client_id}");
        }
        Cmd::Disconnect { client_id } => {
            commands.disconnect(&ClientId::from(client_id)).await?;
        }
    }

    Ok(())
}
