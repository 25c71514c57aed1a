use std::{fs, path::Path};

use serde::Deserialize;
use shared::domain::ServerId;
use tracing::warn;

use crate::chat_actions::ChatContext;

pub const SETTINGS_FILE: &str = "coco.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub endpoint: String,
    pub server_id: Option<String>,
    pub websocket_session_id: Option<String>,
    pub search: bool,
    pub deep_thinking: bool,
    pub datasources: Vec<String>,
    pub pinned: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:2900".into(),
            server_id: None,
            websocket_session_id: None,
            search: false,
            deep_thinking: false,
            datasources: Vec::new(),
            pinned: false,
        }
    }
}

impl ClientSettings {
    pub fn chat_context(&self) -> ChatContext {
        ChatContext {
            current_service_id: self.server_id.clone().map(ServerId::from),
            is_search_active: self.search,
            is_deep_think_active: self.deep_thinking,
            source_data_ids: self.datasources.clone(),
            websocket_session_id: self.websocket_session_id.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    endpoint: Option<String>,
    server_id: Option<String>,
    websocket_session_id: Option<String>,
    search: Option<bool>,
    deep_thinking: Option<bool>,
    datasources: Option<Vec<String>>,
    pinned: Option<bool>,
}

/// Defaults, then `coco.toml` in the working directory, then environment.
pub fn load_settings() -> ClientSettings {
    let mut settings = ClientSettings::default();
    apply_file(&mut settings, Path::new(SETTINGS_FILE));
    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_file(settings: &mut ClientSettings, path: &Path) {
    let Ok(raw) = fs::read_to_string(path) else {
        return;
    };
    match toml::from_str::<FileSettings>(&raw) {
        Ok(file_cfg) => apply_file_settings(settings, file_cfg),
        Err(err) => warn!(
            path = %path.display(),
            error = %err,
            "ignoring unreadable settings file"
        ),
    }
}

fn apply_file_settings(settings: &mut ClientSettings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.endpoint {
        settings.endpoint = v;
    }
    if let Some(v) = file_cfg.server_id {
        settings.server_id = Some(v);
    }
    if let Some(v) = file_cfg.websocket_session_id {
        settings.websocket_session_id = Some(v);
    }
    if let Some(v) = file_cfg.search {
        settings.search = v;
    }
    if let Some(v) = file_cfg.deep_thinking {
        settings.deep_thinking = v;
    }
    if let Some(v) = file_cfg.datasources {
        settings.datasources = v;
    }
    if let Some(v) = file_cfg.pinned {
        settings.pinned = v;
    }
}

fn apply_env(settings: &mut ClientSettings, var: impl Fn(&str) -> Option<String>) {
    let lookup = |short: &str, long: &str| var(long).or_else(|| var(short));

    if let Some(v) = lookup("COCO_ENDPOINT", "APP__ENDPOINT") {
        settings.endpoint = v;
    }
    if let Some(v) = lookup("COCO_SERVER_ID", "APP__SERVER_ID") {
        settings.server_id = Some(v);
    }
    if let Some(v) = lookup("COCO_WEBSOCKET_ID", "APP__WEBSOCKET_SESSION_ID") {
        settings.websocket_session_id = Some(v);
    }
    if let Some(v) = lookup("COCO_SEARCH", "APP__SEARCH").and_then(|v| parse_flag(&v)) {
        settings.search = v;
    }
    if let Some(v) =
        lookup("COCO_DEEP_THINKING", "APP__DEEP_THINKING").and_then(|v| parse_flag(&v))
    {
        settings.deep_thinking = v;
    }
    if let Some(v) = lookup("COCO_DATASOURCES", "APP__DATASOURCES") {
        settings.datasources = split_list(&v);
    }
    if let Some(v) = lookup("COCO_PINNED", "APP__PINNED").and_then(|v| parse_flag(&v)) {
        settings.pinned = v;
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
