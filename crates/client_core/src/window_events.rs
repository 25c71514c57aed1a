//! Hides the main window when it loses focus, unless it is pinned.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use shared::protocol::ChatWindowOptions;
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
};
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tracing::{debug, info, warn};

/// Window operations provided by the hosting shell.
#[async_trait]
pub trait WindowPlatform: Send + Sync {
    /// Whether the client runs inside the desktop shell rather than a plain
    /// browser.
    fn is_desktop_shell(&self) -> bool;
    async fn hide_window(&self) -> Result<()>;
    async fn create_window(&self, options: ChatWindowOptions) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    Blurred,
    Focused,
}

/// Application-wide flags shared between the UI and background listeners.
#[derive(Clone)]
pub struct AppStore {
    pinned: Arc<watch::Sender<bool>>,
}

impl AppStore {
    pub fn new(pinned: bool) -> Self {
        let (pinned, _) = watch::channel(pinned);
        Self {
            pinned: Arc::new(pinned),
        }
    }

    pub fn is_pinned(&self) -> bool {
        *self.pinned.borrow()
    }

    pub fn set_pinned(&self, pinned: bool) {
        self.pinned.send_replace(pinned);
    }

    pub fn subscribe_pinned(&self) -> watch::Receiver<bool> {
        self.pinned.subscribe()
    }
}

impl Default for AppStore {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Handles one blur. Returns whether a hide was requested.
pub async fn handle_blur(store: &AppStore, platform: &dyn WindowPlatform) -> bool {
    debug!("window blurred");
    if store.is_pinned() {
        return false;
    }
    match platform.hide_window().await {
        Ok(()) => info!("window hidden after losing focus"),
        Err(err) => warn!(error = %err, "failed to hide window"),
    }
    true
}

/// Listener that lives as long as the value does.
pub struct WindowWatcher {
    task: JoinHandle<()>,
}

impl WindowWatcher {
    pub fn mount(
        events: broadcast::Receiver<WindowEvent>,
        store: AppStore,
        platform: Arc<dyn WindowPlatform>,
    ) -> Self {
        let task = tokio::spawn(async move {
            let mut events = BroadcastStream::new(events);
            while let Some(event) = events.next().await {
                match event {
                    Ok(WindowEvent::Blurred) => {
                        handle_blur(&store, platform.as_ref()).await;
                    }
                    Ok(WindowEvent::Focused) => {}
                    Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                        warn!(skipped, "window event listener lagged");
                    }
                }
            }
            debug!("window event source closed");
        });
        Self { task }
    }

    pub fn unmount(self) {
        drop(self);
    }

    pub fn is_mounted(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for WindowWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
#[path = "tests/window_events_tests.rs"]
mod tests;
