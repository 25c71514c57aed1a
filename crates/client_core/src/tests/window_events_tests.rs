use super::*;
use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};
use anyhow::anyhow;
use tokio::sync::mpsc;

struct CountingPlatform {
    desktop: bool,
    hides: AtomicUsize,
    fail_hide: bool,
    hidden_tx: Option<mpsc::UnboundedSender<usize>>,
}

impl CountingPlatform {
    fn new() -> Self {
        Self {
            desktop: true,
            hides: AtomicUsize::new(0),
            fail_hide: false,
            hidden_tx: None,
        }
    }

    fn notifying() -> (Self, mpsc::UnboundedReceiver<usize>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut platform = Self::new();
        platform.hidden_tx = Some(tx);
        (platform, rx)
    }

    fn hides(&self) -> usize {
        self.hides.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WindowPlatform for CountingPlatform {
    fn is_desktop_shell(&self) -> bool {
        self.desktop
    }

    async fn hide_window(&self) -> Result<()> {
        let count = self.hides.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(tx) = &self.hidden_tx {
            let _ = tx.send(count);
        }
        if self.fail_hide {
            return Err(anyhow!("window already gone"));
        }
        Ok(())
    }

    async fn create_window(&self, _options: ChatWindowOptions) -> Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn blur_hides_only_while_unpinned() {
    let store = AppStore::new(false);
    let platform = CountingPlatform::new();

    assert!(handle_blur(&store, &platform).await);
    assert_eq!(platform.hides(), 1);

    store.set_pinned(true);
    assert!(!handle_blur(&store, &platform).await);
    assert_eq!(platform.hides(), 1);

    store.set_pinned(false);
    assert!(handle_blur(&store, &platform).await);
    assert_eq!(platform.hides(), 2);
}

#[tokio::test]
async fn hide_failure_is_not_propagated() {
    let store = AppStore::default();
    let mut platform = CountingPlatform::new();
    platform.fail_hide = true;

    assert!(handle_blur(&store, &platform).await);
    assert_eq!(platform.hides(), 1);
}

#[tokio::test]
async fn mounted_watcher_reads_pinned_flag_at_event_time() {
    let store = AppStore::new(true);
    let (platform, mut hidden) = CountingPlatform::notifying();
    let platform = Arc::new(platform);
    let (tx, rx) = broadcast::channel(8);
    let watcher = WindowWatcher::mount(rx, store.clone(), platform.clone());

    tx.send(WindowEvent::Blurred).expect("first blur");
    tx.send(WindowEvent::Focused).expect("focus");
    // Events are handled in order, so the flag flip below is only seen by
    // the second blur once the first one has been processed.
    tokio::time::sleep(Duration::from_millis(50)).await;
    store.set_pinned(false);
    tx.send(WindowEvent::Blurred).expect("second blur");

    let count = tokio::time::timeout(Duration::from_secs(2), hidden.recv())
        .await
        .expect("hide in time")
        .expect("hide notification");
    assert_eq!(count, 1);
    assert_eq!(platform.hides(), 1);
    assert!(watcher.is_mounted());
}

#[tokio::test]
async fn unmounted_watcher_ignores_blurs() {
    let store = AppStore::default();
    let platform = Arc::new(CountingPlatform::new());
    let (tx, rx) = broadcast::channel(8);

    let watcher = WindowWatcher::mount(rx, store, platform.clone());
    watcher.unmount();
    tokio::task::yield_now().await;

    let _ = tx.send(WindowEvent::Blurred);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(platform.hides(), 0);
}

#[test]
fn pinned_subscribers_see_updates() {
    let store = AppStore::default();
    let rx = store.subscribe_pinned();
    store.set_pinned(true);
    assert!(*rx.borrow());
    assert!(store.is_pinned());
}
