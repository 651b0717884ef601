//! Snackbar: single-slot transient message channel
//!
//! The newest `show` replaces whatever is displayed and restarts the
//! dismiss timer. There is no queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;

/// What the UI should render
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnackbarState {
    pub message: String,
    pub visible: bool,
}

struct SnackbarInner {
    tx: watch::Sender<SnackbarState>,
    /// Bumped by every show/dismiss; a timer only hides its own message
    generation: AtomicU64,
    default_duration: Duration,
    /// Runtime the snackbar was created on, for shows from plain threads
    runtime: Option<Handle>,
}

#[derive(Clone)]
pub struct Snackbar {
    inner: Arc<SnackbarInner>,
}

impl std::fmt::Debug for Snackbar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snackbar")
            .field("state", &*self.inner.tx.borrow())
            .finish()
    }
}

impl Snackbar {
    pub fn new(default_duration: Duration) -> Self {
        let (tx, _) = watch::channel(SnackbarState::default());
        Self {
            inner: Arc::new(SnackbarInner {
                tx,
                generation: AtomicU64::new(0),
                default_duration,
                runtime: Handle::try_current().ok(),
            }),
        }
    }

    /// Show with the default duration
    pub fn show(&self, message: impl Into<String>) {
        self.show_for(message, self.inner.default_duration);
    }

    /// Show `message` and hide it after `duration`
    ///
    /// Without any runtime to run the timer the message stays until the
    /// next show or dismiss.
    pub fn show_for(&self, message: impl Into<String>, duration: Duration) {
        let message = message.into();
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(%message, ?duration, "Snackbar shown");
        self.inner.tx.send_replace(SnackbarState {
            message,
            visible: true,
        });

        let Some(runtime) = Handle::try_current()
            .ok()
            .or_else(|| self.inner.runtime.clone())
        else {
            tracing::warn!("No async runtime, snackbar will not auto-dismiss");
            return;
        };
        let inner = Arc::clone(&self.inner);
        runtime.spawn(async move {
            tokio::time::sleep(duration).await;
            if inner.generation.load(Ordering::SeqCst) == generation {
                inner.tx.send_modify(|state| state.visible = false);
            }
        });
    }

    /// Hide immediately (user action)
    pub fn dismiss(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.tx.send_if_modified(|state| {
            let was_visible = state.visible;
            state.visible = false;
            was_visible
        });
    }

    pub fn current(&self) -> SnackbarState {
        self.inner.tx.borrow().clone()
    }

    pub fn is_visible(&self) -> bool {
        self.inner.tx.borrow().visible
    }

    pub fn subscribe(&self) -> watch::Receiver<SnackbarState> {
        self.inner.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_auto_dismiss() {
        let snackbar = Snackbar::new(Duration::from_millis(3000));
        snackbar.show_for("X", Duration::from_millis(100));
        assert_eq!(
            snackbar.current(),
            SnackbarState {
                message: "X".into(),
                visible: true
            }
        );
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!snackbar.is_visible());
        // message stays for fade-out rendering
        assert_eq!(snackbar.current().message, "X");
    }

    #[tokio::test(start_paused = true)]
    async fn test_replacement_restarts_timer() {
        let snackbar = Snackbar::new(Duration::from_millis(3000));
        snackbar.show_for("X", Duration::from_millis(100));
        tokio::time::sleep(Duration::from_millis(80)).await;

        snackbar.show("Y");
        assert_eq!(snackbar.current().message, "Y");

        // X's timer fires at 100ms and must not hide Y
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(snackbar.is_visible());

        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert!(!snackbar.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss() {
        let snackbar = Snackbar::new(Duration::from_millis(3000));
        snackbar.show("X");
        snackbar.dismiss();
        assert!(!snackbar.is_visible());

        snackbar.show("Z");
        assert!(snackbar.is_visible());
    }

    #[tokio::test]
    async fn test_show_from_plain_thread() {
        let snackbar = Snackbar::new(Duration::from_millis(3000));
        let remote = snackbar.clone();
        std::thread::spawn(move || remote.show_for("Saved", Duration::from_millis(50)))
            .join()
            .unwrap();
        assert_eq!(snackbar.current().message, "Saved");
        assert!(snackbar.is_visible());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!snackbar.is_visible());
    }

    #[test]
    fn test_show_without_runtime() {
        let snackbar = Snackbar::new(Duration::from_millis(10));
        snackbar.show("Offline");
        assert!(snackbar.is_visible());
        snackbar.dismiss();
        assert!(!snackbar.is_visible());
    }
}
