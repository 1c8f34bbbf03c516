use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PanelVisibility {
    pub library: bool,
    pub editor: bool,
}

/// A request for fresh catalog data, numbered in issue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshRequest {
    pub ticket: u64,
}

/// Visibility of the library and edit panels, plus the command channel the library worker
/// listens on for refresh requests.
///
/// Visibility changes apply immediately; pacing between them belongs to the interpreter.
pub struct PanelController {
    visibility: Mutex<PanelVisibility>,
    refresh_tx: mpsc::UnboundedSender<RefreshRequest>,
    issued: AtomicU64,
    completed: watch::Sender<u64>,
}

impl PanelController {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RefreshRequest>) {
        let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();
        let (completed, _) = watch::channel(0);
        let controller = PanelController {
            visibility: Mutex::new(PanelVisibility::default()),
            refresh_tx,
            issued: AtomicU64::new(0),
            completed,
        };
        (controller, refresh_rx)
    }

    pub fn visibility(&self) -> PanelVisibility {
        *self.visibility.lock()
    }

    pub fn set_library_visible(&self, visible: bool) {
        let mut visibility = self.visibility.lock();
        if visibility.library != visible {
            info!("[Panels] Library {}", if visible { "opened" } else { "closed" });
        }
        visibility.library = visible;
    }

    pub fn set_editor_visible(&self, visible: bool) {
        let mut visibility = self.visibility.lock();
        if visibility.editor != visible {
            info!("[Panels] Editor {}", if visible { "opened" } else { "closed" });
        }
        visibility.editor = visible;
    }

    /// Ask the library worker for fresh data. Returns the ticket to wait on.
    pub fn request_refresh(&self) -> u64 {
        let ticket = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("[Panels] Refresh #{} requested", ticket);
        if self.refresh_tx.send(RefreshRequest { ticket }).is_err() {
            // no worker: nobody will answer, so don't leave waiters hanging
            self.mark_refreshed(ticket);
        }
        ticket
    }

    /// Number of refresh requests issued so far.
    pub fn refresh_requests(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }

    /// Called by the worker once the request with `ticket` has finished, successful or not.
    pub fn mark_refreshed(&self, ticket: u64) {
        self.completed.send_if_modified(|done| {
            if ticket > *done {
                *done = ticket;
                true
            } else {
                false
            }
        });
    }

    #[cfg(test)]
    pub fn last_refreshed(&self) -> u64 {
        *self.completed.borrow()
    }

    /// Resolves once every refresh up to `ticket` has finished.
    pub async fn wait_refreshed(&self, ticket: u64) {
        let mut rx = self.completed.subscribe();
        // the sender lives as long as `self`, so this only ends by the predicate
        let _ = rx.wait_for(|done| *done >= ticket).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn visibility_changes_are_immediate() {
        let (panels, _rx) = PanelController::new();
        panels.set_library_visible(true);
        assert_eq!(
            panels.visibility(),
            PanelVisibility {
                library: true,
                editor: false
            }
        );
        panels.set_editor_visible(true);
        panels.set_library_visible(false);
        assert!(panels.visibility().editor);
        assert!(!panels.visibility().library);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_tickets_flow_through_the_channel() {
        let (panels, mut rx) = PanelController::new();
        let first = panels.request_refresh();
        let second = panels.request_refresh();
        assert_eq!((first, second), (1, 2));
        assert_eq!(rx.recv().await, Some(RefreshRequest { ticket: 1 }));
        assert_eq!(panels.refresh_requests(), 2);

        panels.mark_refreshed(2);
        tokio::time::timeout(Duration::from_millis(10), panels.wait_refreshed(1))
            .await
            .expect("already refreshed");
        panels.mark_refreshed(1);
        assert_eq!(panels.last_refreshed(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn waiting_ends_when_no_worker_listens() {
        let (panels, rx) = PanelController::new();
        drop(rx);
        let ticket = panels.request_refresh();
        tokio::time::timeout(Duration::from_millis(10), panels.wait_refreshed(ticket))
            .await
            .expect("completed without a worker");
    }
}
