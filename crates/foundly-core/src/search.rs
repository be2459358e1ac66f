// SPDX-License-Identifier: AGPL-3.0
// Foundly Core - Search-as-you-type debouncing

use async_channel::{Receiver, Sender};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Settles a burst of keystrokes into a single search query.
///
/// Each `push` cancels the pending query and schedules the new one after
/// the delay. Clearing the search box is delivered immediately.
pub struct SearchDebouncer {
    delay: Duration,
    tx: Sender<String>,
    pending: Option<JoinHandle<()>>,
}

impl SearchDebouncer {
    /// Create a debouncer and the receiver settled queries arrive on.
    ///
    /// Must be used from within a Tokio runtime.
    pub fn new(delay: Duration) -> (Self, Receiver<String>) {
        let (tx, rx) = async_channel::unbounded();
        (
            Self {
                delay,
                tx,
                pending: None,
            },
            rx,
        )
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record the current contents of the search box
    pub fn push(&mut self, query: &str) {
        self.cancel();

        let query = query.trim().to_string();
        if query.is_empty() {
            if self.tx.try_send(query).is_err() {
                tracing::debug!("Search receiver dropped");
            }
            return;
        }

        let tx = self.tx.clone();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tracing::debug!("Issuing search for {:?}", query);
            let _ = tx.send(query).await;
        }));
    }

    /// Drop any query that has not been issued yet
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_burst_emits_last_query_after_delay() {
        let (mut debouncer, rx) = SearchDebouncer::new(Duration::from_millis(500));
        let start = Instant::now();

        debouncer.push("w");
        debouncer.push("wal");
        debouncer.push(" wallet ");

        assert_eq!(rx.recv().await.unwrap(), "wallet");
        assert!(start.elapsed() >= Duration::from_millis(500));
        assert!(rx.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleared_search_is_immediate() {
        let (mut debouncer, rx) = SearchDebouncer::new(Duration::from_millis(500));

        debouncer.push("keys");
        debouncer.push("   ");

        assert_eq!(rx.try_recv().unwrap(), "");
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_pauses_emit_each_query() {
        let (mut debouncer, rx) = SearchDebouncer::new(Duration::from_millis(200));

        debouncer.push("phone");
        assert_eq!(rx.recv().await.unwrap(), "phone");
        debouncer.push("phone case");
        assert_eq!(rx.recv().await.unwrap(), "phone case");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending_query() {
        let (mut debouncer, rx) = SearchDebouncer::new(Duration::from_millis(200));
        debouncer.push("bag");
        debouncer.cancel();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.is_empty());
    }
}
