//! Stop signal shared by a connection task and whoever owns it.
//!
//! A [`StopSource`] is held by the owner; every I/O wait in a task races
//! [`StopToken::stopped`].  Dropping the source counts as a stop, so a task
//! can never outlive the handle that was supposed to end it.

use tokio::sync::watch;

/// Owner side of the stop signal.
#[derive(Debug)]
pub struct StopSource {
    tx: watch::Sender<bool>,
}

/// Observer side of the stop signal. Cheap to clone.
#[derive(Debug, Clone)]
pub struct StopToken {
    rx: watch::Receiver<bool>,
}

impl StopSource {
    /// Creates a fresh, un-triggered signal and its first token.
    pub fn new() -> (Self, StopToken) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, StopToken { rx })
    }

    /// Another observer of this signal.
    pub fn token(&self) -> StopToken {
        StopToken {
            rx: self.tx.subscribe(),
        }
    }

    /// Triggers the signal. Calling it again has no further effect.
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }
}

impl StopToken {
    /// Resolves once the signal is triggered or its source is dropped.
    pub async fn stopped(&self) {
        let mut rx = self.rx.clone();
        // Err means the source is gone, which is a stop as well.
        let _ = rx.wait_for(|stopped| *stopped).await;
    }

    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_stopped_resolves_after_stop() {
        let (source, token) = StopSource::new();
        assert!(!token.is_stopped());

        let waiter = tokio::spawn(async move { token.stopped().await });
        source.stop();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter did not wake")
            .unwrap();
        assert!(source.is_stopped());
    }

    #[tokio::test]
    async fn test_stopped_resolves_immediately_when_already_stopped() {
        let (source, token) = StopSource::new();
        source.stop();
        source.stop();
        tokio::time::timeout(Duration::from_millis(100), token.stopped())
            .await
            .expect("stop was not observed");
        assert!(token.is_stopped());
    }

    #[tokio::test]
    async fn test_dropping_source_counts_as_stop() {
        let (source, token) = StopSource::new();
        let late = source.token();
        drop(source);

        tokio::time::timeout(Duration::from_millis(100), late.stopped())
            .await
            .expect("drop was not observed");
        assert!(token.is_stopped());
    }

    #[tokio::test]
    async fn test_pending_while_not_stopped() {
        let (_source, token) = StopSource::new();
        let result = tokio::time::timeout(Duration::from_millis(20), token.stopped()).await;
        assert!(result.is_err());
    }
}
