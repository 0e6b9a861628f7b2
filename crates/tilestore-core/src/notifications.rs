//! ============================================================================
//! Notification Poller - the admin bell
//! ============================================================================
//! Polls the unread count on a fixed interval and publishes it through a
//! `watch` channel. A failed poll keeps the previous count. The loop ends
//! when the shutdown flag flips to true or every receiver is gone.
//! ============================================================================

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::Result;

/// Anything that can report the unread notification count
#[async_trait]
pub trait NotificationSource: Send + Sync {
    async fn unread_count(&self) -> Result<u64>;
}

pub struct NotificationPoller<S: NotificationSource + ?Sized> {
    source: Arc<S>,
    interval: Duration,
    sender: watch::Sender<u64>,
}

impl<S: NotificationSource + ?Sized + 'static> NotificationPoller<S> {
    /// Returns the poller and a receiver that starts at 0
    pub fn new(source: Arc<S>, interval: Duration) -> (Self, watch::Receiver<u64>) {
        Self::starting_at(source, interval, 0)
    }

    /// Like `new`, with a count already shown to the user; an unchanged
    /// first poll publishes nothing
    pub fn starting_at(
        source: Arc<S>,
        interval: Duration,
        initial: u64,
    ) -> (Self, watch::Receiver<u64>) {
        let (sender, receiver) = watch::channel(initial);
        (
            Self {
                source,
                interval,
                sender,
            },
            receiver,
        )
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.sender.subscribe()
    }

    /// Poll once and publish if the count changed
    pub async fn poll_once(&self) -> Result<u64> {
        let count = self.source.unread_count().await?;
        let changed = self.sender.send_if_modified(|current| {
            if *current == count {
                false
            } else {
                *current = count;
                true
            }
        });
        if changed {
            debug!("Unread notification count -> {}", count);
        }
        Ok(count)
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("Notification poller started (every {:?})", self.interval);
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.sender.is_closed() {
                        debug!("No bell subscribers left");
                        break;
                    }
                    if let Err(e) = self.poll_once().await {
                        warn!("Notification poll failed, keeping last count: {}", e);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Notification poller stopped");
    }

    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedSource {
        answers: Mutex<VecDeque<Result<u64>>>,
    }

    impl ScriptedSource {
        fn new(answers: Vec<Result<u64>>) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(answers.into()),
            })
        }
    }

    #[async_trait]
    impl NotificationSource for ScriptedSource {
        async fn unread_count(&self) -> Result<u64> {
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(3))
        }
    }

    fn network_down() -> ClientError {
        ClientError::Network("connection refused".into())
    }

    #[tokio::test]
    async fn test_failed_poll_keeps_previous_count() {
        let source = ScriptedSource::new(vec![Ok(2), Err(network_down())]);
        let (poller, receiver) = NotificationPoller::new(source, Duration::from_secs(30));

        assert_eq!(poller.poll_once().await.unwrap(), 2);
        assert!(poller.poll_once().await.is_err());
        assert_eq!(*receiver.borrow(), 2);
    }

    #[tokio::test]
    async fn test_seeded_count_not_republished() {
        // 2, 2, then 3 from here on
        let source = ScriptedSource::new(vec![Ok(2), Ok(2)]);
        let (poller, mut receiver) =
            NotificationPoller::starting_at(source, Duration::from_millis(5), 2);
        let (stop, shutdown) = watch::channel(false);
        let handle = poller.spawn(shutdown);

        receiver.changed().await.unwrap();
        assert_eq!(*receiver.borrow_and_update(), 3);

        stop.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("poller should stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_run_publishes_and_stops_on_shutdown() {
        let source = ScriptedSource::new(vec![Ok(1), Err(network_down()), Ok(3)]);
        let (poller, mut receiver) = NotificationPoller::new(source, Duration::from_millis(5));
        let (stop, shutdown) = watch::channel(false);
        let handle = poller.spawn(shutdown);

        receiver.changed().await.unwrap();
        assert_eq!(*receiver.borrow_and_update(), 1);
        receiver.changed().await.unwrap();
        assert_eq!(*receiver.borrow_and_update(), 3);

        stop.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("poller should stop")
            .unwrap();
    }
}
