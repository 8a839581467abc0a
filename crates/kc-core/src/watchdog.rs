//! Idle auto-shutoff.
//!
//! A cancellable background task polls the shared session on a fixed
//! interval and closes it once it has been inactive past the configured
//! threshold, notifying the owner with the session summary. It communicates
//! with the handlers only through [`RelaySession`] and never counts as
//! activity itself.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    domain::ChatId,
    formatting::{format_duration, format_summary},
    ports::MessagingPort,
    session::RelaySession,
};

pub struct IdleWatchdog {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl IdleWatchdog {
    pub fn spawn(
        session: Arc<RelaySession>,
        messenger: Arc<dyn MessagingPort>,
        owner: ChatId,
        poll: Duration,
        threshold: Duration,
    ) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut tick = interval(poll);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tick.tick() => {
                        let Some(summary) = session.deactivate_if_idle(threshold).await else {
                            continue;
                        };

                        info!(
                            received = summary.received,
                            delivered = summary.delivered,
                            failed = summary.failed,
                            "session auto-deactivated after idling"
                        );

                        let text = format!(
                            "😴 Auto-deactivated: no activity for {}.\n\
                             Kindle mode is off 🫶🏻\n\n{}",
                            format_duration(threshold.as_secs() as i64),
                            format_summary(&summary)
                        );
                        // The summary is already gone from the session; a lost
                        // notification must not take the watchdog down with it.
                        if let Err(e) = messenger.send_html(owner, &text).await {
                            warn!("idle notification failed: {e}");
                        }
                    }
                }
            }
        });

        Self { cancel, handle }
    }

    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MessageId, MessageRef};
    use crate::{Error, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeMessenger {
        fail: bool,
        sent: Mutex<Vec<(ChatId, String)>>,
    }

    impl FakeMessenger {
        fn sent(&self) -> Vec<(ChatId, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MessagingPort for FakeMessenger {
        async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
            if self.fail {
                return Err(Error::External("telegram down".to_string()));
            }
            self.sent.lock().unwrap().push((chat_id, html.to_string()));
            Ok(MessageRef {
                chat_id,
                message_id: MessageId(1),
            })
        }
    }

    const POLL: Duration = Duration::from_secs(30);
    const THRESHOLD: Duration = Duration::from_secs(2 * 60 * 60);

    #[tokio::test(start_paused = true)]
    async fn notifies_owner_once_with_pre_reset_counts() {
        let session = Arc::new(RelaySession::new());
        let messenger = Arc::new(FakeMessenger::default());
        let watchdog = IdleWatchdog::spawn(
            session.clone(),
            messenger.clone(),
            ChatId(42),
            POLL,
            THRESHOLD,
        );

        session.activate().await;
        session.record_received().await;
        session.record_delivered().await;
        session.record_failure("x.epub: download failed (boom)".to_string())
            .await;

        tokio::time::sleep(THRESHOLD + POLL).await;

        let sent = messenger.sent();
        assert_eq!(sent.len(), 1, "exactly one notification");
        let (chat, text) = &sent[0];
        assert_eq!(*chat, ChatId(42));
        assert!(text.contains("Auto-deactivated"));
        assert!(text.contains("Received: <b>1</b>"));
        assert!(text.contains("Delivered: <b>1</b>"));
        assert!(text.contains("Failed: <b>1</b>"));
        assert!(text.contains("x.epub"));
        assert!(!session.is_active().await);

        // Later ticks find nothing to close.
        tokio::time::sleep(THRESHOLD + POLL).await;
        assert_eq!(messenger.sent().len(), 1);

        watchdog.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn activity_defers_the_shutoff() {
        let session = Arc::new(RelaySession::new());
        let messenger = Arc::new(FakeMessenger::default());
        let watchdog = IdleWatchdog::spawn(
            session.clone(),
            messenger.clone(),
            ChatId(42),
            POLL,
            THRESHOLD,
        );

        session.activate().await;
        tokio::time::sleep(THRESHOLD / 2).await;
        session.touch().await;
        tokio::time::sleep(THRESHOLD / 2).await;

        // Half a threshold after the last touch: still on.
        assert!(session.is_active().await);
        assert!(messenger.sent().is_empty());

        watchdog.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn inactive_session_is_left_alone() {
        let session = Arc::new(RelaySession::new());
        let messenger = Arc::new(FakeMessenger::default());
        let watchdog = IdleWatchdog::spawn(
            session.clone(),
            messenger.clone(),
            ChatId(42),
            POLL,
            THRESHOLD,
        );

        tokio::time::sleep(THRESHOLD * 3).await;
        assert!(messenger.sent().is_empty());

        watchdog.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn notification_failure_does_not_kill_the_loop() {
        let session = Arc::new(RelaySession::new());
        let messenger = Arc::new(FakeMessenger {
            fail: true,
            ..Default::default()
        });
        let watchdog = IdleWatchdog::spawn(
            session.clone(),
            messenger.clone(),
            ChatId(42),
            POLL,
            THRESHOLD,
        );

        session.activate().await;
        tokio::time::sleep(THRESHOLD + POLL).await;
        assert!(!session.is_active().await);

        // The loop survived the failed send and still reacts to a new session.
        session.activate().await;
        tokio::time::sleep(THRESHOLD + POLL).await;
        assert!(!session.is_active().await);

        watchdog.stop().await;
    }
}
