//! Change notifications
//!
//! The watcher calls [`Notifier::notify`] once per detected change. The
//! production notifier, [`AlertFanout`], rings a local [`Alarm`] and then hands
//! the message to a [`Broadcaster`] for every registered target. Nothing in
//! here returns an error to the watcher: failures are logged and swallowed.

use crate::error::{DeliveryError, PlaybackError};
use crate::registry::{TargetId, TargetRegistry};
use crate::resource::MonitoredResource;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A watched page changed between two passes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    pub name: String,
    pub url: String,
    pub detected_at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn for_resource(resource: &MonitoredResource) -> Self {
        Self {
            name: resource.name().to_string(),
            url: resource.url().to_string(),
            detected_at: Utc::now(),
        }
    }

    pub fn message(&self) -> String {
        format!(
            "🚨 {} PAGE CHANGED!\n{}\n(detected {})",
            self.name,
            self.url,
            self.detected_at.format("%H:%M:%S UTC")
        )
    }
}

/// A watched page could not be checked this pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    pub name: String,
    pub url: String,
    pub error: String,
}

impl FetchFailure {
    pub fn message(&self) -> String {
        format!("⚠️ Could not check {}: {}", self.name, self.error)
    }
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &ChangeEvent);

    /// Hook for surfacing fetch failures to an operator. Ignored by default.
    async fn fetch_failed(&self, _failure: &FetchFailure) {}
}

/// Local audible cue
#[async_trait::async_trait]
pub trait Alarm: Send + Sync {
    async fn ring(&self) -> Result<(), PlaybackError>;
}

/// Delivers a text message to one target
#[async_trait::async_trait]
pub trait Broadcaster: Send + Sync {
    async fn deliver(&self, target: TargetId, text: &str) -> Result<(), DeliveryError>;
}

/// Broadcaster that only writes to the log, used when no chat front end runs
#[derive(Debug, Default, Clone, Copy)]
pub struct LogBroadcaster;

#[async_trait::async_trait]
impl Broadcaster for LogBroadcaster {
    async fn deliver(&self, target: TargetId, text: &str) -> Result<(), DeliveryError> {
        info!(target_id = %target, "{}", text);
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

pub struct AlertFanout {
    broadcaster: Arc<dyn Broadcaster>,
    registry: TargetRegistry,
    alarm: Option<Arc<dyn Alarm>>,
    admin: Option<TargetId>,
}

impl AlertFanout {
    pub fn new(broadcaster: Arc<dyn Broadcaster>, registry: TargetRegistry) -> Self {
        Self {
            broadcaster,
            registry,
            alarm: None,
            admin: None,
        }
    }

    pub fn with_alarm(mut self, alarm: Arc<dyn Alarm>) -> Self {
        self.alarm = Some(alarm);
        self
    }

    /// Target that receives fetch failure notes
    pub fn with_admin(mut self, admin: TargetId) -> Self {
        self.admin = Some(admin);
        self
    }

    /// Sends `text` to every registered target; one failure never stops the rest.
    pub async fn broadcast(&self, text: &str) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for target in self.registry.snapshot() {
            match self.broadcaster.deliver(target, text).await {
                Ok(()) => {
                    debug!(target_id = %target, "Alert delivered");
                    report.delivered += 1;
                }
                Err(e) => {
                    warn!(target_id = %target, error = %e, "Alert delivery failed");
                    report.failed += 1;
                }
            }
        }

        report
    }
}

#[async_trait::async_trait]
impl Notifier for AlertFanout {
    async fn notify(&self, event: &ChangeEvent) {
        if let Some(ref alarm) = self.alarm
            && let Err(e) = alarm.ring().await
        {
            warn!(resource = %event.name, error = %e, "Could not play alert sound");
        }

        let report = self.broadcast(&event.message()).await;
        info!(
            resource = %event.name,
            delivered = report.delivered,
            failed = report.failed,
            "Change broadcast"
        );
    }

    async fn fetch_failed(&self, failure: &FetchFailure) {
        let Some(admin) = self.admin else {
            return;
        };

        if let Err(e) = self.broadcaster.deliver(admin, &failure.message()).await {
            warn!(target_id = %admin, error = %e, "Could not report fetch failure to admin");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingBroadcaster {
        sent: Mutex<Vec<(TargetId, String)>>,
        failing: Vec<TargetId>,
    }

    #[async_trait::async_trait]
    impl Broadcaster for RecordingBroadcaster {
        async fn deliver(&self, target: TargetId, text: &str) -> Result<(), DeliveryError> {
            if self.failing.contains(&target) {
                return Err(DeliveryError {
                    target,
                    message: "chat not found".to_string(),
                });
            }
            self.sent.lock().push((target, text.to_string()));
            Ok(())
        }
    }

    struct BrokenSpeaker {
        rings: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Alarm for BrokenSpeaker {
        async fn ring(&self) -> Result<(), PlaybackError> {
            self.rings.fetch_add(1, Ordering::SeqCst);
            Err(PlaybackError::NoPlayer)
        }
    }

    fn event() -> ChangeEvent {
        ChangeEvent {
            name: "DSP".to_string(),
            url: "https://example.com/dsp/grades".to_string(),
            detected_at: Utc::now(),
        }
    }

    fn registry(ids: &[i64]) -> TargetRegistry {
        let registry = TargetRegistry::new();
        for id in ids {
            registry.register(TargetId(*id));
        }
        registry
    }

    #[tokio::test]
    async fn failed_target_does_not_block_others() {
        let broadcaster = Arc::new(RecordingBroadcaster {
            failing: vec![TargetId(2)],
            ..Default::default()
        });
        let fanout = AlertFanout::new(broadcaster.clone(), registry(&[1, 2, 3]));

        let report = fanout.broadcast("hello").await;
        assert_eq!(report, DeliveryReport { delivered: 2, failed: 1 });

        let sent: Vec<_> = broadcaster.sent.lock().iter().map(|(t, _)| *t).collect();
        assert_eq!(sent, vec![TargetId(1), TargetId(3)]);
    }

    #[tokio::test]
    async fn playback_failure_still_broadcasts() {
        let broadcaster = Arc::new(RecordingBroadcaster::default());
        let speaker = Arc::new(BrokenSpeaker {
            rings: AtomicUsize::new(0),
        });
        let fanout =
            AlertFanout::new(broadcaster.clone(), registry(&[10])).with_alarm(speaker.clone());

        fanout.notify(&event()).await;

        assert_eq!(speaker.rings.load(Ordering::SeqCst), 1);
        let sent = broadcaster.sent.lock();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.contains("DSP PAGE CHANGED"));
        assert!(sent[0].1.contains("https://example.com/dsp/grades"));
    }

    #[tokio::test]
    async fn fetch_failures_go_to_admin_only() {
        let broadcaster = Arc::new(RecordingBroadcaster::default());
        let fanout =
            AlertFanout::new(broadcaster.clone(), registry(&[1, 2])).with_admin(TargetId(99));

        fanout
            .fetch_failed(&FetchFailure {
                name: "CPS".to_string(),
                url: "https://example.com/cps".to_string(),
                error: "HTTP 502".to_string(),
            })
            .await;

        let sent = broadcaster.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, TargetId(99));
        assert!(sent[0].1.contains("CPS"));
    }

    #[tokio::test]
    async fn fetch_failures_are_dropped_without_admin() {
        let broadcaster = Arc::new(RecordingBroadcaster::default());
        let fanout = AlertFanout::new(broadcaster.clone(), registry(&[1]));

        fanout
            .fetch_failed(&FetchFailure {
                name: "CPS".to_string(),
                url: "https://example.com/cps".to_string(),
                error: "timeout".to_string(),
            })
            .await;

        assert!(broadcaster.sent.lock().is_empty());
    }
}
