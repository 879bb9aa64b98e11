//! Named timer service
//!
//! Timers are registered under a name and deliver `AppEvent::TimerFired`
//! on the application event channel. Registering a name that already
//! exists replaces the previous schedule.

use crate::core::events::{AppEvent, EventSender};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// When a named timer should fire
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimerSchedule {
    /// Recurring, every `period`
    Period(Duration),
    /// One-shot, at an absolute instant. Instants already in the past
    /// fire immediately.
    At(DateTime<Local>),
}

/// Named timer scheduling facility
#[async_trait]
pub trait TimerService: Send + Sync {
    async fn register(&self, name: &str, schedule: TimerSchedule);
    async fn cancel(&self, name: &str);
}

/// Timer service backed by tokio sleep tasks
pub struct TokioTimerService {
    events: EventSender,
    tasks: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl TokioTimerService {
    pub fn new(events: EventSender) -> Self {
        Self {
            events,
            tasks: Mutex::new(HashMap::new()),
        }
    }
}

impl Drop for TokioTimerService {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.lock().drain() {
            handle.abort();
        }
    }
}

#[async_trait]
impl TimerService for TokioTimerService {
    async fn register(&self, name: &str, schedule: TimerSchedule) {
        let events = self.events.clone();
        let timer_name = name.to_string();
        debug!(timer = name, ?schedule, "registering timer");

        let handle = tokio::spawn(async move {
            match schedule {
                TimerSchedule::Period(period) => loop {
                    tokio::time::sleep(period).await;
                    if events
                        .send(AppEvent::TimerFired {
                            name: timer_name.clone(),
                        })
                        .is_err()
                    {
                        break;
                    }
                },
                TimerSchedule::At(when) => {
                    let delay = (when - Local::now()).to_std().unwrap_or(Duration::ZERO);
                    tokio::time::sleep(delay).await;
                    let _ = events.send(AppEvent::TimerFired { name: timer_name });
                }
            }
        });

        // Replace any existing timer with the same name
        if let Some(old) = self.tasks.lock().insert(name.to_string(), handle) {
            old.abort();
        }
    }

    async fn cancel(&self, name: &str) {
        if let Some(handle) = self.tasks.lock().remove(name) {
            handle.abort();
            debug!(timer = name, "timer cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    fn service() -> (TokioTimerService, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (TokioTimerService::new(EventSender::new(tx)), rx)
    }

    async fn next_fire(rx: &mut mpsc::UnboundedReceiver<AppEvent>, within_ms: u64) -> Option<String> {
        match timeout(Duration::from_millis(within_ms), rx.recv()).await {
            Ok(Some(AppEvent::TimerFired { name })) => Some(name),
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_one_shot_fires_once() {
        let (timers, mut rx) = service();
        let when = Local::now() + chrono::Duration::milliseconds(30);
        timers.register("alarm-1", TimerSchedule::At(when)).await;

        assert_eq!(next_fire(&mut rx, 500).await.as_deref(), Some("alarm-1"));
        assert_eq!(next_fire(&mut rx, 100).await, None);
    }

    #[tokio::test]
    async fn test_past_instant_fires_immediately() {
        let (timers, mut rx) = service();
        let when = Local::now() - chrono::Duration::seconds(10);
        timers.register("alarm-2", TimerSchedule::At(when)).await;

        assert_eq!(next_fire(&mut rx, 200).await.as_deref(), Some("alarm-2"));
    }

    #[tokio::test]
    async fn test_cancel_prevents_fire() {
        let (timers, mut rx) = service();
        let when = Local::now() + chrono::Duration::milliseconds(50);
        timers.register("alarm-1", TimerSchedule::At(when)).await;
        timers.cancel("alarm-1").await;

        assert_eq!(next_fire(&mut rx, 200).await, None);
    }

    #[tokio::test]
    async fn test_reregister_replaces_schedule() {
        let (timers, mut rx) = service();
        let far = Local::now() + chrono::Duration::seconds(60);
        timers.register("alarm-1", TimerSchedule::At(far)).await;
        let near = Local::now() + chrono::Duration::milliseconds(20);
        timers.register("alarm-1", TimerSchedule::At(near)).await;

        // The replacement fires, the original never does
        assert_eq!(next_fire(&mut rx, 500).await.as_deref(), Some("alarm-1"));
        assert_eq!(next_fire(&mut rx, 100).await, None);
    }

    #[tokio::test]
    async fn test_periodic_fires_repeatedly() {
        let (timers, mut rx) = service();
        timers
            .register("update-icon", TimerSchedule::Period(Duration::from_millis(20)))
            .await;

        assert_eq!(next_fire(&mut rx, 500).await.as_deref(), Some("update-icon"));
        assert_eq!(next_fire(&mut rx, 500).await.as_deref(), Some("update-icon"));
    }
}
