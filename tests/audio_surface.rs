//! Audio surface lifecycle: lazy creation, the shared in-flight attempt,
//! and the ready handshake

mod common;

use clocktray::audio::AudioSurfaceManager;
use clocktray::core::events::{AppEvent, EventSender};
use clocktray::host::audio::{AudioError, AudioMessage};
use common::MockAudioHost;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Manager wired to a mock host, with a pump task forwarding the host's
/// ready events the way the daemon's dispatch loop does
fn manager_with_pump() -> (Arc<MockAudioHost>, Arc<AudioSurfaceManager>) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let host = Arc::new(MockAudioHost::with_events(EventSender::new(tx)));
    let manager = Arc::new(AudioSurfaceManager::new(
        Arc::clone(&host) as _,
        Duration::from_secs(1),
    ));

    let pump = Arc::clone(&manager);
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if matches!(event, AppEvent::AudioSurfaceReady) {
                pump.on_surface_ready();
            }
        }
    });

    (host, manager)
}

#[tokio::test]
async fn play_creates_surface_once() {
    let (host, manager) = manager_with_pump();

    manager.play("bell", 5).await.unwrap();

    assert_eq!(host.creation_count(), 1);
    assert_eq!(
        host.sent.lock().as_slice(),
        &[AudioMessage::play("bell", 5)]
    );
}

#[tokio::test]
async fn concurrent_plays_share_one_creation() {
    let (host, manager) = manager_with_pump();

    let (a, b) = tokio::join!(manager.play("bell", 5), manager.play("bell", 5));
    a.unwrap();
    b.unwrap();

    assert_eq!(host.creation_count(), 1);
    assert_eq!(host.sent.lock().len(), 2);
}

#[tokio::test]
async fn play_skips_creation_when_surface_exists() {
    let (host, manager) = manager_with_pump();
    host.set_exists(true);

    manager.play("chime", 9).await.unwrap();

    assert_eq!(host.creation_count(), 0);
    assert_eq!(
        host.sent.lock().as_slice(),
        &[AudioMessage::play("chime", 9)]
    );
}

#[tokio::test]
async fn stop_without_surface_is_a_noop() {
    let (host, manager) = manager_with_pump();

    manager.stop().await.unwrap();
    manager.stop().await.unwrap();

    assert!(host.sent.lock().is_empty());
}

#[tokio::test]
async fn stop_with_surface_sends_silence() {
    let (host, manager) = manager_with_pump();
    host.set_exists(true);

    manager.stop().await.unwrap();

    assert_eq!(host.sent.lock().as_slice(), &[AudioMessage::stop()]);
}

#[tokio::test]
async fn failed_creation_surfaces_error_and_allows_retry() {
    let (host, manager) = manager_with_pump();
    host.set_fail_create(true);

    let err = manager.play("bell", 5).await.unwrap_err();
    assert!(matches!(err, AudioError::CreationFailed(_)));
    assert!(host.sent.lock().is_empty());

    // The failed attempt must not wedge the manager
    host.set_fail_create(false);
    manager.play("bell", 5).await.unwrap();

    assert_eq!(host.creation_count(), 2);
    assert_eq!(host.sent.lock().len(), 1);
}

#[tokio::test]
async fn joiner_clears_attempt_when_initiator_is_cancelled() {
    let (host, manager) = manager_with_pump();
    host.set_signal_ready(false);

    // The initiating caller installs the creation attempt, then goes away
    // while the ready handshake is still outstanding
    let initiator = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.play("bell", 5).await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    initiator.abort();
    // The half-created surface died with it
    host.set_exists(false);

    // A later caller joins the installed attempt and rides it to failure
    let err = manager.play("bell", 5).await.unwrap_err();
    assert!(matches!(err, AudioError::ReadyTimeout(_)));
    assert_eq!(host.creation_count(), 1);

    // The failed attempt must be gone, not re-joined forever
    host.set_signal_ready(true);
    manager.play("bell", 5).await.unwrap();
    assert_eq!(host.creation_count(), 2);
}

#[tokio::test]
async fn missing_ready_signal_times_out() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let host = Arc::new(MockAudioHost::with_events(EventSender::new(tx)));
    host.set_signal_ready(false);
    let manager = AudioSurfaceManager::new(Arc::clone(&host) as _, Duration::from_millis(50));

    let err = manager.play("bell", 5).await.unwrap_err();

    assert_eq!(err, AudioError::ReadyTimeout(Duration::from_millis(50)));
    assert!(host.sent.lock().is_empty());
}
