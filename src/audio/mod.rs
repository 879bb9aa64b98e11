//! Audio surface manager
//!
//! Relays play/stop commands to the hidden audio surface, creating it
//! lazily. Creation is serialized through a single shared in-flight
//! future: concurrent `play` calls while no surface exists all await the
//! same creation attempt, so two surfaces can never be created by this
//! process. Existence is re-queried from the host on every call because
//! the surface can outlive or predate this process instance.

pub mod player;

pub use player::RodioAudioHost;

use crate::host::audio::{AudioError, AudioHost, AudioMessage};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex as AsyncMutex};
use tracing::{debug, warn};

type CreationFuture = Shared<BoxFuture<'static, Result<(), AudioError>>>;

/// Serializes surface creation and relays playback commands
pub struct AudioSurfaceManager {
    host: Arc<dyn AudioHost>,
    /// The single in-flight creation attempt, shared by concurrent callers
    creating: AsyncMutex<Option<CreationFuture>>,
    /// Listener for the surface's ready signal, installed before creation
    pending_ready: Arc<Mutex<Option<oneshot::Sender<()>>>>,
    ready_timeout: Duration,
}

impl AudioSurfaceManager {
    pub fn new(host: Arc<dyn AudioHost>, ready_timeout: Duration) -> Self {
        Self {
            host,
            creating: AsyncMutex::new(None),
            pending_ready: Arc::new(Mutex::new(None)),
            ready_timeout,
        }
    }

    /// Forward the surface's ready signal to the pending creation attempt
    pub fn on_surface_ready(&self) {
        if let Some(tx) = self.pending_ready.lock().take() {
            let _ = tx.send(());
        } else {
            debug!("audio surface ready signal with no pending creation");
        }
    }

    /// Play `sound` on the surface for `duration` seconds, creating the
    /// surface first if it doesn't exist.
    pub async fn play(&self, sound: &str, duration: u64) -> Result<(), AudioError> {
        if self.host.has_surface().await {
            return self.host.send(AudioMessage::play(sound, duration)).await;
        }

        let (future, initiated) = {
            let mut creating = self.creating.lock().await;
            match creating.as_ref() {
                Some(in_flight) => (in_flight.clone(), false),
                None => {
                    let future = self.creation_future();
                    *creating = Some(future.clone());
                    (future, true)
                }
            }
        };

        let result = future.clone().await;

        // The initiating caller clears the marker; any caller clears a
        // failed attempt, since a cancelled initiator would otherwise
        // leave the dead attempt installed for every later play. Either
        // way only if the marker still refers to this attempt.
        if initiated || result.is_err() {
            let mut creating = self.creating.lock().await;
            if creating.as_ref().is_some_and(|f| f.ptr_eq(&future)) {
                *creating = None;
            }
        }
        result?;

        self.host.send(AudioMessage::play(sound, duration)).await
    }

    /// Silence the surface. No-op when no surface exists.
    pub async fn stop(&self) -> Result<(), AudioError> {
        if self.host.has_surface().await {
            self.host.send(AudioMessage::stop()).await
        } else {
            Ok(())
        }
    }

    /// Build the creation attempt: install the ready listener, start
    /// creation, and resolve only once the surface signals ready (bounded
    /// by the configured timeout).
    fn creation_future(&self) -> CreationFuture {
        let host = Arc::clone(&self.host);
        let pending_ready = Arc::clone(&self.pending_ready);
        let ready_timeout = self.ready_timeout;

        async move {
            let (ready_tx, ready_rx) = oneshot::channel();
            // Listener must be in place before creation starts, or a fast
            // surface could signal ready into the void
            *pending_ready.lock() = Some(ready_tx);

            if let Err(e) = host.create_surface().await {
                warn!("audio surface creation failed: {}", e);
                pending_ready.lock().take();
                return Err(e);
            }

            match tokio::time::timeout(ready_timeout, ready_rx).await {
                Ok(Ok(())) => {
                    debug!("audio surface ready");
                    Ok(())
                }
                Ok(Err(_)) => Err(AudioError::CreationFailed(
                    "ready listener dropped".to_string(),
                )),
                Err(_) => {
                    pending_ready.lock().take();
                    Err(AudioError::ReadyTimeout(ready_timeout))
                }
            }
        }
        .boxed()
        .shared()
    }
}
