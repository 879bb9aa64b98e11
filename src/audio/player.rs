//! The audio surface itself
//!
//! A dedicated thread owning a rodio output stream (output streams are not
//! `Send`, so the surface gets its own thread, like the tray). It loops the
//! requested sound until the ring duration elapses or a stop command
//! arrives, and signals `AudioSurfaceReady` once its output stream is open
//! so the manager knows commands will be heard.

use crate::core::events::{AppEvent, EventSender};
use crate::host::audio::{AudioCommand, AudioError, AudioHost, AudioMessage};
use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Audio host backed by a rodio playback thread
pub struct RodioAudioHost {
    events: EventSender,
    sounds_dir: PathBuf,
    surface: Mutex<Option<SurfaceHandle>>,
}

struct SurfaceHandle {
    tx: Sender<AudioCommand>,
    alive: Arc<AtomicBool>,
}

impl RodioAudioHost {
    pub fn new(events: EventSender, sounds_dir: PathBuf) -> Self {
        Self {
            events,
            sounds_dir,
            surface: Mutex::new(None),
        }
    }
}

#[async_trait]
impl AudioHost for RodioAudioHost {
    async fn has_surface(&self) -> bool {
        self.surface
            .lock()
            .as_ref()
            .is_some_and(|s| s.alive.load(Ordering::SeqCst))
    }

    async fn create_surface(&self) -> Result<(), AudioError> {
        let (tx, rx) = std::sync::mpsc::channel();
        let alive = Arc::new(AtomicBool::new(true));

        let thread_alive = Arc::clone(&alive);
        let events = self.events.clone();
        let sounds_dir = self.sounds_dir.clone();
        std::thread::Builder::new()
            .name("alarm-audio".to_string())
            .spawn(move || {
                run_surface(rx, &sounds_dir, &events);
                thread_alive.store(false, Ordering::SeqCst);
                debug!("audio surface thread exited");
            })
            .map_err(|e| AudioError::CreationFailed(e.to_string()))?;

        *self.surface.lock() = Some(SurfaceHandle { tx, alive });
        Ok(())
    }

    async fn send(&self, message: AudioMessage) -> Result<(), AudioError> {
        let guard = self.surface.lock();
        let handle = guard
            .as_ref()
            .ok_or_else(|| AudioError::Unreachable("no surface".to_string()))?;
        handle
            .tx
            .send(message.command)
            .map_err(|_| AudioError::Unreachable("surface thread exited".to_string()))
    }
}

/// Control side of alarm playback, driven by the command loop
trait Playback {
    /// Begin looping `sound`. Returns false when playback could not start.
    fn start(&mut self, sound: &str) -> bool;

    /// Silence, if anything is playing
    fn stop(&mut self);
}

/// Playback through a rodio sink on the surface's output stream
struct RodioPlayback<'a> {
    handle: &'a OutputStreamHandle,
    sounds_dir: &'a Path,
    sink: Option<Sink>,
}

impl Playback for RodioPlayback<'_> {
    fn start(&mut self, sound: &str) -> bool {
        match start_looping(self.handle, self.sounds_dir, sound) {
            Ok(sink) => {
                self.sink = Some(sink);
                true
            }
            Err(e) => {
                warn!(sound, "failed to start alarm playback: {:#}", e);
                false
            }
        }
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }
}

fn run_surface(rx: Receiver<AudioCommand>, sounds_dir: &Path, events: &EventSender) {
    let (_stream, stream_handle) = match OutputStream::try_default() {
        Ok(output) => output,
        Err(e) => {
            // No ready signal is sent, so the pending creation attempt
            // times out and the next play retries
            warn!("failed to open audio output: {}", e);
            return;
        }
    };

    info!("audio surface ready");
    let _ = events.send(AppEvent::AudioSurfaceReady);

    command_loop(
        rx,
        RodioPlayback {
            handle: &stream_handle,
            sounds_dir,
            sink: None,
        },
    );
}

/// Surface command loop. Tracks at most one playing alarm and its
/// auto-stop deadline; a new play replaces both, and a stop command
/// cancels any pending auto-stop. Kept apart from the output stream so
/// the transitions can be exercised without an audio device.
fn command_loop<P: Playback>(rx: Receiver<AudioCommand>, mut playback: P) -> P {
    let mut stop_at: Option<Instant> = None;

    loop {
        let command = if let Some(deadline) = stop_at {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok(command) => command,
                Err(RecvTimeoutError::Timeout) => {
                    // Ring duration elapsed
                    playback.stop();
                    stop_at = None;
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        } else {
            match rx.recv() {
                Ok(command) => command,
                Err(_) => break,
            }
        };

        match command {
            AudioCommand::PlayAlarmSound { sound, duration } => {
                playback.stop();
                if playback.start(&sound) {
                    debug!(sound, duration, "alarm playback started");
                    stop_at = Some(Instant::now() + Duration::from_secs(duration));
                } else {
                    stop_at = None;
                }
            }
            AudioCommand::StopAlarmSound => {
                playback.stop();
                stop_at = None;
            }
        }
    }

    playback
}

fn start_looping(handle: &OutputStreamHandle, sounds_dir: &Path, sound: &str) -> Result<Sink> {
    let path = sound_path(sounds_dir, sound);
    let file =
        File::open(&path).with_context(|| format!("Failed to open sound file: {:?}", path))?;
    let source = Decoder::new(BufReader::new(file))
        .with_context(|| format!("Failed to decode sound file: {:?}", path))?
        .repeat_infinite();
    let sink = Sink::try_new(handle).context("Failed to create playback sink")?;
    sink.append(source);
    Ok(sink)
}

fn sound_path(sounds_dir: &Path, sound: &str) -> PathBuf {
    sounds_dir.join(format!("{}.mp3", sound))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakePlayback {
        playing: bool,
        started: Vec<String>,
        silenced: usize,
    }

    impl Playback for FakePlayback {
        fn start(&mut self, sound: &str) -> bool {
            self.playing = true;
            self.started.push(sound.to_string());
            true
        }

        fn stop(&mut self) {
            if self.playing {
                self.playing = false;
                self.silenced += 1;
            }
        }
    }

    #[test]
    fn test_sound_path() {
        assert_eq!(
            sound_path(Path::new("/data/sounds"), "bell"),
            PathBuf::from("/data/sounds/bell.mp3")
        );
    }

    #[test]
    fn test_auto_stop_when_ring_duration_elapses() {
        let (tx, rx) = std::sync::mpsc::channel();
        tx.send(AudioCommand::PlayAlarmSound {
            sound: "bell".to_string(),
            duration: 0,
        })
        .unwrap();

        // Sender stays open so the loop hits the deadline, not disconnect
        let worker = std::thread::spawn(move || command_loop(rx, FakePlayback::default()));
        std::thread::sleep(Duration::from_millis(100));
        drop(tx);

        let playback = worker.join().unwrap();
        assert_eq!(playback.started, vec!["bell"]);
        assert_eq!(playback.silenced, 1);
        assert!(!playback.playing);
    }

    #[test]
    fn test_stop_cancels_pending_auto_stop() {
        let (tx, rx) = std::sync::mpsc::channel();
        tx.send(AudioCommand::PlayAlarmSound {
            sound: "bell".to_string(),
            duration: 0,
        })
        .unwrap();
        tx.send(AudioCommand::StopAlarmSound).unwrap();
        drop(tx);

        let playback = command_loop(rx, FakePlayback::default());
        // One silence from the stop command, none from the stale deadline
        assert_eq!(playback.silenced, 1);
        assert!(!playback.playing);
    }

    #[test]
    fn test_new_play_replaces_active_alarm() {
        let (tx, rx) = std::sync::mpsc::channel();
        tx.send(AudioCommand::PlayAlarmSound {
            sound: "bell".to_string(),
            duration: 0,
        })
        .unwrap();
        tx.send(AudioCommand::PlayAlarmSound {
            sound: "chime".to_string(),
            duration: 60,
        })
        .unwrap();
        drop(tx);

        let playback = command_loop(rx, FakePlayback::default());
        assert_eq!(playback.started, vec!["bell", "chime"]);
        // The first alarm was silenced by the replacement; the second was
        // still ringing at shutdown, its deadline untouched by the first's
        assert_eq!(playback.silenced, 1);
        assert!(playback.playing);
    }
}
