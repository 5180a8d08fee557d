//! Playback coordination
//!
//! Tracks at most one in-flight synthesized-audio stream per session. When
//! the transport layer detects the user speaking over a playing response
//! (barge-in), it stops the current stream before feeding the new utterance
//! into the turn controller.
//!
//! The coordinator owns a single state enum behind one async mutex; stop
//! signals travel over a `watch` channel so a superseded stream's consumer
//! observes the signal before replacement audio begins.

use std::time::Duration;

use tokio::sync::{watch, Mutex};

/// Handle to an active audio stream.
///
/// The transport task holding this handle plays `audio` and polls
/// [`StreamHandle::is_stopped`] (or awaits [`StreamHandle::stopped`]) to
/// honor barge-in.
#[derive(Debug)]
pub struct StreamHandle {
    audio: Vec<u8>,
    stop: watch::Receiver<bool>,
}

impl StreamHandle {
    /// Synthesized audio bytes for this stream
    pub fn audio(&self) -> &[u8] {
        &self.audio
    }

    /// True once the stream has been superseded or explicitly stopped
    pub fn is_stopped(&self) -> bool {
        *self.stop.borrow()
    }

    /// Wait until the stream is stopped
    pub async fn stopped(&mut self) {
        if *self.stop.borrow() {
            return;
        }
        // The sender is kept alive by the coordinator state; a closed
        // channel also means the stream is done.
        let _ = self.stop.wait_for(|stopped| *stopped).await;
    }
}

enum StreamState {
    Idle,
    Active { stop_tx: watch::Sender<bool> },
}

/// Per-session interruption coordinator
pub struct PlaybackCoordinator {
    state: Mutex<StreamState>,
}

impl PlaybackCoordinator {
    /// How long a superseded stream gets to observe its stop signal
    const SUPERSEDE_GRACE: Duration = Duration::from_millis(50);

    pub fn new() -> Self {
        Self {
            state: Mutex::new(StreamState::Idle),
        }
    }

    /// Install a new active stream, stopping any prior one first.
    ///
    /// If a stream is already active its stop signal is raised and a brief
    /// grace period elapses (still under the coordinator lock) before the
    /// new stream takes its place, so two streams are never active at once.
    pub async fn start_new_stream(&self, audio: Vec<u8>) -> StreamHandle {
        let mut state = self.state.lock().await;

        if let StreamState::Active { stop_tx } = &*state {
            let _ = stop_tx.send(true);
            tokio::time::sleep(Self::SUPERSEDE_GRACE).await;
            tracing::debug!("Superseded active audio stream");
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        *state = StreamState::Active { stop_tx };

        StreamHandle {
            audio,
            stop: stop_rx,
        }
    }

    /// Stop and clear the active stream; idempotent when none is active.
    pub async fn stop_current_stream(&self) {
        let mut state = self.state.lock().await;

        if let StreamState::Active { stop_tx } = &*state {
            let _ = stop_tx.send(true);
            tracing::debug!("Stopped active audio stream");
        }

        *state = StreamState::Idle;
    }

    /// True while a stream is active
    pub async fn is_active(&self) -> bool {
        matches!(*self.state.lock().await, StreamState::Active { .. })
    }
}

impl Default for PlaybackCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
