// notifications.rs

use crate::host::TransportHost;
use crate::metadata::{MetadataSync, PropertyChange};
use crate::scheduler::{Scheduler, ThreadScheduler};
use crate::session::{BeatSession, SessionEvent};
use crate::tempo::TempoCell;
use crossbeam::channel::{self, select, Receiver, Sender};
use log::{error, info, warn};
use std::io;
use std::sync::Arc;
use std::thread::JoinHandle;

/// Dispatches session and property notifications off the audio thread.
///
/// Handlers only touch the tempo cell, the host transport commands and the
/// property store, never the bridge's per-cycle state.
pub struct NotificationLoop<B: BeatSession> {
    session: Arc<B>,
    host: Arc<dyn TransportHost>,
    tempo: Arc<TempoCell>,
    metadata: Option<MetadataSync<B>>,
    session_rx: Receiver<SessionEvent>,
    property_rx: Receiver<PropertyChange>,
}

/// Running notification thread.
pub struct NotificationHandle {
    shutdown: Sender<()>,
    thread: JoinHandle<()>,
}

impl NotificationHandle {
    pub fn shutdown(self) {
        let _ = self.shutdown.send(());
        if self.thread.join().is_err() {
            error!("Notification thread panicked");
        }
    }
}

impl<B: BeatSession + 'static> NotificationLoop<B> {
    pub fn new(
        session: Arc<B>,
        host: Arc<dyn TransportHost>,
        tempo: Arc<TempoCell>,
        metadata: Option<MetadataSync<B>>,
    ) -> Self {
        let session_rx = session.events();
        let property_rx = metadata
            .as_ref()
            .and_then(MetadataSync::changes)
            .unwrap_or_else(channel::never);
        Self {
            session,
            host,
            tempo,
            metadata,
            session_rx,
            property_rx,
        }
    }

    pub fn handle_session_event(&self, event: SessionEvent) {
        match event {
            SessionEvent::Tempo(bpm) => {
                info!("Session tempo changed to {} BPM", bpm);
                self.tempo.store(bpm);
                if let Some(metadata) = &self.metadata {
                    if let Err(e) = metadata.publish_tempo(bpm) {
                        warn!("Failed to publish tempo property: {}", e);
                    }
                }
            }
            SessionEvent::StartStop(playing) => {
                if !self.session.is_start_stop_sync_enabled() {
                    return;
                }
                if playing {
                    info!("Session started playing, starting transport");
                    self.host.start();
                } else {
                    info!("Session stopped playing, stopping transport");
                    self.host.stop();
                }
            }
        }
    }

    pub fn handle_property_change(&self, change: &PropertyChange) {
        if let Some(metadata) = &self.metadata {
            metadata.handle_change(change);
        }
    }

    /// Block dispatching notifications until `shutdown` fires or the session
    /// goes away.
    pub fn run(&self, shutdown: Receiver<()>) {
        loop {
            select! {
                recv(self.session_rx) -> event => match event {
                    Ok(event) => self.handle_session_event(event),
                    Err(_) => {
                        error!("Session notification channel disconnected");
                        break;
                    }
                },
                recv(self.property_rx) -> change => match change {
                    Ok(change) => self.handle_property_change(&change),
                    Err(_) => {
                        error!("Property notification channel disconnected");
                        break;
                    }
                },
                recv(shutdown) -> _ => break,
            }
        }
        info!("Notification loop stopped");
    }

    pub fn spawn(self) -> io::Result<NotificationHandle> {
        let (shutdown, shutdown_rx) = channel::bounded(1);
        let thread = ThreadScheduler::new().spawn("notifications", move || {
            info!("Notification loop started");
            self.run(shutdown_rx);
        })?;
        Ok(NotificationHandle { shutdown, thread })
    }
}
