//! Tempo and start/stop-sync preferences stored as typed key/value
//! properties on the host client.

use crate::error::{Error, Result};
use crate::session::BeatSession;
use crate::tempo::TempoCell;
use crossbeam::channel::{self, Receiver, Sender};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const BPM_KEY: &str = "http://www.x37v.info/jack/metadata/bpm";
pub const START_STOP_KEY: &str = "http://www.x37v.info/jack/metadata/link/start-stop-sync";
pub const DECIMAL_TYPE: &str = "https://www.w3.org/2001/XMLSchema#decimal";
pub const BOOLEAN_TYPE: &str = "https://www.w3.org/2001/XMLSchema#boolean";

pub type ClientUuid = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub value: String,
    pub type_uri: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyChangeKind {
    Created,
    Changed,
    Deleted,
}

/// A change notification. `None` for subject or key means "all".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyChange {
    pub subject: Option<ClientUuid>,
    pub key: Option<String>,
    pub change: PropertyChangeKind,
}

/// Host-side property storage.
pub trait PropertyStore: Send + Sync {
    /// `None` when the host cannot identify this client.
    fn client_uuid(&self) -> Option<ClientUuid>;

    fn get_property(&self, subject: ClientUuid, key: &str) -> Option<Property>;

    fn set_property(&self, subject: ClientUuid, key: &str, value: &str, type_uri: &str)
        -> Result<()>;

    fn changes(&self) -> Receiver<PropertyChange>;
}

/// Property store kept in process memory, publishing a change for every
/// write and removal.
pub struct InMemoryPropertyStore {
    uuid: Option<ClientUuid>,
    properties: Mutex<HashMap<(ClientUuid, String), Property>>,
    changes_tx: Sender<PropertyChange>,
    changes_rx: Receiver<PropertyChange>,
}

impl InMemoryPropertyStore {
    pub fn new(uuid: Option<ClientUuid>) -> Self {
        let (changes_tx, changes_rx) = channel::unbounded();
        Self {
            uuid,
            properties: Mutex::new(HashMap::new()),
            changes_tx,
            changes_rx,
        }
    }

    pub fn remove_property(&self, subject: ClientUuid, key: &str) -> Result<()> {
        let removed = self
            .properties
            .lock()
            .map_err(|_| Error::Metadata("property store poisoned".into()))?
            .remove(&(subject, key.to_string()));
        if removed.is_some() {
            self.notify(Some(subject), Some(key), PropertyChangeKind::Deleted);
        }
        Ok(())
    }

    fn notify(&self, subject: Option<ClientUuid>, key: Option<&str>, change: PropertyChangeKind) {
        let _ = self.changes_tx.send(PropertyChange {
            subject,
            key: key.map(str::to_string),
            change,
        });
    }
}

impl PropertyStore for InMemoryPropertyStore {
    fn client_uuid(&self) -> Option<ClientUuid> {
        self.uuid
    }

    fn get_property(&self, subject: ClientUuid, key: &str) -> Option<Property> {
        self.properties
            .lock()
            .ok()?
            .get(&(subject, key.to_string()))
            .cloned()
    }

    fn set_property(
        &self,
        subject: ClientUuid,
        key: &str,
        value: &str,
        type_uri: &str,
    ) -> Result<()> {
        let previous = self
            .properties
            .lock()
            .map_err(|_| Error::Metadata("property store poisoned".into()))?
            .insert(
                (subject, key.to_string()),
                Property {
                    value: value.to_string(),
                    type_uri: type_uri.to_string(),
                },
            );
        let change = if previous.is_some() {
            PropertyChangeKind::Changed
        } else {
            PropertyChangeKind::Created
        };
        self.notify(Some(subject), Some(key), change);
        Ok(())
    }

    fn changes(&self) -> Receiver<PropertyChange> {
        self.changes_rx.clone()
    }
}

pub fn parse_bpm(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|bpm| bpm.is_finite() && *bpm > 0.0)
}

pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Keeps the tempo cell and the session's start/stop-sync flag in step with
/// the client's properties.
pub struct MetadataSync<B: BeatSession> {
    store: Arc<dyn PropertyStore>,
    session: Arc<B>,
    tempo: Arc<TempoCell>,
    uuid: Option<ClientUuid>,
}

impl<B: BeatSession> MetadataSync<B> {
    pub fn new(store: Arc<dyn PropertyStore>, session: Arc<B>, tempo: Arc<TempoCell>) -> Self {
        let uuid = store.client_uuid();
        if uuid.is_none() {
            warn!("Host client has no UUID; tempo and start/stop properties are disabled");
        }
        Self {
            store,
            session,
            tempo,
            uuid,
        }
    }

    /// Whether properties can be read and written at all.
    pub fn is_active(&self) -> bool {
        self.uuid.is_some()
    }

    pub fn changes(&self) -> Option<Receiver<PropertyChange>> {
        self.uuid.map(|_| self.store.changes())
    }

    /// Publish the current tempo and start/stop-sync flag.
    pub fn publish_all(&self) -> Result<()> {
        self.publish_tempo(self.tempo.load())?;
        self.publish_start_stop(self.session.is_start_stop_sync_enabled())
    }

    pub fn publish_tempo(&self, bpm: f64) -> Result<()> {
        match self.uuid {
            Some(uuid) => self
                .store
                .set_property(uuid, BPM_KEY, &bpm.to_string(), DECIMAL_TYPE),
            None => Ok(()),
        }
    }

    pub fn publish_start_stop(&self, enabled: bool) -> Result<()> {
        match self.uuid {
            Some(uuid) => {
                let value = if enabled { "true" } else { "false" };
                self.store
                    .set_property(uuid, START_STOP_KEY, value, BOOLEAN_TYPE)
            }
            None => Ok(()),
        }
    }

    pub fn handle_change(&self, change: &PropertyChange) {
        let Some(uuid) = self.uuid else {
            return;
        };
        if change.subject.is_some_and(|subject| subject != uuid) {
            return;
        }

        let key = change.key.as_deref();
        let bpm = key.map_or(true, |k| k == BPM_KEY);
        let enable = key.map_or(true, |k| k == START_STOP_KEY);
        debug!("Property change {:?} on key {:?}", change.change, key);

        match change.change {
            PropertyChangeKind::Created | PropertyChangeKind::Changed => {
                if bpm {
                    self.read_tempo(uuid);
                }
                if enable {
                    self.read_start_stop(uuid);
                }
            }
            PropertyChangeKind::Deleted => {
                if bpm {
                    if let Err(e) = self.publish_tempo(self.tempo.load()) {
                        warn!("Failed to republish tempo property: {}", e);
                    }
                }
                if enable {
                    if let Err(e) = self.publish_start_stop(self.session.is_start_stop_sync_enabled())
                    {
                        warn!("Failed to republish start/stop property: {}", e);
                    }
                }
            }
        }
    }

    fn read_tempo(&self, uuid: ClientUuid) {
        let Some(property) = self.store.get_property(uuid, BPM_KEY) else {
            return;
        };
        match parse_bpm(&property.value) {
            Some(bpm) => {
                if bpm != self.tempo.load() {
                    info!("Tempo property changed to {} BPM", bpm);
                    self.tempo.store(bpm);
                }
            }
            None => warn!("Ignoring malformed tempo property {:?}", property.value),
        }
    }

    fn read_start_stop(&self, uuid: ClientUuid) {
        let Some(property) = self.store.get_property(uuid, START_STOP_KEY) else {
            return;
        };
        match parse_bool(&property.value) {
            Some(enabled) => {
                if enabled != self.session.is_start_stop_sync_enabled() {
                    info!("Start/stop sync {}", if enabled { "enabled" } else { "disabled" });
                    self.session.enable_start_stop_sync(enabled);
                }
            }
            None => warn!("Ignoring malformed start/stop property {:?}", property.value),
        }
    }
}
