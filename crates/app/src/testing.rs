//! Test doubles shared by the app-layer unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use homewatch_domain::alarm::{Alarm, NewAlarm};
use homewatch_domain::error::HomewatchError;
use homewatch_domain::event::{Event, EventType};
use homewatch_domain::id::{AlarmId, LogEntryId};
use homewatch_domain::log_entry::{LogEntry, NewLogEntry};
use homewatch_domain::message::Snapshot;
use homewatch_domain::topic::Topic;
use homewatch_domain::value::ValueReading;

use crate::event_bus::EventReceiver;
use crate::plugin::Plugin;
use crate::ports::{SnapshotSource, Store, StoreTransaction};

#[derive(Debug, Default, Clone)]
struct State {
    logs: Vec<LogEntry>,
    values: Vec<ValueReading>,
    alarms: Vec<Alarm>,
    next_log: i64,
    next_alarm: i64,
}

/// Store keeping everything in memory. A transaction works on a copy of
/// the state and writes it back on commit.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
    broken: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose `begin` always fails.
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    pub fn logs(&self) -> Vec<LogEntry> {
        self.state.lock().unwrap().logs.clone()
    }

    pub fn values(&self) -> Vec<ValueReading> {
        self.state.lock().unwrap().values.clone()
    }

    pub fn alarms(&self) -> Vec<Alarm> {
        self.state.lock().unwrap().alarms.clone()
    }
}

impl Store for InMemoryStore {
    type Transaction = InMemoryTransaction;

    async fn begin(&self) -> Result<Self::Transaction, HomewatchError> {
        if self.broken {
            return Err(HomewatchError::Storage("store unavailable".into()));
        }
        let work = self.state.lock().unwrap().clone();
        Ok(InMemoryTransaction {
            shared: Arc::clone(&self.state),
            work,
        })
    }
}

pub struct InMemoryTransaction {
    shared: Arc<Mutex<State>>,
    work: State,
}

impl StoreTransaction for InMemoryTransaction {
    async fn append_log(&mut self, entry: NewLogEntry) -> Result<LogEntry, HomewatchError> {
        self.work.next_log += 1;
        let entry = entry.into_entry(LogEntryId::new(self.work.next_log));
        self.work.logs.push(entry.clone());
        Ok(entry)
    }

    async fn recent_logs(&mut self, limit: usize) -> Result<Vec<LogEntry>, HomewatchError> {
        let mut logs = self.work.logs.clone();
        logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        logs.truncate(limit);
        Ok(logs)
    }

    async fn insert_value(&mut self, reading: &ValueReading) -> Result<bool, HomewatchError> {
        let exists = self
            .work
            .values
            .iter()
            .any(|v| v.device_id == reading.device_id && v.timestamp == reading.timestamp);
        if exists {
            return Ok(false);
        }
        self.work.values.push(reading.clone());
        Ok(true)
    }

    async fn current_value(
        &mut self,
        device_id: &str,
    ) -> Result<Option<ValueReading>, HomewatchError> {
        Ok(self
            .work
            .values
            .iter()
            .filter(|v| v.device_id == device_id)
            .max_by_key(|v| v.timestamp)
            .cloned())
    }

    async fn current_values(&mut self) -> Result<Vec<ValueReading>, HomewatchError> {
        let mut devices: Vec<&str> = self.work.values.iter().map(|v| v.device_id.as_str()).collect();
        devices.sort_unstable();
        devices.dedup();
        let current = devices
            .into_iter()
            .filter_map(|device| {
                self.work
                    .values
                    .iter()
                    .filter(|v| v.device_id == device)
                    .max_by_key(|v| v.timestamp)
                    .cloned()
            })
            .collect();
        Ok(current)
    }

    async fn upsert_alarm(&mut self, alarm: NewAlarm) -> Result<Alarm, HomewatchError> {
        if let Some(existing) = self
            .work
            .alarms
            .iter_mut()
            .find(|a| a.has_key(&alarm.device_id, &alarm.alarm_type))
        {
            existing.overwrite_with(alarm);
            return Ok(existing.clone());
        }
        self.work.next_alarm += 1;
        let alarm = alarm.into_alarm(AlarmId::new(self.work.next_alarm));
        self.work.alarms.push(alarm.clone());
        Ok(alarm)
    }

    async fn acknowledge_alarm(&mut self, id: AlarmId) -> Result<bool, HomewatchError> {
        match self.work.alarms.iter_mut().find(|a| a.id == id) {
            Some(alarm) => {
                alarm.acknowledged = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn alarms(&mut self, limit: usize) -> Result<Vec<Alarm>, HomewatchError> {
        let mut alarms = self.work.alarms.clone();
        alarms.sort_by(Alarm::snapshot_order);
        alarms.truncate(limit);
        Ok(alarms)
    }

    async fn commit(self) -> Result<(), HomewatchError> {
        *self.shared.lock().unwrap() = self.work;
        Ok(())
    }
}

/// Snapshot source returning an empty snapshot of the right shape.
pub struct StaticSnapshots;

#[async_trait]
impl SnapshotSource for StaticSnapshots {
    async fn snapshot(&self, topic: Topic) -> Result<Snapshot, HomewatchError> {
        Ok(match topic {
            Topic::Protocol => Snapshot::Entries { entries: vec![] },
            Topic::Dashboard => Snapshot::Values { values: vec![] },
            Topic::Alarm => Snapshot::Alarms { alarms: vec![] },
        })
    }
}

/// Snapshot source that always fails.
pub struct FailingSnapshots;

#[async_trait]
impl SnapshotSource for FailingSnapshots {
    async fn snapshot(&self, _topic: Topic) -> Result<Snapshot, HomewatchError> {
        Err(HomewatchError::Storage("snapshot unavailable".into()))
    }
}

/// How a [`RecordingPlugin`] behaves once it has recorded an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    Succeed,
    Fail,
    Panic,
}

/// Plugin recording every event type it is triggered with.
pub struct RecordingPlugin {
    name: String,
    accepts: Vec<EventType>,
    behaviour: Behaviour,
    seen: Mutex<Vec<EventType>>,
    calls: AtomicUsize,
}

impl RecordingPlugin {
    pub fn new(name: &str, accepts: &[EventType], behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            accepts: accepts.to_vec(),
            behaviour,
            seen: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn seen(&self) -> Vec<EventType> {
        self.seen.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Plugin for RecordingPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_handle(&self, event_type: EventType) -> bool {
        self.accepts.contains(&event_type)
    }

    async fn trigger(&self, event: &Event) -> Result<(), HomewatchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(event.event_type);
        match self.behaviour {
            Behaviour::Succeed => Ok(()),
            Behaviour::Fail => Err(HomewatchError::Plugin {
                plugin: self.name.clone(),
                message: "boom".to_string(),
            }),
            Behaviour::Panic => panic!("plugin {} exploded", self.name),
        }
    }
}

/// Take every event currently buffered on the bus.
pub fn drain(receiver: &mut EventReceiver) -> Vec<Event> {
    std::iter::from_fn(|| receiver.try_dequeue()).collect()
}
