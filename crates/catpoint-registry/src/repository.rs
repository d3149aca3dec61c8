//! # Security Repository
//!
//! The [`SecurityRepository`] trait is the durable store the alarm engine
//! reads from and writes through. It owns the sensor set, the alarm status
//! and the arming status; it makes no decisions about them.
//!
//! Two implementations are provided:
//!
//! | Type | Backing | Use |
//! |------|---------|-----|
//! | [`MemoryRepository`] | process memory | tests, throwaway sessions |
//! | [`PersistentRepository`] | [`Storage`] (Sled) | surviving restarts |
//!
//! Reads are served from memory in both cases and never fail. Writes
//! return a [`Result`] so storage failures reach the caller unchanged.

use crate::models::{AlarmStatus, ArmingStatus, RegistryError, Result, Sensor};
use crate::storage::{Storage, ALARM_STATUS_KEY, ARMING_STATUS_KEY};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};
use uuid::Uuid;

/// Storage contract consumed by the alarm engine.
///
/// Sensor identity is the sensor's UUID: adding or updating a sensor whose
/// identifier is already present replaces that entry, so the set never
/// holds two sensors with the same identifier.
pub trait SecurityRepository: Send {
    /// Adds a sensor, replacing any sensor with the same identifier.
    fn add_sensor(&mut self, sensor: &Sensor) -> Result<()>;

    /// Removes the sensor with the same identifier, if present.
    fn remove_sensor(&mut self, sensor: &Sensor) -> Result<()>;

    /// Replaces the entry whose identifier matches, otherwise inserts.
    fn update_sensor(&mut self, sensor: &Sensor) -> Result<()>;

    /// Clears the sensor set and loads `sensors` in a single write.
    fn reload_all_sensors(&mut self, sensors: &[Sensor]) -> Result<()>;

    /// Snapshot of all sensors in display order.
    fn sensors(&self) -> Vec<Sensor>;

    /// Persists the alarm status.
    fn set_alarm_status(&mut self, status: AlarmStatus) -> Result<()>;

    /// Current alarm status.
    fn alarm_status(&self) -> AlarmStatus;

    /// Persists the arming status.
    fn set_arming_status(&mut self, status: ArmingStatus) -> Result<()>;

    /// Current arming status.
    fn arming_status(&self) -> ArmingStatus;

    /// Makes pending writes durable. Repositories without a disk do nothing.
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

impl<T: SecurityRepository + ?Sized> SecurityRepository for Box<T> {
    fn add_sensor(&mut self, sensor: &Sensor) -> Result<()> {
        (**self).add_sensor(sensor)
    }

    fn remove_sensor(&mut self, sensor: &Sensor) -> Result<()> {
        (**self).remove_sensor(sensor)
    }

    fn update_sensor(&mut self, sensor: &Sensor) -> Result<()> {
        (**self).update_sensor(sensor)
    }

    fn reload_all_sensors(&mut self, sensors: &[Sensor]) -> Result<()> {
        (**self).reload_all_sensors(sensors)
    }

    fn sensors(&self) -> Vec<Sensor> {
        (**self).sensors()
    }

    fn set_alarm_status(&mut self, status: AlarmStatus) -> Result<()> {
        (**self).set_alarm_status(status)
    }

    fn alarm_status(&self) -> AlarmStatus {
        (**self).alarm_status()
    }

    fn set_arming_status(&mut self, status: ArmingStatus) -> Result<()> {
        (**self).set_arming_status(status)
    }

    fn arming_status(&self) -> ArmingStatus {
        (**self).arming_status()
    }

    fn flush(&self) -> Result<()> {
        (**self).flush()
    }
}

/// In-memory sensor set keyed by identifier.
#[derive(Debug, Clone, Default)]
struct SensorSet {
    sensors: HashMap<Uuid, Sensor>,
}

impl SensorSet {
    fn upsert(&mut self, sensor: &Sensor) {
        self.sensors.insert(sensor.id(), sensor.clone());
    }

    fn remove(&mut self, id: Uuid) -> bool {
        self.sensors.remove(&id).is_some()
    }

    fn replace_all(&mut self, sensors: &[Sensor]) {
        self.sensors.clear();
        for sensor in sensors {
            self.upsert(sensor);
        }
    }

    fn sorted(&self) -> Vec<Sensor> {
        let mut sensors: Vec<Sensor> = self.sensors.values().cloned().collect();
        sensors.sort();
        sensors
    }
}

/// Repository that keeps everything in process memory.
///
/// Starts at `NO_ALARM` / `DISARMED` with no sensors. Writes never fail.
///
/// # Example
///
/// ```rust
/// use catpoint_registry::{MemoryRepository, SecurityRepository, Sensor, SensorType};
///
/// let mut repo = MemoryRepository::new();
/// repo.add_sensor(&Sensor::new("Front door", SensorType::Door)).unwrap();
/// assert_eq!(repo.sensors().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    sensors: SensorSet,
    alarm_status: AlarmStatus,
    arming_status: ArmingStatus,
}

impl MemoryRepository {
    /// Creates an empty repository with default statuses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository preloaded with the given state.
    pub fn with_state(
        sensors: &[Sensor],
        alarm_status: AlarmStatus,
        arming_status: ArmingStatus,
    ) -> Self {
        let mut set = SensorSet::default();
        set.replace_all(sensors);
        Self {
            sensors: set,
            alarm_status,
            arming_status,
        }
    }
}

impl SecurityRepository for MemoryRepository {
    fn add_sensor(&mut self, sensor: &Sensor) -> Result<()> {
        self.sensors.upsert(sensor);
        Ok(())
    }

    fn remove_sensor(&mut self, sensor: &Sensor) -> Result<()> {
        self.sensors.remove(sensor.id());
        Ok(())
    }

    fn update_sensor(&mut self, sensor: &Sensor) -> Result<()> {
        self.sensors.upsert(sensor);
        Ok(())
    }

    fn reload_all_sensors(&mut self, sensors: &[Sensor]) -> Result<()> {
        self.sensors.replace_all(sensors);
        Ok(())
    }

    fn sensors(&self) -> Vec<Sensor> {
        self.sensors.sorted()
    }

    fn set_alarm_status(&mut self, status: AlarmStatus) -> Result<()> {
        self.alarm_status = status;
        Ok(())
    }

    fn alarm_status(&self) -> AlarmStatus {
        self.alarm_status
    }

    fn set_arming_status(&mut self, status: ArmingStatus) -> Result<()> {
        self.arming_status = status;
        Ok(())
    }

    fn arming_status(&self) -> ArmingStatus {
        self.arming_status
    }
}

/// Repository backed by a Sled database.
///
/// The working set lives in memory and every change is written through to
/// [`Storage`] before the in-memory copy is updated, so a failed write
/// leaves both sides unchanged.
///
/// # Loading
///
/// Missing values fall back to `NO_ALARM`, `DISARMED` and an empty sensor
/// set. A stored status name that does not parse, or a sensor record that
/// does not decode, is logged and replaced by the default.
pub struct PersistentRepository {
    storage: Storage,
    sensors: SensorSet,
    alarm_status: AlarmStatus,
    arming_status: ArmingStatus,
}

impl PersistentRepository {
    /// Opens or creates the database at `path` and loads its state.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Database` if the database cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load(Storage::open(path)?)
    }

    /// Creates a repository over a temporary database.
    pub fn temporary() -> Result<Self> {
        Self::load(Storage::temporary()?)
    }

    /// Loads the repository state from an already opened storage.
    pub fn load(storage: Storage) -> Result<Self> {
        let mut sensors = SensorSet::default();
        for record in storage.sensor_records()? {
            match serde_json::from_slice::<Sensor>(&record) {
                Ok(sensor) => sensors.upsert(&sensor),
                Err(e) => warn!("Skipping unreadable sensor record: {}", e),
            }
        }

        let alarm_status = load_status(&storage, ALARM_STATUS_KEY)?;
        let arming_status = load_status(&storage, ARMING_STATUS_KEY)?;

        debug!(
            "Loaded {} sensors, alarm {}, arming {}",
            sensors.sensors.len(),
            alarm_status,
            arming_status
        );

        Ok(Self {
            storage,
            sensors,
            alarm_status,
            arming_status,
        })
    }
}

fn load_status<T>(storage: &Storage, key: &str) -> Result<T>
where
    T: FromStr<Err = RegistryError> + Default + std::fmt::Display,
{
    let Some(raw) = storage.get_status(key)? else {
        return Ok(T::default());
    };

    match raw.parse::<T>() {
        Ok(status) => Ok(status),
        Err(e) => {
            let fallback = T::default();
            warn!("{} for key {}, using {}", e, key, fallback);
            Ok(fallback)
        }
    }
}

impl SecurityRepository for PersistentRepository {
    fn add_sensor(&mut self, sensor: &Sensor) -> Result<()> {
        self.storage.store_sensor(sensor)?;
        self.sensors.upsert(sensor);
        Ok(())
    }

    fn remove_sensor(&mut self, sensor: &Sensor) -> Result<()> {
        self.storage.remove_sensor(sensor.id())?;
        self.sensors.remove(sensor.id());
        Ok(())
    }

    fn update_sensor(&mut self, sensor: &Sensor) -> Result<()> {
        self.storage.store_sensor(sensor)?;
        self.sensors.upsert(sensor);
        Ok(())
    }

    fn reload_all_sensors(&mut self, sensors: &[Sensor]) -> Result<()> {
        self.storage.replace_sensors(sensors)?;
        self.sensors.replace_all(sensors);
        Ok(())
    }

    fn sensors(&self) -> Vec<Sensor> {
        self.sensors.sorted()
    }

    fn set_alarm_status(&mut self, status: AlarmStatus) -> Result<()> {
        self.storage.put_status(ALARM_STATUS_KEY, status.as_str())?;
        self.alarm_status = status;
        Ok(())
    }

    fn alarm_status(&self) -> AlarmStatus {
        self.alarm_status
    }

    fn set_arming_status(&mut self, status: ArmingStatus) -> Result<()> {
        self.storage.put_status(ARMING_STATUS_KEY, status.as_str())?;
        self.arming_status = status;
        Ok(())
    }

    fn arming_status(&self) -> ArmingStatus {
        self.arming_status
    }

    fn flush(&self) -> Result<()> {
        self.storage.flush()?;
        Ok(())
    }
}

impl std::fmt::Debug for PersistentRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentRepository")
            .field("sensor_count", &self.sensors.sensors.len())
            .field("alarm_status", &self.alarm_status)
            .field("arming_status", &self.arming_status)
            .finish()
    }
}
