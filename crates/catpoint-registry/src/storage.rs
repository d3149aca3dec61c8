//! # Persistent Storage Layer
//!
//! This module provides a persistence layer using Sled, an embedded database.
//! It stores sensors and the two system statuses so the security system
//! comes back in the same state after a restart.
//!
//! ## Storage Structure
//!
//! The database uses two trees (namespaces):
//!
//! | Tree | Key | Value | Purpose |
//! |------|-----|-------|---------|
//! | `sensors` | 16-byte sensor UUID | JSON [`Sensor`] | Sensor set |
//! | `status` | `ALARM_STATUS` / `ARMING_STATUS` | status name | System state |
//!
//! Decoding is the caller's concern: [`Storage`] hands back raw records so the
//! repository can decide how to treat corrupt entries.
//!
//! ## References
//!
//! - Sled documentation: <https://sled.rs/>

use crate::models::{Result, Sensor};
use std::path::Path;
use uuid::Uuid;

/// Tree name for storing sensors.
const SENSOR_TREE: &str = "sensors";

/// Tree name for storing status values.
const STATUS_TREE: &str = "status";

/// Key of the persisted alarm status.
pub const ALARM_STATUS_KEY: &str = "ALARM_STATUS";

/// Key of the persisted arming status.
pub const ARMING_STATUS_KEY: &str = "ARMING_STATUS";

/// Wrapper around a Sled database for security system storage.
///
/// # Thread Safety
///
/// The underlying Sled database is thread-safe. Multiple threads can
/// read and write concurrently.
///
/// # Example
///
/// ```rust
/// use catpoint_registry::storage::Storage;
/// use catpoint_registry::{Sensor, SensorType};
///
/// let storage = Storage::temporary().unwrap();
/// let sensor = Sensor::new("Back door", SensorType::Door);
///
/// storage.store_sensor(&sensor).unwrap();
/// assert_eq!(storage.sensor_count(), 1);
/// ```
#[derive(Clone)]
pub struct Storage {
    /// The underlying Sled database.
    db: sled::Db,

    /// Tree for storing serialized sensors.
    sensors: sled::Tree,

    /// Tree for storing status names.
    status: sled::Tree,
}

impl Storage {
    /// Opens or creates a storage database at the given path.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Database` if:
    /// - The path is invalid
    /// - Permissions are insufficient
    /// - The database is corrupted or locked by another process
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Creates a temporary in-memory storage for testing.
    ///
    /// The database is lost when the `Storage` instance is dropped.
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self> {
        let sensors = db.open_tree(SENSOR_TREE)?;
        let status = db.open_tree(STATUS_TREE)?;

        Ok(Storage { db, sensors, status })
    }

    /// Inserts or replaces a sensor, keyed by its identifier.
    pub fn store_sensor(&self, sensor: &Sensor) -> Result<()> {
        let value = serde_json::to_vec(sensor)?;
        self.sensors.insert(sensor.id().as_bytes(), value)?;
        Ok(())
    }

    /// Removes a sensor.
    ///
    /// Returns `true` if the sensor was stored.
    pub fn remove_sensor(&self, id: Uuid) -> Result<bool> {
        Ok(self.sensors.remove(id.as_bytes())?.is_some())
    }

    /// Replaces the whole sensor tree in one atomic batch.
    pub fn replace_sensors(&self, sensors: &[Sensor]) -> Result<()> {
        let mut batch = sled::Batch::default();

        for entry in self.sensors.iter() {
            let (key, _) = entry?;
            batch.remove(key);
        }
        for sensor in sensors {
            batch.insert(&sensor.id().as_bytes()[..], serde_json::to_vec(sensor)?);
        }

        self.sensors.apply_batch(batch)?;
        Ok(())
    }

    /// Returns every stored sensor record as raw JSON bytes.
    pub fn sensor_records(&self) -> Result<Vec<Vec<u8>>> {
        let mut records = Vec::new();

        for entry in self.sensors.iter() {
            let (_, value) = entry?;
            records.push(value.to_vec());
        }

        Ok(records)
    }

    /// Stores a status name under the given key.
    pub fn put_status(&self, key: &str, value: &str) -> Result<()> {
        self.status.insert(key.as_bytes(), value.as_bytes())?;
        Ok(())
    }

    /// Loads a status name, if one was stored.
    ///
    /// A value that is not valid UTF-8 is returned lossily so the caller
    /// reports it as an unknown status rather than a database failure.
    pub fn get_status(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .status
            .get(key.as_bytes())?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// Returns the number of stored sensors.
    pub fn sensor_count(&self) -> usize {
        self.sensors.len()
    }

    /// Flushes all pending writes to disk.
    ///
    /// Returns the number of bytes flushed.
    pub fn flush(&self) -> Result<usize> {
        Ok(self.db.flush()?)
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("sensor_count", &self.sensor_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SensorType;

    #[test]
    fn test_temporary_storage_is_empty() {
        let storage = Storage::temporary().unwrap();
        assert_eq!(storage.sensor_count(), 0);
        assert!(storage.get_status(ALARM_STATUS_KEY).unwrap().is_none());
    }

    #[test]
    fn test_store_and_read_sensor() {
        let storage = Storage::temporary().unwrap();
        let sensor = Sensor::new("kitchen", SensorType::Window);

        storage.store_sensor(&sensor).unwrap();

        let records = storage.sensor_records().unwrap();
        assert_eq!(records.len(), 1);
        let loaded: Sensor = serde_json::from_slice(&records[0]).unwrap();
        assert_eq!(loaded, sensor);
        assert_eq!(loaded.name, "kitchen");
    }

    #[test]
    fn test_store_overwrites_same_id() {
        let storage = Storage::temporary().unwrap();
        let mut sensor = Sensor::new("garage", SensorType::Door);

        storage.store_sensor(&sensor).unwrap();
        sensor.active = true;
        storage.store_sensor(&sensor).unwrap();

        assert_eq!(storage.sensor_count(), 1);
        let loaded: Sensor = serde_json::from_slice(&storage.sensor_records().unwrap()[0]).unwrap();
        assert!(loaded.active);
    }

    #[test]
    fn test_remove_sensor() {
        let storage = Storage::temporary().unwrap();
        let sensor = Sensor::new("attic", SensorType::Motion);

        storage.store_sensor(&sensor).unwrap();
        assert!(storage.remove_sensor(sensor.id()).unwrap());
        assert!(!storage.remove_sensor(sensor.id()).unwrap());
        assert_eq!(storage.sensor_count(), 0);
    }

    #[test]
    fn test_replace_sensors_clears_previous_entries() {
        let storage = Storage::temporary().unwrap();
        storage.store_sensor(&Sensor::new("old-1", SensorType::Door)).unwrap();
        storage.store_sensor(&Sensor::new("old-2", SensorType::Door)).unwrap();

        let fresh = vec![Sensor::new("new", SensorType::Motion)];
        storage.replace_sensors(&fresh).unwrap();

        let records = storage.sensor_records().unwrap();
        assert_eq!(records.len(), 1);
        let loaded: Sensor = serde_json::from_slice(&records[0]).unwrap();
        assert_eq!(loaded.name, "new");
    }

    #[test]
    fn test_status_round_trip() {
        let storage = Storage::temporary().unwrap();

        storage.put_status(ARMING_STATUS_KEY, "ARMED_AWAY").unwrap();

        assert_eq!(
            storage.get_status(ARMING_STATUS_KEY).unwrap().as_deref(),
            Some("ARMED_AWAY")
        );
        assert!(storage.get_status(ALARM_STATUS_KEY).unwrap().is_none());
    }
}
