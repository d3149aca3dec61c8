//! # Core Data Models for the Sensor Registry
//!
//! This module defines the entities the alarm engine reasons about: sensors,
//! the derived alarm status and the operator-selected arming status.
//!
//! ## Identity
//!
//! | Type | Identity | Ordering |
//! |------|----------|----------|
//! | [`Sensor`] | UUID only | name, then type, then id (display only) |
//! | [`AlarmStatus`] | variant | declaration order |
//! | [`ArmingStatus`] | variant | declaration order |
//!
//! Status values carry no display metadata here. Labels and colours belong to
//! whichever front end renders them.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Kind of monitored point. Declaration order is the display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SensorType {
    /// Door contact.
    Door,
    /// Window contact.
    Window,
    /// Motion detector.
    Motion,
}

impl SensorType {
    /// All sensor types in declaration order.
    pub const ALL: [SensorType; 3] = [SensorType::Door, SensorType::Window, SensorType::Motion];

    /// Stable upper-case name used for persistence and display.
    pub const fn as_str(self) -> &'static str {
        match self {
            SensorType::Door => "DOOR",
            SensorType::Window => "WINDOW",
            SensorType::Motion => "MOTION",
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorType {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        SensorType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RegistryError::UnknownSensorType(s.to_string()))
    }
}

/// Alarm state derived from sensor activity and cat detection.
///
/// The alarm engine is the only writer; the repository owns the value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmStatus {
    /// Nothing is wrong.
    #[default]
    NoAlarm,
    /// One sensor tripped while armed; a second event escalates.
    PendingAlarm,
    /// The alarm is sounding. Sensor changes leave it in place; disarming,
    /// or an image with no cat while every sensor is inactive, clears it.
    Alarm,
}

impl AlarmStatus {
    /// All alarm statuses in declaration order.
    pub const ALL: [AlarmStatus; 3] = [
        AlarmStatus::NoAlarm,
        AlarmStatus::PendingAlarm,
        AlarmStatus::Alarm,
    ];

    /// Stable upper-case name used for persistence and display.
    pub const fn as_str(self) -> &'static str {
        match self {
            AlarmStatus::NoAlarm => "NO_ALARM",
            AlarmStatus::PendingAlarm => "PENDING_ALARM",
            AlarmStatus::Alarm => "ALARM",
        }
    }
}

impl fmt::Display for AlarmStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlarmStatus {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        AlarmStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| RegistryError::UnknownStatus(s.to_string()))
    }
}

/// Operator-selected arming mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArmingStatus {
    /// Sensor activity never raises an alarm.
    #[default]
    Disarmed,
    /// Armed with occupants at home. A visible cat alarms immediately.
    ArmedHome,
    /// Armed with the house empty.
    ArmedAway,
}

impl ArmingStatus {
    /// All arming statuses in declaration order.
    pub const ALL: [ArmingStatus; 3] = [
        ArmingStatus::Disarmed,
        ArmingStatus::ArmedHome,
        ArmingStatus::ArmedAway,
    ];

    /// Stable upper-case name used for persistence and display.
    pub const fn as_str(self) -> &'static str {
        match self {
            ArmingStatus::Disarmed => "DISARMED",
            ArmingStatus::ArmedHome => "ARMED_HOME",
            ArmingStatus::ArmedAway => "ARMED_AWAY",
        }
    }

    /// Returns true for either armed mode.
    pub const fn is_armed(self) -> bool {
        !matches!(self, ArmingStatus::Disarmed)
    }
}

impl fmt::Display for ArmingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArmingStatus {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        ArmingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| RegistryError::UnknownStatus(s.to_string()))
    }
}

/// A monitored point with a binary active/inactive state.
///
/// Equality and hashing use the identifier only, so two snapshots of the
/// same sensor taken before and after a toggle compare equal. Ordering is a
/// total order for presentation: name, then [`SensorType`] declaration
/// order, then identifier.
///
/// # Example
///
/// ```rust
/// use catpoint_registry::{Sensor, SensorType};
///
/// let front = Sensor::new("Front door", SensorType::Door);
/// assert!(!front.active);
///
/// let mut toggled = front.clone();
/// toggled.active = true;
/// assert_eq!(front, toggled);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sensor {
    /// Immutable identifier assigned at creation.
    id: Uuid,

    /// Human-readable name.
    pub name: String,

    /// Kind of monitored point.
    pub sensor_type: SensorType,

    /// Whether the sensor is currently tripped.
    pub active: bool,
}

impl Sensor {
    /// Creates an inactive sensor with a freshly generated identifier.
    pub fn new(name: impl Into<String>, sensor_type: SensorType) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            sensor_type,
            active: false,
        }
    }

    /// The sensor's identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl PartialEq for Sensor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Sensor {}

impl Hash for Sensor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Sensor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Sensor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then(self.sensor_type.cmp(&other.sensor_type))
            .then(self.id.cmp(&other.id))
    }
}

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Failed to open, read or write the database.
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    /// Failed to serialize or deserialize a stored record.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored or supplied status name is not one of the known values.
    #[error("Unknown status: {0}")]
    UnknownStatus(String),

    /// A supplied sensor type name is not one of the known values.
    #[error("Unknown sensor type: {0}")]
    UnknownSensorType(String),
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_new_sensor_is_inactive_with_unique_id() {
        let a = Sensor::new("a", SensorType::Door);
        let b = Sensor::new("a", SensorType::Door);

        assert!(!a.active);
        assert_ne!(a.id(), b.id());
        assert_ne!(a, b);
    }

    #[test]
    fn test_equality_ignores_mutable_fields() {
        let sensor = Sensor::new("hall", SensorType::Motion);
        let mut changed = sensor.clone();
        changed.active = true;
        changed.name = "renamed".to_string();

        assert_eq!(sensor, changed);

        let mut set = HashSet::new();
        set.insert(sensor);
        assert!(!set.insert(changed));
    }

    #[test]
    fn test_display_ordering() {
        let window = Sensor::new("b", SensorType::Window);
        let door = Sensor::new("b", SensorType::Door);
        let first = Sensor::new("a", SensorType::Motion);

        let mut sensors = vec![window.clone(), door.clone(), first.clone()];
        sensors.sort();

        assert_eq!(sensors, vec![first, door, window]);
    }

    #[test]
    fn test_status_names_round_trip() {
        for status in AlarmStatus::ALL {
            assert_eq!(status.as_str().parse::<AlarmStatus>().unwrap(), status);
        }
        for status in ArmingStatus::ALL {
            assert_eq!(status.to_string().parse::<ArmingStatus>().unwrap(), status);
        }
        assert!(matches!(
            "armed_home".parse::<ArmingStatus>(),
            Err(RegistryError::UnknownStatus(_))
        ));
    }

    #[test]
    fn test_sensor_type_parse_is_case_insensitive() {
        assert_eq!("door".parse::<SensorType>().unwrap(), SensorType::Door);
        assert_eq!(" Motion ".parse::<SensorType>().unwrap(), SensorType::Motion);
        assert!("garage".parse::<SensorType>().is_err());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(AlarmStatus::default(), AlarmStatus::NoAlarm);
        assert_eq!(ArmingStatus::default(), ArmingStatus::Disarmed);
        assert!(!ArmingStatus::Disarmed.is_armed());
        assert!(ArmingStatus::ArmedAway.is_armed());
    }

    #[test]
    fn test_serialized_names_match_persisted_names() {
        let json = serde_json::to_string(&AlarmStatus::PendingAlarm).unwrap();
        assert_eq!(json, "\"PENDING_ALARM\"");

        let sensor = Sensor::new("porch", SensorType::Window);
        let json = serde_json::to_string(&sensor).unwrap();
        assert!(json.contains("\"WINDOW\""));
    }
}
