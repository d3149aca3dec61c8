//! # Catpoint Registry - Sensors and System State
//!
//! The registry holds everything the alarm engine persists: the sensor set,
//! the alarm status and the arming status. It makes no decisions; the
//! engine in `catpoint-core` is the only writer.
//!
//! ## Architecture
//!
//! ```text
//!                 ┌──────────────────────┐
//!                 │  SecurityRepository  │  ← contract used by the engine
//!                 └──────────┬───────────┘
//!                            │
//!              ┌─────────────┴─────────────┐
//!              ▼                           ▼
//!     ┌──────────────────┐       ┌──────────────────────┐
//!     │ MemoryRepository │       │ PersistentRepository │
//!     └──────────────────┘       └──────────┬───────────┘
//!                                           ▼
//!                                ┌──────────────────────┐
//!                                │   Storage (Sled)     │
//!                                └──────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use catpoint_registry::{
//!     AlarmStatus, MemoryRepository, SecurityRepository, Sensor, SensorType,
//! };
//!
//! let mut repo = MemoryRepository::new();
//! let mut sensor = Sensor::new("Kitchen window", SensorType::Window);
//! repo.add_sensor(&sensor).unwrap();
//!
//! sensor.active = true;
//! repo.update_sensor(&sensor).unwrap();
//!
//! assert!(repo.sensors()[0].active);
//! assert_eq!(repo.alarm_status(), AlarmStatus::NoAlarm);
//! ```

pub mod models;
pub mod repository;
pub mod storage;

pub use models::{AlarmStatus, ArmingStatus, RegistryError, Result, Sensor, SensorType};
pub use repository::{MemoryRepository, PersistentRepository, SecurityRepository};
pub use storage::Storage;
