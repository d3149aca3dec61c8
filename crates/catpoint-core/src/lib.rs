//! # Catpoint Core
//!
//! Alarm engine for a home security controller. Tracks the arming mode,
//! sensor activity and camera-based cat detection, and derives the alarm
//! status from their combination.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        CATPOINT CORE                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │   arming / sensor / image events                                │
//! │                    │                                            │
//! │                    ▼                                            │
//! │           ┌─────────────────┐                                   │
//! │           │ SecurityService │  ← the only writer of status      │
//! │           └────────┬────────┘                                   │
//! │                    │                                            │
//! │      ┌─────────────┼──────────────────┐                         │
//! │      ▼             ▼                  ▼                         │
//! │ ┌──────────┐ ┌──────────────┐ ┌──────────────────┐              │
//! │ │ Security │ │ ImageService │ │ ListenerRegistry │              │
//! │ │Repository│ │ (cat y/n)    │ │ (StatusEvent)    │              │
//! │ └──────────┘ └──────────────┘ └──────────────────┘              │
//! │                                                                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use catpoint_core::{
//!     AlarmStatus, ArmingStatus, CameraImage, MemoryRepository, SecurityService,
//!     StaticImageService,
//! };
//!
//! let mut service = SecurityService::new(MemoryRepository::new(), StaticImageService::new(true));
//!
//! service.set_arming_status(ArmingStatus::ArmedHome)?;
//! service.process_image(&CameraImage::new(vec![0xFF, 0xD8]))?;
//!
//! assert_eq!(service.alarm_status(), AlarmStatus::Alarm);
//! # Ok::<(), catpoint_core::CatpointError>(())
//! ```
//!
//! ## Notes
//!
//! - Every operation runs to completion, including repository writes and
//!   listener notifications, before returning
//! - Collaborator failures are propagated, never retried or swallowed
//! - Only disarming, or clean images with quiet sensors, clear `ALARM`

mod config;
mod error;
mod image;
mod listener;
mod service;

pub use config::{CatpointConfig, DetectorConfig, DetectorKind, StorageConfig};
pub use error::CatpointError;
pub use image::{CameraImage, FakeImageService, ImageError, ImageService, StaticImageService};
pub use listener::{ListenerRegistry, StatusEvent, StatusListener};
pub use service::{SecurityService, CAT_CONFIDENCE_THRESHOLD};

// Re-export registry types for convenience
pub use catpoint_registry::{
    AlarmStatus, ArmingStatus, MemoryRepository, PersistentRepository, SecurityRepository,
    Sensor, SensorType,
};

/// Core result type for alarm engine operations.
pub type Result<T> = std::result::Result<T, CatpointError>;

#[cfg(test)]
mod tests;
