//! Error types for Catpoint Core.

use catpoint_registry::{AlarmStatus, RegistryError};
use thiserror::Error;
use uuid::Uuid;

use crate::image::ImageError;

/// Core error type for alarm engine operations.
#[derive(Debug, Error)]
pub enum CatpointError {
    /// Repository error passthrough.
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Image analysis error passthrough.
    #[error("Image analysis error: {0}")]
    Image(#[from] ImageError),

    /// An escalation was evaluated from an alarm status it does not cover.
    ///
    /// This is an internal consistency defect, never an operator error.
    #[error("Unexpected alarm status during escalation: {0}")]
    InvalidAlarmState(AlarmStatus),

    /// No sensor with this identifier is registered.
    #[error("Sensor not found: {0}")]
    SensorNotFound(Uuid),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
