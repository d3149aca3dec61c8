//! The alarm engine.
//!
//! [`SecurityService`] receives arming changes, sensor activations and
//! camera images, decides how the alarm status moves, writes the result
//! through the repository and tells every listener.
//!
//! ## Alarm transitions
//!
//! | From | Event | To |
//! |------|-------|----|
//! | `NO_ALARM` | sensor inactive → active while armed | `PENDING_ALARM` |
//! | `PENDING_ALARM` | sensor inactive → active, or active sensor re-affirmed | `ALARM` |
//! | `PENDING_ALARM` | last active sensor → inactive | `NO_ALARM` |
//! | any | arming → `DISARMED` | `NO_ALARM` |
//! | any | cat seen while `ARMED_HOME` (on arming or on image) | `ALARM` |
//! | `ALARM` | any sensor change | `ALARM` |
//! | any | no cat seen and every sensor inactive | `NO_ALARM` |

use catpoint_registry::{AlarmStatus, ArmingStatus, SecurityRepository, Sensor};
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::error::CatpointError;
use crate::image::{CameraImage, ImageService};
use crate::listener::{ListenerRegistry, StatusEvent, StatusListener};
use crate::Result;

/// Minimum confidence, in percent, for an image label to count as a cat.
pub const CAT_CONFIDENCE_THRESHOLD: f32 = 70.0;

/// The home security alarm engine.
///
/// Owns the repository, the cat detector, the listeners and the transient
/// cat-detected flag. The flag is never persisted and is cleared whenever
/// the system is disarmed.
///
/// # Thread Safety
///
/// Every mutating operation takes `&mut self`, so a sensor's read-modify-write
/// and the alarm evaluation that goes with it cannot interleave. To drive one
/// engine from several threads, wrap it in a `Mutex`.
///
/// # Example
///
/// ```rust
/// use catpoint_core::{
///     AlarmStatus, ArmingStatus, MemoryRepository, SecurityService, Sensor, SensorType,
///     StaticImageService,
/// };
///
/// let mut service = SecurityService::new(MemoryRepository::new(), StaticImageService::new(false));
/// let mut door = Sensor::new("Front door", SensorType::Door);
/// service.add_sensor(&door)?;
///
/// service.set_arming_status(ArmingStatus::ArmedAway)?;
/// service.change_sensor_activation_status(&mut door, true)?;
///
/// assert_eq!(service.alarm_status(), AlarmStatus::PendingAlarm);
/// # Ok::<(), catpoint_core::CatpointError>(())
/// ```
pub struct SecurityService<R, I> {
    /// Durable store for sensors and statuses.
    repository: R,

    /// Cat detector.
    image_service: I,

    /// Subscribers to status changes.
    listeners: ListenerRegistry,

    /// Result of the most recent image analysis.
    cat_detected: bool,
}

impl<R, I> SecurityService<R, I>
where
    R: SecurityRepository,
    I: ImageService,
{
    /// Creates an engine over the given collaborators.
    ///
    /// The alarm and arming statuses are whatever the repository holds.
    pub fn new(repository: R, image_service: I) -> Self {
        info!(
            "Security service started: {} / {}",
            repository.arming_status(),
            repository.alarm_status()
        );

        Self {
            repository,
            image_service,
            listeners: ListenerRegistry::new(),
            cat_detected: false,
        }
    }

    /// Sets the arming status.
    ///
    /// - `DISARMED` forces `NO_ALARM` and clears the cat flag.
    /// - `ARMED_HOME` while a cat is visible forces `ALARM`.
    /// - Leaving or entering `DISARMED` resets every sensor to inactive.
    ///
    /// The alarm status, the sensor reset and the arming status are written
    /// in that order, arming last. If any write fails the earlier ones are
    /// rolled back, nothing is announced and the cat flag is kept.
    pub fn set_arming_status(&mut self, arming_status: ArmingStatus) -> Result<()> {
        let previous = self.repository.arming_status();
        let previous_alarm = self.repository.alarm_status();
        let previous_sensors = self.repository.sensors();

        let alarm = match arming_status {
            ArmingStatus::Disarmed => Some(AlarmStatus::NoAlarm),
            ArmingStatus::ArmedHome if self.cat_detected => {
                debug!("Arming home with a cat in view");
                Some(AlarmStatus::Alarm)
            }
            _ => None,
        };
        let reset = previous == ArmingStatus::Disarmed || arming_status == ArmingStatus::Disarmed;

        if let Err(e) = self.write_arming(arming_status, alarm, reset, &previous_sensors) {
            self.restore_arming(previous, previous_alarm, &previous_sensors);
            return Err(e);
        }

        if arming_status == ArmingStatus::Disarmed {
            self.cat_detected = false;
        }
        if let Some(status) = alarm {
            info!("Alarm status: {}", status);
            self.listeners.notify(StatusEvent::AlarmStatusChanged(status));
        }
        if reset {
            debug!("Reset {} sensors to inactive", previous_sensors.len());
            self.listeners.notify(StatusEvent::SensorStatusChanged);
        }
        info!("Arming status changed: {} -> {}", previous, arming_status);

        Ok(())
    }

    fn write_arming(
        &mut self,
        arming_status: ArmingStatus,
        alarm: Option<AlarmStatus>,
        reset: bool,
        sensors: &[Sensor],
    ) -> Result<()> {
        if let Some(status) = alarm {
            self.repository.set_alarm_status(status)?;
        }
        if reset {
            self.repository.reload_all_sensors(&all_inactive(sensors))?;
        }
        self.repository.set_arming_status(arming_status)?;
        Ok(())
    }

    fn restore_arming(&mut self, arming: ArmingStatus, alarm: AlarmStatus, sensors: &[Sensor]) {
        let restored = self
            .repository
            .set_alarm_status(alarm)
            .and_then(|()| self.repository.reload_all_sensors(sensors))
            .and_then(|()| self.repository.set_arming_status(arming));
        if let Err(e) = restored {
            error!("Rollback after failed arming change incomplete: {}", e);
        }
    }

    /// Marks every sensor inactive in one bulk write, then raises a single
    /// [`StatusEvent::SensorStatusChanged`].
    pub fn reset_sensors_to_inactive(&mut self) -> Result<()> {
        let sensors = all_inactive(&self.repository.sensors());

        self.repository.reload_all_sensors(&sensors)?;
        debug!("Reset {} sensors to inactive", sensors.len());

        self.listeners.notify(StatusEvent::SensorStatusChanged);
        Ok(())
    }

    /// Changes a sensor's activation and updates the alarm status if needed.
    ///
    /// The resulting alarm status is decided from the sensor's current
    /// `active` flag before anything is written. The sensor is persisted
    /// first, then the alarm status; `sensor` itself is only updated once
    /// both writes succeed.
    ///
    /// While the alarm is sounding the sensor is still updated but the alarm
    /// status is not evaluated. Re-deactivating an inactive sensor does
    /// nothing at all.
    ///
    /// # Errors
    ///
    /// - `CatpointError::SensorNotFound` if the sensor is not registered.
    /// - `CatpointError::InvalidAlarmState` if an escalation starts from a
    ///   status the escalation table does not cover.
    ///
    /// In every error case the repository and `sensor` are left as they were.
    pub fn change_sensor_activation_status(
        &mut self,
        sensor: &mut Sensor,
        active: bool,
    ) -> Result<()> {
        let stored = self.sensor(sensor.id())?;

        let alarm = self.repository.alarm_status();
        let target = if alarm == AlarmStatus::Alarm {
            None
        } else {
            match (sensor.active, active) {
                (false, true) => self.escalation()?,
                (true, true) if alarm == AlarmStatus::PendingAlarm => self.escalation()?,
                (true, true) => None,
                (true, false)
                    if alarm == AlarmStatus::PendingAlarm
                        && self.is_every_other_sensor_inactive(sensor) =>
                {
                    Some(AlarmStatus::NoAlarm)
                }
                (true, false) => None,
                (false, false) => return Ok(()),
            }
        };

        let mut updated = sensor.clone();
        updated.active = active;
        self.repository.update_sensor(&updated)?;

        if let Some(status) = target {
            if let Err(e) = self.set_alarm_status(status) {
                if let Err(rollback) = self.repository.update_sensor(&stored) {
                    error!("Rollback of sensor '{}' failed: {}", sensor.name, rollback);
                }
                return Err(e);
            }
        }

        sensor.active = active;
        debug!("Sensor '{}' active={}", sensor.name, active);

        Ok(())
    }

    /// Looks up a sensor by identifier and changes its activation.
    ///
    /// Returns the updated sensor.
    pub fn change_sensor_activation_by_id(&mut self, id: Uuid, active: bool) -> Result<Sensor> {
        let mut sensor = self.sensor(id)?;
        self.change_sensor_activation_status(&mut sensor, active)?;
        Ok(sensor)
    }

    /// Analyses a camera image for cats and updates the alarm status.
    ///
    /// - Cat seen while `ARMED_HOME`: `ALARM`.
    /// - No cat and every sensor inactive: `NO_ALARM`.
    ///
    /// Listeners always receive the detection result. Returns it as well.
    pub fn process_image(&mut self, image: &CameraImage) -> Result<bool> {
        let cat_detected = self
            .image_service
            .image_contains_cat(image, CAT_CONFIDENCE_THRESHOLD)?;

        if cat_detected && self.repository.arming_status() == ArmingStatus::ArmedHome {
            self.set_alarm_status(AlarmStatus::Alarm)?;
        } else if !cat_detected && self.is_every_sensor_inactive() {
            self.set_alarm_status(AlarmStatus::NoAlarm)?;
        }
        self.cat_detected = cat_detected;

        info!("Image processed, cat detected: {}", cat_detected);
        self.listeners.notify(StatusEvent::CatDetected(cat_detected));

        Ok(cat_detected)
    }

    /// Writes the alarm status and notifies every listener.
    pub fn set_alarm_status(&mut self, status: AlarmStatus) -> Result<()> {
        self.repository.set_alarm_status(status)?;
        info!("Alarm status: {}", status);

        self.listeners.notify(StatusEvent::AlarmStatusChanged(status));
        Ok(())
    }

    /// Alarm status one step up from the current one, or `None` while
    /// disarmed.
    fn escalation(&self) -> Result<Option<AlarmStatus>> {
        if self.repository.arming_status() == ArmingStatus::Disarmed {
            return Ok(None);
        }

        match self.repository.alarm_status() {
            AlarmStatus::NoAlarm => Ok(Some(AlarmStatus::PendingAlarm)),
            AlarmStatus::PendingAlarm => Ok(Some(AlarmStatus::Alarm)),
            other => {
                error!("Escalation requested from {}", other);
                Err(CatpointError::InvalidAlarmState(other))
            }
        }
    }

    fn is_every_sensor_inactive(&self) -> bool {
        self.repository.sensors().iter().all(|s| !s.active)
    }

    fn is_every_other_sensor_inactive(&self, sensor: &Sensor) -> bool {
        self.repository
            .sensors()
            .iter()
            .filter(|s| s.id() != sensor.id())
            .all(|s| !s.active)
    }

    /// Subscribes a listener. Returns `false` if it was already subscribed.
    pub fn add_status_listener(&mut self, listener: Arc<dyn StatusListener>) -> bool {
        self.listeners.add(listener)
    }

    /// Subscribed listeners.
    pub fn listeners(&self) -> &[Arc<dyn StatusListener>] {
        self.listeners.listeners()
    }

    /// Registers a sensor.
    pub fn add_sensor(&mut self, sensor: &Sensor) -> Result<()> {
        self.repository.add_sensor(sensor)?;
        info!("Added sensor '{}' ({})", sensor.name, sensor.sensor_type);
        Ok(())
    }

    /// Unregisters a sensor.
    pub fn remove_sensor(&mut self, sensor: &Sensor) -> Result<()> {
        self.repository.remove_sensor(sensor)?;
        info!("Removed sensor '{}'", sensor.name);
        Ok(())
    }

    /// All sensors in display order.
    pub fn sensors(&self) -> Vec<Sensor> {
        self.repository.sensors()
    }

    /// The sensor with this identifier.
    pub fn sensor(&self, id: Uuid) -> Result<Sensor> {
        self.repository
            .sensors()
            .into_iter()
            .find(|s| s.id() == id)
            .ok_or(CatpointError::SensorNotFound(id))
    }

    /// Current arming status.
    pub fn arming_status(&self) -> ArmingStatus {
        self.repository.arming_status()
    }

    /// Current alarm status.
    pub fn alarm_status(&self) -> AlarmStatus {
        self.repository.alarm_status()
    }

    /// Result of the most recent image analysis since the last disarm.
    pub fn is_cat_detected(&self) -> bool {
        self.cat_detected
    }

    /// The underlying repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }
}

fn all_inactive(sensors: &[Sensor]) -> Vec<Sensor> {
    sensors
        .iter()
        .cloned()
        .map(|mut sensor| {
            sensor.active = false;
            sensor
        })
        .collect()
}

impl<R, I> std::fmt::Debug for SecurityService<R, I>
where
    R: SecurityRepository,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityService")
            .field("arming_status", &self.repository.arming_status())
            .field("alarm_status", &self.repository.alarm_status())
            .field("cat_detected", &self.cat_detected)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
