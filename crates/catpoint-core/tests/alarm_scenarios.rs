//! # Alarm Scenario Tests
//!
//! Multi-step sequences that exercise the alarm engine end to end against
//! an in-memory repository.
//!
//! ## Scenarios Covered
//!
//! 1. **Escalation**: first trip is pending, second trip alarms
//! 2. **De-escalation**: quiet sensors clear a pending alarm, never a full one
//! 3. **Cat Detection**: arming home with a cat in view
//! 4. **Disarm Recovery**: disarming always returns to a clean state

use catpoint_core::{
    AlarmStatus, ArmingStatus, CameraImage, ImageError, ImageService, MemoryRepository,
    SecurityService, Sensor, SensorType, StaticImageService, StatusEvent, StatusListener,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Answers from a queue, then `false`.
struct ScriptedCamera {
    answers: Mutex<VecDeque<bool>>,
}

impl ScriptedCamera {
    fn new(answers: &[bool]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().copied().collect()),
        }
    }
}

impl ImageService for ScriptedCamera {
    fn image_contains_cat(
        &self,
        _image: &CameraImage,
        _confidence_threshold: f32,
    ) -> Result<bool, ImageError> {
        Ok(self.answers.lock().unwrap().pop_front().unwrap_or(false))
    }
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<StatusEvent>>,
}

impl StatusListener for Recorder {
    fn handle(&self, event: &StatusEvent) {
        self.events.lock().unwrap().push(*event);
    }
}

fn frame() -> CameraImage {
    CameraImage::new(vec![0xFF, 0xD8, 0xFF])
}

fn armed_away_with(sensors: &[Sensor]) -> SecurityService<MemoryRepository, StaticImageService> {
    SecurityService::new(
        MemoryRepository::with_state(sensors, AlarmStatus::NoAlarm, ArmingStatus::ArmedAway),
        StaticImageService::new(false),
    )
}

// =============================================================================
// ESCALATION SCENARIOS
// =============================================================================

#[test]
fn test_scenario_two_trips_alarm_for_any_armed_mode() {
    for arming in [ArmingStatus::ArmedHome, ArmingStatus::ArmedAway] {
        for (first, second) in [(0, 1), (1, 0), (0, 2)] {
            let mut sensors = vec![
                Sensor::new("door", SensorType::Door),
                Sensor::new("window", SensorType::Window),
                Sensor::new("hall", SensorType::Motion),
            ];
            let mut service = SecurityService::new(
                MemoryRepository::with_state(&sensors, AlarmStatus::NoAlarm, arming),
                StaticImageService::new(false),
            );

            service
                .change_sensor_activation_status(&mut sensors[first], true)
                .unwrap();
            assert_eq!(service.alarm_status(), AlarmStatus::PendingAlarm);

            service
                .change_sensor_activation_status(&mut sensors[second], true)
                .unwrap();
            assert_eq!(service.alarm_status(), AlarmStatus::Alarm);
        }
    }
}

#[test]
fn test_scenario_alarm_survives_all_sensors_going_quiet() {
    let mut a = Sensor::new("A", SensorType::Door);
    let mut b = Sensor::new("B", SensorType::Window);
    let mut service = armed_away_with(&[a.clone(), b.clone()]);

    service.change_sensor_activation_status(&mut a, true).unwrap();
    assert_eq!(service.alarm_status(), AlarmStatus::PendingAlarm);

    service.change_sensor_activation_status(&mut b, true).unwrap();
    assert_eq!(service.alarm_status(), AlarmStatus::Alarm);

    service.change_sensor_activation_status(&mut b, false).unwrap();
    assert_eq!(service.alarm_status(), AlarmStatus::Alarm);

    service.change_sensor_activation_status(&mut a, false).unwrap();
    assert_eq!(service.alarm_status(), AlarmStatus::Alarm);

    assert!(service.sensors().iter().all(|s| !s.active));
}

#[test]
fn test_scenario_sensor_flapping_while_pending() {
    let mut a = Sensor::new("A", SensorType::Door);
    let mut b = Sensor::new("B", SensorType::Door);
    let mut service = armed_away_with(&[a.clone(), b.clone()]);

    service.change_sensor_activation_status(&mut a, true).unwrap();
    service.change_sensor_activation_status(&mut a, false).unwrap();
    assert_eq!(service.alarm_status(), AlarmStatus::NoAlarm);

    service.change_sensor_activation_status(&mut b, true).unwrap();
    assert_eq!(service.alarm_status(), AlarmStatus::PendingAlarm);

    service.change_sensor_activation_status(&mut b, true).unwrap();
    assert_eq!(service.alarm_status(), AlarmStatus::Alarm);
}

// =============================================================================
// DE-ESCALATION SCENARIOS
// =============================================================================

#[test]
fn test_scenario_pending_clears_only_when_last_sensor_quiet() {
    let mut a = Sensor::new("A", SensorType::Door);
    let mut b = Sensor::new("B", SensorType::Door);
    a.active = true;
    b.active = true;
    let mut service = SecurityService::new(
        MemoryRepository::with_state(
            &[a.clone(), b.clone()],
            AlarmStatus::PendingAlarm,
            ArmingStatus::ArmedAway,
        ),
        StaticImageService::new(false),
    );

    service.change_sensor_activation_status(&mut a, false).unwrap();
    assert_eq!(service.alarm_status(), AlarmStatus::PendingAlarm);

    service.change_sensor_activation_status(&mut b, false).unwrap();
    assert_eq!(service.alarm_status(), AlarmStatus::NoAlarm);
}

// =============================================================================
// CAT DETECTION SCENARIOS
// =============================================================================

#[test]
fn test_scenario_cat_seen_then_arm_home() {
    let mut service = SecurityService::new(MemoryRepository::new(), ScriptedCamera::new(&[true]));
    let recorder = Arc::new(Recorder::default());
    service.add_status_listener(recorder.clone());

    assert!(service.process_image(&frame()).unwrap());
    assert_eq!(service.alarm_status(), AlarmStatus::NoAlarm);

    service.set_arming_status(ArmingStatus::ArmedHome).unwrap();
    assert_eq!(service.alarm_status(), AlarmStatus::Alarm);

    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            StatusEvent::CatDetected(true),
            StatusEvent::AlarmStatusChanged(AlarmStatus::Alarm),
            StatusEvent::SensorStatusChanged,
        ]
    );
}

#[test]
fn test_scenario_cat_leaves_frame_clears_alarm() {
    let mut service = SecurityService::new(
        MemoryRepository::with_state(
            &[Sensor::new("door", SensorType::Door)],
            AlarmStatus::NoAlarm,
            ArmingStatus::ArmedHome,
        ),
        ScriptedCamera::new(&[true, false]),
    );

    service.process_image(&frame()).unwrap();
    assert_eq!(service.alarm_status(), AlarmStatus::Alarm);

    service.process_image(&frame()).unwrap();
    assert_eq!(service.alarm_status(), AlarmStatus::NoAlarm);
    assert!(!service.is_cat_detected());
}

#[test]
fn test_scenario_cat_away_mode_then_switch_home() {
    let mut service = SecurityService::new(
        MemoryRepository::with_state(&[], AlarmStatus::NoAlarm, ArmingStatus::ArmedAway),
        ScriptedCamera::new(&[true]),
    );

    service.process_image(&frame()).unwrap();
    assert_eq!(service.alarm_status(), AlarmStatus::NoAlarm);

    service.set_arming_status(ArmingStatus::ArmedHome).unwrap();
    assert_eq!(service.alarm_status(), AlarmStatus::Alarm);
}

// =============================================================================
// DISARM RECOVERY SCENARIOS
// =============================================================================

#[test]
fn test_scenario_disarm_always_recovers() {
    for alarm in AlarmStatus::ALL {
        for arming in ArmingStatus::ALL {
            let mut sensors = vec![
                Sensor::new("A", SensorType::Door),
                Sensor::new("B", SensorType::Motion),
            ];
            sensors[0].active = true;
            let mut service = SecurityService::new(
                MemoryRepository::with_state(&sensors, alarm, arming),
                ScriptedCamera::new(&[true]),
            );
            service.process_image(&frame()).unwrap();

            service.set_arming_status(ArmingStatus::Disarmed).unwrap();

            assert_eq!(service.alarm_status(), AlarmStatus::NoAlarm);
            assert_eq!(service.arming_status(), ArmingStatus::Disarmed);
            assert!(!service.is_cat_detected());
            assert!(service.sensors().iter().all(|s| !s.active));
        }
    }
}

#[test]
fn test_scenario_rearm_after_disarm_starts_clean() {
    let mut a = Sensor::new("A", SensorType::Door);
    let mut service = armed_away_with(std::slice::from_ref(&a));

    service.change_sensor_activation_status(&mut a, true).unwrap();
    service.set_arming_status(ArmingStatus::Disarmed).unwrap();
    service.set_arming_status(ArmingStatus::ArmedAway).unwrap();

    let mut a = service.sensor(a.id()).unwrap();
    assert!(!a.active);

    service.change_sensor_activation_status(&mut a, true).unwrap();
    assert_eq!(service.alarm_status(), AlarmStatus::PendingAlarm);
}
