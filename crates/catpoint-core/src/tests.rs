//! Unit tests for catpoint-core.

#[test]
fn test_crate_structure() {
    // Smoke test - verifies the public surface is wired together
    use crate::{
        CatpointConfig, MemoryRepository, SecurityService, StaticImageService, StatusEvent,
        CAT_CONFIDENCE_THRESHOLD,
    };

    let _config = CatpointConfig::default();
    let service = SecurityService::new(MemoryRepository::new(), StaticImageService::new(false));
    let _event = StatusEvent::SensorStatusChanged;

    assert!(!service.is_cat_detected());
    assert_eq!(CAT_CONFIDENCE_THRESHOLD, 70.0);
}

#[test]
fn test_service_from_config() {
    use crate::{CatpointConfig, DetectorKind, MemoryRepository, SecurityService};

    let mut config = CatpointConfig::default();
    config.detector.kind = DetectorKind::Never;

    let mut service = SecurityService::new(MemoryRepository::new(), config.detector.build());
    let detected = service
        .process_image(&crate::CameraImage::new(vec![1]))
        .unwrap();

    assert!(!detected);
}
