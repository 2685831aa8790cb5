#[cfg(test)]
mod error_tests {
    use crabclip::errors::CaptureError;
    use std::error::Error;

    #[test]
    fn test_camera_unavailable_display() {
        let error = CaptureError::CameraUnavailable("no front camera".to_string());
        assert_eq!(error.to_string(), "Camera unavailable: no front camera");
    }

    #[test]
    fn test_encoder_prepare_failed_display() {
        let error = CaptureError::EncoderPrepareFailed("bad profile".to_string());
        assert!(error.to_string().contains("Encoder prepare failed"));
        assert!(error.to_string().contains("bad profile"));
    }

    #[test]
    fn test_stop_race_is_only_benign_error() {
        let errors = vec![
            CaptureError::CameraUnavailable("a".to_string()),
            CaptureError::EncoderPrepareFailed("b".to_string()),
            CaptureError::StorageUnwritable("c".to_string()),
            CaptureError::InvalidState("d".to_string()),
            CaptureError::Config("e".to_string()),
        ];
        for error in &errors {
            assert!(!error.is_benign(), "{:?} should not be benign", error);
        }
        assert!(CaptureError::EncoderStopRace.is_benign());
    }

    #[test]
    fn test_already_recording_is_invalid_state() {
        assert!(matches!(
            CaptureError::already_recording(),
            CaptureError::InvalidState(_)
        ));
    }

    #[test]
    fn test_io_error_maps_to_storage() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let error: CaptureError = io.into();
        assert!(matches!(error, CaptureError::StorageUnwritable(ref m) if m.contains("read-only")));
    }

    #[test]
    fn test_capture_error_implements_error_trait() {
        let error = CaptureError::Config("Error trait test".to_string());
        let _error_trait: &dyn Error = &error;
        assert!(error.source().is_none());
    }

    #[test]
    fn test_error_serialization() {
        let json = serde_json::to_string(&CaptureError::EncoderStopRace).unwrap();
        assert_eq!(json, "\"EncoderStopRace\"");

        let json = serde_json::to_string(&CaptureError::StorageUnwritable("full".to_string())).unwrap();
        assert_eq!(json, r#"{"StorageUnwritable":"full"}"#);
    }
}
