//! Scoped ownership of camera and encoder handles

use std::ops::{Deref, DerefMut};

use super::{CameraDevice, VideoEncoder};
use crate::errors::CaptureError;
use crate::types::CameraFacing;

/// Owns an open camera; stops the preview and releases the device on drop
pub struct CameraGuard {
    device: Box<dyn CameraDevice>,
    unlocked: bool,
}

impl CameraGuard {
    pub fn new(device: Box<dyn CameraDevice>) -> Self {
        Self {
            device,
            unlocked: false,
        }
    }

    pub fn facing(&self) -> CameraFacing {
        self.device.facing()
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    pub fn unlock(&mut self) -> Result<(), CaptureError> {
        if !self.unlocked {
            self.device.unlock()?;
            self.unlocked = true;
        }
        Ok(())
    }

    pub fn lock(&mut self) -> Result<(), CaptureError> {
        if self.unlocked {
            self.device.lock()?;
            self.unlocked = false;
        }
        Ok(())
    }
}

impl Deref for CameraGuard {
    type Target = dyn CameraDevice;

    fn deref(&self) -> &Self::Target {
        self.device.as_ref()
    }
}

impl DerefMut for CameraGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.device.as_mut()
    }
}

impl Drop for CameraGuard {
    fn drop(&mut self) {
        log::debug!("Releasing {} camera", self.device.facing());
        self.device.stop_preview();
        self.device.release();
    }
}

/// Owns an encoder; resets and releases it on drop
pub struct EncoderGuard {
    encoder: Box<dyn VideoEncoder>,
}

impl EncoderGuard {
    pub fn new(encoder: Box<dyn VideoEncoder>) -> Self {
        Self { encoder }
    }
}

impl Deref for EncoderGuard {
    type Target = dyn VideoEncoder;

    fn deref(&self) -> &Self::Target {
        self.encoder.as_ref()
    }
}

impl DerefMut for EncoderGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.encoder.as_mut()
    }
}

impl Drop for EncoderGuard {
    fn drop(&mut self) {
        log::debug!("Releasing encoder");
        self.encoder.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SyntheticBackend;
    use crate::platform::MediaBackend;

    #[test]
    fn test_camera_released_on_drop() {
        let mut backend = SyntheticBackend::new();
        let tally = backend.tally();
        {
            let mut guard = CameraGuard::new(backend.open_camera(CameraFacing::Back).unwrap());
            guard.unlock().unwrap();
            assert!(guard.is_unlocked());
            assert_eq!(tally.cameras_open(), 1);
        }
        assert_eq!(tally.cameras_open(), 0);
        assert_eq!(tally.camera_releases(), 1);
    }

    #[test]
    fn test_unlock_is_idempotent() {
        let mut backend = SyntheticBackend::new();
        let tally = backend.tally();
        let mut guard = CameraGuard::new(backend.open_camera(CameraFacing::Front).unwrap());
        guard.unlock().unwrap();
        guard.unlock().unwrap();
        assert_eq!(tally.unlocks(), 1);
        guard.lock().unwrap();
        guard.lock().unwrap();
        assert!(!guard.is_unlocked());
    }

    #[test]
    fn test_encoder_released_on_drop() {
        let mut backend = SyntheticBackend::new();
        let tally = backend.tally();
        drop(EncoderGuard::new(backend.create_encoder().unwrap()));
        assert_eq!(tally.encoders_live(), 0);
        assert_eq!(tally.encoder_releases(), 1);
    }
}
