use std::sync::{Arc, Mutex, MutexGuard, Weak};

use super::traits::ResourceManager;
use super::types::{DeviceAttributes, DeviceId, DeviceState};
use crate::{PalError, PalResult};

/// Generic device lifecycle shared by every concrete device.
///
/// Holds the attribute block, the lifecycle state and a non-owning
/// reference to the resource manager.
pub struct DeviceCore {
    rm: Weak<dyn ResourceManager>,
    inner: Mutex<CoreState>,
}

struct CoreState {
    attrs: DeviceAttributes,
    state: DeviceState,
}

impl DeviceCore {
    /// Resolve `descriptor` against the class capability table. A descriptor
    /// the class cannot run with is a construction failure.
    pub fn new(descriptor: &DeviceAttributes, rm: Weak<dyn ResourceManager>) -> PalResult<Self> {
        let attrs = descriptor
            .id
            .class()
            .capabilities()
            .resolve(descriptor)
            .map_err(|e| PalError::Construction {
                device: descriptor.id,
                reason: e.to_string(),
            })?;

        Ok(Self {
            rm,
            inner: Mutex::new(CoreState {
                attrs,
                state: DeviceState::Unopened,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, CoreState> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn id(&self) -> DeviceId {
        self.lock().attrs.id
    }

    pub fn rm(&self) -> PalResult<Arc<dyn ResourceManager>> {
        self.rm.upgrade().ok_or(PalError::ResourceManagerGone)
    }

    pub fn attributes(&self) -> DeviceAttributes {
        self.lock().attrs
    }

    pub fn set_sample_rate(&self, sample_rate: u32) {
        self.lock().attrs.sample_rate = sample_rate;
    }

    pub fn state(&self) -> DeviceState {
        self.lock().state
    }

    /// Enable the device's mixer path. The path resets its controls to their
    /// defaults regardless of earlier sessions.
    pub fn open(&self) -> PalResult<()> {
        let mut inner = self.lock();
        if inner.state != DeviceState::Unopened && inner.state != DeviceState::Closed {
            return Err(PalError::InvalidState(inner.state.to_string()));
        }

        let path = inner.attrs.id.path_name();
        self.rm()?.hw_mixer()?.apply_path(path)?;
        log::debug!("opened {:?} on path {}", inner.attrs.id, path);

        inner.state = DeviceState::Opened;
        Ok(())
    }

    /// Starting a running device is a no-op; several streams share it.
    pub fn start(&self) -> PalResult<()> {
        let mut inner = self.lock();
        match inner.state {
            DeviceState::Running => Ok(()),
            DeviceState::Opened | DeviceState::Stopped => {
                inner.state = DeviceState::Running;
                log::debug!("started {:?}", inner.attrs.id);
                Ok(())
            }
            other => Err(PalError::InvalidState(other.to_string())),
        }
    }

    pub fn stop(&self) -> PalResult<()> {
        let mut inner = self.lock();
        if inner.state != DeviceState::Running {
            return Ok(()); // Already stopped
        }
        inner.state = DeviceState::Stopped;
        log::debug!("stopped {:?}", inner.attrs.id);
        Ok(())
    }

    pub fn close(&self) -> PalResult<()> {
        let mut inner = self.lock();
        if inner.state == DeviceState::Unopened || inner.state == DeviceState::Closed {
            return Ok(());
        }

        // Stopping is implicit; the path goes away either way.
        inner.state = DeviceState::Closed;
        let path = inner.attrs.id.path_name();
        if let Err(e) = self.rm().and_then(|rm| rm.hw_mixer()?.reset_path(path)) {
            log::error!("failed to reset path {}: {}", path, e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::mock::MockResourceManager;

    fn core(rm: &Arc<MockResourceManager>) -> DeviceCore {
        let rm: Arc<dyn ResourceManager> = rm.clone();
        DeviceCore::new(&DeviceAttributes::new(DeviceId::InFmTuner), Arc::downgrade(&rm)).unwrap()
    }

    #[test]
    fn test_full_lifecycle() {
        let rm = Arc::new(MockResourceManager::new());
        let core = core(&rm);

        assert_eq!(core.state(), DeviceState::Unopened);
        assert!(core.start().is_err());

        core.open().unwrap();
        assert!(rm.mixer().unwrap().is_path_enabled("fm-tuner"));

        core.start().unwrap();
        core.start().unwrap();
        assert_eq!(core.state(), DeviceState::Running);

        core.stop().unwrap();
        core.stop().unwrap();
        assert_eq!(core.state(), DeviceState::Stopped);

        core.start().unwrap();
        core.close().unwrap();
        assert_eq!(core.state(), DeviceState::Closed);
        assert!(!rm.mixer().unwrap().is_path_enabled("fm-tuner"));

        core.open().unwrap();
        assert_eq!(core.state(), DeviceState::Opened);
    }

    #[test]
    fn test_open_twice_rejected() {
        let rm = Arc::new(MockResourceManager::new());
        let core = core(&rm);

        core.open().unwrap();
        assert_eq!(
            core.open(),
            Err(PalError::InvalidState("Opened".to_string()))
        );
    }

    #[test]
    fn test_open_fails_without_mixer() {
        let rm = Arc::new(MockResourceManager::without_mixer());
        let core = core(&rm);

        assert_eq!(core.open(), Err(PalError::MixerUnavailable));
        assert_eq!(core.state(), DeviceState::Unopened);
    }

    #[test]
    fn test_resource_manager_is_not_owned() {
        let rm = Arc::new(MockResourceManager::new());
        let core = core(&rm);
        drop(rm);

        assert!(matches!(core.rm(), Err(PalError::ResourceManagerGone)));
    }

    #[test]
    fn test_construction_rejects_bad_descriptor() {
        let rm: Arc<dyn ResourceManager> = Arc::new(MockResourceManager::new());
        let descriptor = DeviceAttributes::with_config(DeviceId::OutHaptics, 44100, 1, 16);

        let result = DeviceCore::new(&descriptor, Arc::downgrade(&rm));
        assert!(matches!(result, Err(PalError::Construction { .. })));
    }
}
