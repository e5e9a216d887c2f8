use std::any::Any;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::config::FeatureFlags;
use crate::hal::interlock::{self, ApplyOutcome};
use crate::hal::lifecycle::DeviceCore;
use crate::hal::mixer;
use crate::hal::traits::{Device, ResourceManager};
use crate::hal::types::{
    DeviceAttributes, DeviceId, DeviceParam, DeviceState, DeviceVariant, HapticSource, ParamId,
};
use crate::{PalError, PalResult};

/// Mixer control selecting the haptics signal source
pub const HAPTICS_SOURCE_CTL: &str = "Haptics Source";

/// Feedback path enabled by the protected variant while running
pub const HAPTICS_PROTECTION_PATH: &str = "haptics-protection-vi";

/// Factory used by the registry: the protected variant when the actuator has
/// protection and is driven through a WSA amplifier, the plain one otherwise.
pub fn create(
    descriptor: &DeviceAttributes,
    rm: Weak<dyn ResourceManager>,
    flags: &FeatureFlags,
) -> PalResult<Arc<dyn Device>> {
    if flags.haptics_protected() {
        Ok(Arc::new(HapticsDevProtection::new(descriptor, rm)?))
    } else {
        Ok(Arc::new(HapticsDev::new(descriptor, rm)?))
    }
}

pub struct HapticsDev {
    core: DeviceCore,
    /// Last requested source; held across hardware writes so start and
    /// set_parameter never interleave.
    source: Mutex<HapticSource>,
}

impl HapticsDev {
    pub fn new(descriptor: &DeviceAttributes, rm: Weak<dyn ResourceManager>) -> PalResult<Self> {
        Ok(Self {
            core: DeviceCore::new(descriptor, rm)?,
            source: Mutex::new(HapticSource::default()),
        })
    }

    fn source(&self) -> MutexGuard<'_, HapticSource> {
        self.source
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn haptic_source(&self) -> HapticSource {
        *self.source()
    }

    fn write_source(rm: &dyn ResourceManager, source: HapticSource) -> PalResult<()> {
        mixer::set_control_value(rm, HAPTICS_SOURCE_CTL, source.value())
    }
}

impl Device for HapticsDev {
    fn id(&self) -> DeviceId {
        self.core.id()
    }

    fn attributes(&self) -> DeviceAttributes {
        self.core.attributes()
    }

    fn state(&self) -> DeviceState {
        self.core.state()
    }

    fn open(&self) -> PalResult<()> {
        self.core.open()
    }

    fn start(&self) -> PalResult<()> {
        let source = self.source();
        // Opening the path selects the default source, so a non-default
        // selection has to be written again.
        if *source != HapticSource::default() {
            match self.core.rm() {
                Ok(rm) => {
                    if let Err(e) = Self::write_source(rm.as_ref(), *source) {
                        log::error!("failed to restore haptics source {:?}: {}", *source, e);
                    }
                }
                Err(e) => log::error!("failed to restore haptics source: {}", e),
            }
        }
        self.core.start()
    }

    fn stop(&self) -> PalResult<()> {
        self.core.stop()
    }

    fn close(&self) -> PalResult<()> {
        self.core.close()
    }

    fn set_parameter(&self, param: DeviceParam) -> PalResult<()> {
        let DeviceParam::HapticSource(requested) = param else {
            return Err(PalError::InvalidParam(format!(
                "{:?} not handled by haptics",
                param.id()
            )));
        };

        let mut source = self.source();
        *source = requested;

        let rm = match self.core.rm() {
            Ok(rm) => rm,
            Err(e) => {
                log::error!("haptics source stored but not applied: {}", e);
                return Ok(());
            }
        };

        match interlock::apply_if_active(rm.as_ref(), self.id(), |rm| {
            Self::write_source(rm, requested)
        }) {
            ApplyOutcome::Applied => log::debug!("haptics source switched to {:?}", requested),
            ApplyOutcome::Deferred => {}
            ApplyOutcome::Failed(e) => log::error!("haptics source write failed: {}", e),
        }
        Ok(())
    }

    fn get_parameter(&self, id: ParamId) -> PalResult<DeviceParam> {
        match id {
            ParamId::HapticSource => Ok(DeviceParam::HapticSource(self.haptic_source())),
            other => Err(PalError::InvalidParam(format!(
                "{:?} not handled by haptics",
                other
            ))),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Haptics behind a smart amplifier with VI-sense protection. Runs the plain
/// haptics behavior plus the protection feedback path while started.
pub struct HapticsDevProtection {
    inner: HapticsDev,
}

impl HapticsDevProtection {
    pub fn new(descriptor: &DeviceAttributes, rm: Weak<dyn ResourceManager>) -> PalResult<Self> {
        Ok(Self {
            inner: HapticsDev::new(descriptor, rm)?,
        })
    }

    pub fn haptic_source(&self) -> HapticSource {
        self.inner.haptic_source()
    }
}

impl Device for HapticsDevProtection {
    fn id(&self) -> DeviceId {
        self.inner.id()
    }

    fn variant(&self) -> DeviceVariant {
        DeviceVariant::Protected
    }

    fn attributes(&self) -> DeviceAttributes {
        self.inner.attributes()
    }

    fn state(&self) -> DeviceState {
        self.inner.state()
    }

    fn open(&self) -> PalResult<()> {
        self.inner.open()
    }

    fn start(&self) -> PalResult<()> {
        let was_running = self.inner.state() == DeviceState::Running;
        self.inner.start()?;
        if was_running {
            return Ok(());
        }

        let enabled = self
            .inner
            .core
            .rm()
            .and_then(|rm| rm.hw_mixer()?.apply_path(HAPTICS_PROTECTION_PATH));
        if let Err(e) = enabled {
            log::error!("haptics protection path failed: {}", e);
            self.inner.stop()?;
            return Err(e);
        }
        Ok(())
    }

    fn stop(&self) -> PalResult<()> {
        if self.inner.state() == DeviceState::Running {
            let disabled = self
                .inner
                .core
                .rm()
                .and_then(|rm| rm.hw_mixer()?.reset_path(HAPTICS_PROTECTION_PATH));
            if let Err(e) = disabled {
                log::error!("failed to reset haptics protection path: {}", e);
            }
        }
        self.inner.stop()
    }

    fn close(&self) -> PalResult<()> {
        self.stop()?;
        self.inner.close()
    }

    fn set_parameter(&self, param: DeviceParam) -> PalResult<()> {
        self.inner.set_parameter(param)
    }

    fn get_parameter(&self, id: ParamId) -> PalResult<DeviceParam> {
        self.inner.get_parameter(id)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::mock::MockResourceManager;

    fn setup() -> (Arc<MockResourceManager>, HapticsDev) {
        let rm = Arc::new(MockResourceManager::new());
        let dyn_rm: Arc<dyn ResourceManager> = rm.clone();
        let dev = HapticsDev::new(
            &DeviceAttributes::new(DeviceId::OutHaptics),
            Arc::downgrade(&dyn_rm),
        )
        .unwrap();
        (rm, dev)
    }

    #[test]
    fn test_set_without_streams_stores_only() {
        let (rm, dev) = setup();

        dev.set_parameter(DeviceParam::HapticSource(HapticSource::A2h)).unwrap();

        assert_eq!(dev.haptic_source(), HapticSource::A2h);
        assert!(rm.mixer().unwrap().writes().is_empty());
    }

    #[test]
    fn test_set_with_stream_writes_once() {
        let (rm, dev) = setup();
        rm.attach_stream(DeviceId::OutHaptics);

        dev.set_parameter(DeviceParam::HapticSource(HapticSource::A2h)).unwrap();

        assert_eq!(
            rm.mixer().unwrap().writes_to(HAPTICS_SOURCE_CTL),
            vec![HapticSource::A2h.value()]
        );
    }

    #[test]
    fn test_start_restores_non_default_source() {
        let (rm, dev) = setup();
        dev.set_parameter(DeviceParam::HapticSource(HapticSource::A2h)).unwrap();

        dev.open().unwrap();
        let mixer = rm.mixer().unwrap();
        assert_eq!(mixer.control_value(HAPTICS_SOURCE_CTL), Some(0));

        dev.start().unwrap();
        assert_eq!(mixer.control_value(HAPTICS_SOURCE_CTL), Some(1));
        assert_eq!(dev.state(), DeviceState::Running);
    }

    #[test]
    fn test_start_with_default_source_skips_write() {
        let (rm, dev) = setup();

        dev.open().unwrap();
        dev.start().unwrap();

        assert!(rm.mixer().unwrap().writes().is_empty());
    }

    #[test]
    fn test_failed_write_keeps_requested_value() {
        let (rm, dev) = setup();
        rm.attach_stream(DeviceId::OutHaptics);
        rm.set_mixer(None);

        assert!(dev
            .set_parameter(DeviceParam::HapticSource(HapticSource::A2h))
            .is_ok());
        assert_eq!(
            dev.get_parameter(ParamId::HapticSource).unwrap(),
            DeviceParam::HapticSource(HapticSource::A2h)
        );
    }

    #[test]
    fn test_rejects_foreign_parameter() {
        let (_rm, dev) = setup();
        assert!(dev.set_parameter(DeviceParam::ScoOn(true)).is_err());
    }

    #[test]
    fn test_protected_variant_drives_feedback_path() {
        let rm = Arc::new(MockResourceManager::new());
        let dyn_rm: Arc<dyn ResourceManager> = rm.clone();
        let dev = HapticsDevProtection::new(
            &DeviceAttributes::new(DeviceId::OutHaptics),
            Arc::downgrade(&dyn_rm),
        )
        .unwrap();
        let mixer = rm.mixer().unwrap();

        dev.open().unwrap();
        dev.start().unwrap();
        assert!(mixer.is_path_enabled(HAPTICS_PROTECTION_PATH));

        dev.stop().unwrap();
        assert!(!mixer.is_path_enabled(HAPTICS_PROTECTION_PATH));
        assert_eq!(dev.variant(), DeviceVariant::Protected);
    }
}
