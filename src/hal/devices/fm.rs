use std::any::Any;
use std::sync::{Arc, Weak};

use crate::config::FeatureFlags;
use crate::hal::lifecycle::DeviceCore;
use crate::hal::traits::{Device, ResourceManager};
use crate::hal::types::{DeviceAttributes, DeviceId, DeviceState};
use crate::PalResult;

pub fn create(
    descriptor: &DeviceAttributes,
    rm: Weak<dyn ResourceManager>,
    _flags: &FeatureFlags,
) -> PalResult<Arc<dyn Device>> {
    Ok(Arc::new(FmDevice::new(descriptor, rm)?))
}

/// FM tuner capture endpoint. No runtime parameters.
pub struct FmDevice {
    core: DeviceCore,
}

impl FmDevice {
    pub fn new(descriptor: &DeviceAttributes, rm: Weak<dyn ResourceManager>) -> PalResult<Self> {
        Ok(Self {
            core: DeviceCore::new(descriptor, rm)?,
        })
    }
}

impl Device for FmDevice {
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
        self.core.start()
    }

    fn stop(&self) -> PalResult<()> {
        self.core.stop()
    }

    fn close(&self) -> PalResult<()> {
        self.core.close()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
