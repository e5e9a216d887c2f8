use std::any::Any;
use std::sync::Arc;

use super::capability::CapabilityTable;
use super::types::{
    DeviceAttributes, DeviceId, DeviceParam, DeviceState, DeviceVariant, ParamId, StreamHandle,
};
use crate::{PalError, PalResult};

/// A named, integer-valued hardware control
pub trait MixerControl: Send + Sync {
    fn name(&self) -> &str;

    fn set_value(&self, index: u32, value: i64) -> PalResult<()>;

    fn value(&self, index: u32) -> PalResult<i64>;
}

/// Hardware mixer handle shared by every device
pub trait Mixer: Send + Sync {
    /// Locate a control by name
    fn control(&self, name: &str) -> Option<Arc<dyn MixerControl>>;

    /// Enable a mixer path. Enabling a path writes its default control values.
    fn apply_path(&self, path: &str) -> PalResult<()>;

    /// Disable a previously applied mixer path
    fn reset_path(&self, path: &str) -> PalResult<()>;
}

/// External collaborator owning stream membership and the mixer handle.
pub trait ResourceManager: Send + Sync {
    /// Shared hardware mixer, or `MixerUnavailable`
    fn hw_mixer(&self) -> PalResult<Arc<dyn Mixer>>;

    /// Run `visit` over the streams currently bound to `device` while the
    /// stream-set lock is held, so membership cannot change underneath the
    /// caller. `visit` may call [`ResourceManager::hw_mixer`] but nothing that
    /// changes stream membership.
    fn with_active_streams(
        &self,
        device: DeviceId,
        visit: &mut dyn FnMut(&[StreamHandle]),
    ) -> PalResult<()>;
}

/// A live device instance. All methods take `&self`; implementations
/// serialize their own runtime state.
pub trait Device: Send + Sync {
    fn id(&self) -> DeviceId;

    fn variant(&self) -> DeviceVariant {
        DeviceVariant::Plain
    }

    /// Attribute block the device is configured with
    fn attributes(&self) -> DeviceAttributes;

    fn state(&self) -> DeviceState;

    fn capabilities(&self) -> &'static CapabilityTable {
        self.id().class().capabilities()
    }

    fn is_sample_rate_supported(&self, sample_rate: u32) -> PalResult<()> {
        self.capabilities().is_sample_rate_supported(sample_rate)
    }

    fn is_channel_count_supported(&self, channels: u32) -> PalResult<()> {
        self.capabilities().is_channel_count_supported(channels)
    }

    fn is_bit_width_supported(&self, bit_width: u32) -> PalResult<()> {
        self.capabilities().is_bit_width_supported(bit_width)
    }

    fn open(&self) -> PalResult<()>;

    fn start(&self) -> PalResult<()>;

    fn stop(&self) -> PalResult<()>;

    fn close(&self) -> PalResult<()>;

    fn set_parameter(&self, param: DeviceParam) -> PalResult<()> {
        Err(PalError::InvalidParam(format!(
            "{:?} not handled by {:?}",
            param.id(),
            self.id()
        )))
    }

    fn get_parameter(&self, id: ParamId) -> PalResult<DeviceParam> {
        Err(PalError::InvalidParam(format!(
            "{:?} not handled by {:?}",
            id,
            self.id()
        )))
    }

    fn is_device_ready(&self) -> bool {
        true
    }

    /// Access to the concrete device type
    fn as_any(&self) -> &dyn Any;
}
