pub mod capability;
pub mod devices;
pub mod interlock;
pub mod lifecycle;
pub mod mixer;
pub mod mock;
pub mod registry;
pub mod traits;
pub mod types;

pub use capability::CapabilityTable;
pub use interlock::{apply_if_active, ApplyOutcome};
pub use lifecycle::DeviceCore;
pub use registry::{DeviceFactory, DeviceRegistry};
pub use traits::{Device, Mixer, MixerControl, ResourceManager};
pub use types::{
    DeviceAttributes, DeviceClass, DeviceId, DeviceParam, DeviceState, DeviceVariant,
    HapticSource, ParamId, StreamHandle,
};
