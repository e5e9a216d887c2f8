use thiserror::Error;

use crate::hal::DeviceId;

/// Errors surfaced by the device core, the extension router and the codec
/// negotiator. Nothing here crosses the hardware boundary as a panic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PalError {
    #[error("sample rate {0} not supported")]
    SampleRateNotSupported(u32),
    #[error("channel count {0} not supported")]
    ChannelsNotSupported(u32),
    #[error("bit width {0} not supported")]
    BitWidthNotSupported(u32),
    #[error("bitrate {requested} outside supported range [{min}, {max}]")]
    BitrateOutOfRange { requested: i32, min: i32, max: i32 },

    #[error("hardware mixer unavailable")]
    MixerUnavailable,
    #[error("mixer control '{0}' not found")]
    ControlNotFound(String),
    #[error("resource manager no longer available")]
    ResourceManagerGone,

    #[error("operation not allowed in state {0}")]
    InvalidState(String),
    #[error("feature '{0}' is disabled")]
    FeatureDisabled(&'static str),

    #[error("failed to construct device {device:?}: {reason}")]
    Construction { device: DeviceId, reason: String },
    #[error("invalid parameter: {0}")]
    InvalidParam(String),
    #[error("no device instance for {0:?}")]
    UnknownDevice(DeviceId),
}

impl PalError {
    /// True for the "unsupported configuration" family; callers may retry
    /// with different parameters.
    pub fn is_not_supported(&self) -> bool {
        matches!(
            self,
            Self::SampleRateNotSupported(_)
                | Self::ChannelsNotSupported(_)
                | Self::BitWidthNotSupported(_)
                | Self::BitrateOutOfRange { .. }
        )
    }

    /// True when a hardware resource (mixer, control) is missing.
    pub fn is_resource_unavailable(&self) -> bool {
        matches!(
            self,
            Self::MixerUnavailable | Self::ControlNotFound(_) | Self::ResourceManagerGone
        )
    }
}

pub type PalResult<T> = std::result::Result<T, PalError>;
