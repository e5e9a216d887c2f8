use serde::{Deserialize, Serialize};
use std::fmt;

/// Hardware endpoint identity. Each id owns at most one live device instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeviceId {
    OutHaptics,
    OutBluetoothA2dp,
    InBluetoothA2dp,
    OutBluetoothBle,
    InBluetoothBle,
    OutBluetoothBleBroadcast,
    OutBluetoothSco,
    InBluetoothScoHeadset,
    InFmTuner,
}

impl DeviceId {
    pub const ALL: [DeviceId; 9] = [
        DeviceId::OutHaptics,
        DeviceId::OutBluetoothA2dp,
        DeviceId::InBluetoothA2dp,
        DeviceId::OutBluetoothBle,
        DeviceId::InBluetoothBle,
        DeviceId::OutBluetoothBleBroadcast,
        DeviceId::OutBluetoothSco,
        DeviceId::InBluetoothScoHeadset,
        DeviceId::InFmTuner,
    ];

    pub fn class(&self) -> DeviceClass {
        match self {
            Self::OutHaptics => DeviceClass::Haptics,
            Self::OutBluetoothA2dp
            | Self::InBluetoothA2dp
            | Self::OutBluetoothBle
            | Self::InBluetoothBle
            | Self::OutBluetoothBleBroadcast => DeviceClass::A2dp,
            Self::OutBluetoothSco | Self::InBluetoothScoHeadset => DeviceClass::Sco,
            Self::InFmTuner => DeviceClass::Fm,
        }
    }

    pub fn is_output(&self) -> bool {
        matches!(
            self,
            Self::OutHaptics
                | Self::OutBluetoothA2dp
                | Self::OutBluetoothBle
                | Self::OutBluetoothBleBroadcast
                | Self::OutBluetoothSco
        )
    }

    /// Mixer path enabled when the device is opened
    pub fn path_name(&self) -> &'static str {
        match self {
            Self::OutHaptics => "haptics-dev",
            Self::OutBluetoothA2dp => "bt-a2dp",
            Self::InBluetoothA2dp => "bt-a2dp-capture",
            Self::OutBluetoothBle => "bt-ble",
            Self::InBluetoothBle => "bt-ble-capture",
            Self::OutBluetoothBleBroadcast => "bt-ble-broadcast",
            Self::OutBluetoothSco => "bt-sco",
            Self::InBluetoothScoHeadset => "bt-sco-mic",
            Self::InFmTuner => "fm-tuner",
        }
    }
}

/// Kind of endpoint; selects the capability table and the device factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceClass {
    Haptics,
    A2dp,
    Sco,
    Fm,
}

/// Device descriptor handed to the registry, and the attribute block a
/// device instance actually runs with.
///
/// A zero field means "use the class default".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceAttributes {
    pub id: DeviceId,
    pub sample_rate: u32,
    pub channels: u32,
    pub bit_width: u32,
}

impl DeviceAttributes {
    pub fn new(id: DeviceId) -> Self {
        Self {
            id,
            sample_rate: 0,
            channels: 0,
            bit_width: 0,
        }
    }

    pub fn with_config(id: DeviceId, sample_rate: u32, channels: u32, bit_width: u32) -> Self {
        Self {
            id,
            sample_rate,
            channels,
            bit_width,
        }
    }
}

/// Device lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceState {
    Unopened,
    Opened,
    Running,
    Stopped,
    Closed,
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unopened => "Unopened",
            Self::Opened => "Opened",
            Self::Running => "Running",
            Self::Stopped => "Stopped",
            Self::Closed => "Closed",
        };
        f.write_str(name)
    }
}

/// Which implementation backs a device instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceVariant {
    Plain,
    /// Hardware-protected implementation (e.g. haptics with VI feedback)
    Protected,
}

/// Signal source feeding the haptics actuator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HapticSource {
    /// Haptics generated by the DSP (selected by the default path)
    #[default]
    Ach = 0,
    /// Audio-to-haptics conversion
    A2h = 1,
}

impl HapticSource {
    pub fn value(self) -> i64 {
        self as i64
    }
}

impl TryFrom<i64> for HapticSource {
    type Error = crate::PalError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Ach),
            1 => Ok(Self::A2h),
            other => Err(crate::PalError::InvalidParam(format!(
                "haptic source {}",
                other
            ))),
        }
    }
}

/// Opaque identity of a stream bound to a device, as reported by the
/// resource manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StreamHandle(pub u64);

/// Runtime parameter identifiers understood by devices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamId {
    HapticSource,
    A2dpConnection,
    A2dpSuspended,
    A2dpReconfig,
    A2dpReconfigSupported,
    A2dpTwsMono,
    A2dpLc3Mono,
    ScoOn,
    ScoWideband,
    ScoSuperWideband,
    ScoNrec,
}

/// Decoded runtime parameter payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceParam {
    HapticSource(HapticSource),
    A2dpConnection(bool),
    A2dpSuspended(bool),
    A2dpReconfig(bool),
    A2dpReconfigSupported(bool),
    A2dpTwsMono(bool),
    A2dpLc3Mono(bool),
    ScoOn(bool),
    ScoWideband(bool),
    /// Super-wideband speech mode, `None` when disabled
    ScoSuperWideband(Option<u32>),
    ScoNrec(bool),
}

impl DeviceParam {
    pub fn id(&self) -> ParamId {
        match self {
            Self::HapticSource(_) => ParamId::HapticSource,
            Self::A2dpConnection(_) => ParamId::A2dpConnection,
            Self::A2dpSuspended(_) => ParamId::A2dpSuspended,
            Self::A2dpReconfig(_) => ParamId::A2dpReconfig,
            Self::A2dpReconfigSupported(_) => ParamId::A2dpReconfigSupported,
            Self::A2dpTwsMono(_) => ParamId::A2dpTwsMono,
            Self::A2dpLc3Mono(_) => ParamId::A2dpLc3Mono,
            Self::ScoOn(_) => ParamId::ScoOn,
            Self::ScoWideband(_) => ParamId::ScoWideband,
            Self::ScoSuperWideband(_) => ParamId::ScoSuperWideband,
            Self::ScoNrec(_) => ParamId::ScoNrec,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_id_has_a_class_and_path() {
        for id in DeviceId::ALL {
            let _ = id.class();
            assert!(!id.path_name().is_empty());
        }
        assert_eq!(DeviceId::InBluetoothBle.class(), DeviceClass::A2dp);
        assert_eq!(DeviceId::InBluetoothScoHeadset.class(), DeviceClass::Sco);
    }

    #[test]
    fn test_haptic_source_conversion() {
        assert_eq!(HapticSource::try_from(1).unwrap(), HapticSource::A2h);
        assert_eq!(HapticSource::A2h.value(), 1);
        assert!(HapticSource::try_from(7).is_err());
    }
}
