//! Device-set helpers shared by the extension features.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

const BIT_IN: u32 = 0x8000_0000;

/// Framework audio device types, carrying their framework bit values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AudioDeviceType {
    OutEarpiece,
    OutSpeaker,
    OutWiredHeadset,
    OutWiredHeadphone,
    OutBluetoothSco,
    OutBluetoothScoHeadset,
    OutBluetoothScoCarkit,
    OutBluetoothA2dp,
    OutBluetoothA2dpHeadphones,
    OutBluetoothA2dpSpeaker,
    OutAuxDigital,
    OutUsbDevice,
    OutFm,
    OutSpeakerSafe,
    OutBleHeadset,
    OutBleSpeaker,
    OutBleBroadcast,
    InBuiltinMic,
    InBluetoothScoHeadset,
    InWiredHeadset,
    InFmTuner,
    InBluetoothA2dp,
    InBleHeadset,
}

pub type DeviceSet = BTreeSet<AudioDeviceType>;

impl AudioDeviceType {
    /// Output types with a single-bit framework value, in bit order
    const MASKABLE_OUTPUTS: [AudioDeviceType; 14] = [
        AudioDeviceType::OutEarpiece,
        AudioDeviceType::OutSpeaker,
        AudioDeviceType::OutWiredHeadset,
        AudioDeviceType::OutWiredHeadphone,
        AudioDeviceType::OutBluetoothSco,
        AudioDeviceType::OutBluetoothScoHeadset,
        AudioDeviceType::OutBluetoothScoCarkit,
        AudioDeviceType::OutBluetoothA2dp,
        AudioDeviceType::OutBluetoothA2dpHeadphones,
        AudioDeviceType::OutBluetoothA2dpSpeaker,
        AudioDeviceType::OutAuxDigital,
        AudioDeviceType::OutUsbDevice,
        AudioDeviceType::OutFm,
        AudioDeviceType::OutSpeakerSafe,
    ];

    pub fn bits(self) -> u32 {
        match self {
            Self::OutEarpiece => 0x1,
            Self::OutSpeaker => 0x2,
            Self::OutWiredHeadset => 0x4,
            Self::OutWiredHeadphone => 0x8,
            Self::OutBluetoothSco => 0x10,
            Self::OutBluetoothScoHeadset => 0x20,
            Self::OutBluetoothScoCarkit => 0x40,
            Self::OutBluetoothA2dp => 0x80,
            Self::OutBluetoothA2dpHeadphones => 0x100,
            Self::OutBluetoothA2dpSpeaker => 0x200,
            Self::OutAuxDigital => 0x400,
            Self::OutUsbDevice => 0x4000,
            Self::OutFm => 0x10_0000,
            Self::OutSpeakerSafe => 0x40_0000,
            Self::OutBleHeadset => 0x2000_0000,
            Self::OutBleSpeaker => 0x2000_0001,
            Self::OutBleBroadcast => 0x2000_0002,
            Self::InBuiltinMic => BIT_IN | 0x4,
            Self::InBluetoothScoHeadset => BIT_IN | 0x8,
            Self::InWiredHeadset => BIT_IN | 0x10,
            Self::InFmTuner => BIT_IN | 0x2000,
            Self::InBluetoothA2dp => BIT_IN | 0x2_0000,
            Self::InBleHeadset => BIT_IN | 0x2000_0000,
        }
    }

    pub fn is_output(self) -> bool {
        self.bits() & BIT_IN == 0
    }

    pub fn is_a2dp_out(self) -> bool {
        matches!(
            self,
            Self::OutBluetoothA2dp | Self::OutBluetoothA2dpHeadphones | Self::OutBluetoothA2dpSpeaker
        )
    }

    pub fn is_sco_out(self) -> bool {
        matches!(
            self,
            Self::OutBluetoothSco | Self::OutBluetoothScoHeadset | Self::OutBluetoothScoCarkit
        )
    }

    /// Decode a legacy output bitmask into the single-bit output types it
    /// names. Unknown bits are ignored.
    pub fn from_output_mask(mask: u32) -> DeviceSet {
        if mask & BIT_IN != 0 {
            return DeviceSet::new();
        }
        Self::MASKABLE_OUTPUTS
            .iter()
            .copied()
            .filter(|ty| mask & ty.bits() != 0)
            .collect()
    }
}

/// True if any device in `devices` satisfies `pred`
pub fn audio_devices_cmp<F>(devices: &DeviceSet, pred: F) -> bool
where
    F: Fn(AudioDeviceType) -> bool,
{
    devices.iter().any(|ty| pred(*ty))
}

pub fn audio_devices_contains(devices: &DeviceSet, ty: AudioDeviceType) -> bool {
    devices.contains(&ty)
}

/// Bitwise union of the framework values of `devices`
pub fn get_device_types(devices: &DeviceSet) -> u32 {
    devices.iter().fold(0, |acc, ty| acc | ty.bits())
}

pub fn audio_devices_empty(devices: &DeviceSet) -> bool {
    devices.is_empty()
}
