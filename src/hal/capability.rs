use super::types::{DeviceAttributes, DeviceClass};
use crate::{PalError, PalResult};

/// Fixed set of attributes a device class accepts.
///
/// Supporting a new rate, channel count or width is a table edit.
#[derive(Debug)]
pub struct CapabilityTable {
    pub sample_rates: &'static [u32],
    pub channels: &'static [u32],
    pub bit_widths: &'static [u32],
}

pub const HAPTICS_CAPS: CapabilityTable = CapabilityTable {
    sample_rates: &[48000],
    channels: &[1],
    bit_widths: &[16],
};

pub const A2DP_CAPS: CapabilityTable = CapabilityTable {
    sample_rates: &[44100, 48000, 88200, 96000],
    channels: &[1, 2],
    bit_widths: &[16, 24, 32],
};

pub const SCO_CAPS: CapabilityTable = CapabilityTable {
    sample_rates: &[8000, 16000, 32000, 48000, 96000],
    channels: &[1],
    bit_widths: &[16],
};

pub const FM_CAPS: CapabilityTable = CapabilityTable {
    sample_rates: &[48000],
    channels: &[2],
    bit_widths: &[16],
};

impl DeviceClass {
    pub fn capabilities(&self) -> &'static CapabilityTable {
        match self {
            Self::Haptics => &HAPTICS_CAPS,
            Self::A2dp => &A2DP_CAPS,
            Self::Sco => &SCO_CAPS,
            Self::Fm => &FM_CAPS,
        }
    }
}

impl CapabilityTable {
    pub fn is_sample_rate_supported(&self, sample_rate: u32) -> PalResult<()> {
        log::debug!("sample rate {}", sample_rate);
        if self.sample_rates.contains(&sample_rate) {
            Ok(())
        } else {
            log::error!("sample rate {} not supported", sample_rate);
            Err(PalError::SampleRateNotSupported(sample_rate))
        }
    }

    pub fn is_channel_count_supported(&self, channels: u32) -> PalResult<()> {
        log::debug!("channels {}", channels);
        if self.channels.contains(&channels) {
            Ok(())
        } else {
            log::error!("channel count {} not supported", channels);
            Err(PalError::ChannelsNotSupported(channels))
        }
    }

    pub fn is_bit_width_supported(&self, bit_width: u32) -> PalResult<()> {
        log::debug!("bit width {}", bit_width);
        if self.bit_widths.contains(&bit_width) {
            Ok(())
        } else {
            log::error!("bit width {} not supported", bit_width);
            Err(PalError::BitWidthNotSupported(bit_width))
        }
    }

    /// Fill zero fields with the class defaults (first table entry) and check
    /// the rest. Used when constructing a device from a descriptor.
    pub fn resolve(&self, requested: &DeviceAttributes) -> PalResult<DeviceAttributes> {
        let pick = |value: u32, table: &[u32]| {
            if value == 0 {
                table.first().copied().unwrap_or(0)
            } else {
                value
            }
        };

        let resolved = DeviceAttributes {
            id: requested.id,
            sample_rate: pick(requested.sample_rate, self.sample_rates),
            channels: pick(requested.channels, self.channels),
            bit_width: pick(requested.bit_width, self.bit_widths),
        };

        self.is_sample_rate_supported(resolved.sample_rate)?;
        self.is_channel_count_supported(resolved.channels)?;
        self.is_bit_width_supported(resolved.bit_width)?;

        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::DeviceId;

    #[test]
    fn test_haptics_table() {
        let caps = DeviceClass::Haptics.capabilities();

        assert!(caps.is_sample_rate_supported(48000).is_ok());
        assert_eq!(
            caps.is_sample_rate_supported(44100),
            Err(PalError::SampleRateNotSupported(44100))
        );
        assert!(caps.is_channel_count_supported(1).is_ok());
        assert!(caps.is_channel_count_supported(2).is_err());
        assert!(caps.is_bit_width_supported(16).is_ok());
        assert!(caps.is_bit_width_supported(24).is_err());
    }

    #[test]
    fn test_resolve_fills_defaults() {
        let attrs = HAPTICS_CAPS
            .resolve(&DeviceAttributes::new(DeviceId::OutHaptics))
            .unwrap();

        assert_eq!(attrs.sample_rate, 48000);
        assert_eq!(attrs.channels, 1);
        assert_eq!(attrs.bit_width, 16);
    }

    #[test]
    fn test_resolve_rejects_unsupported_field() {
        let requested = DeviceAttributes::with_config(DeviceId::OutBluetoothA2dp, 48000, 6, 16);
        let err = A2DP_CAPS.resolve(&requested).unwrap_err();

        assert_eq!(err, PalError::ChannelsNotSupported(6));
        assert!(err.is_not_supported());
    }
}
