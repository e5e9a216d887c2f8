use serde::{Deserialize, Serialize};

use crate::extn::StrParms;

pub const OFFLOAD_SAMPLE_RATE: &str = "music_offload_sample_rate";
pub const OFFLOAD_NUM_CHANNELS: &str = "music_offload_num_channels";
pub const OFFLOAD_AVG_BIT_RATE: &str = "music_offload_avg_bit_rate";

/// Stream metadata the framework attaches to compressed streams
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressMetadata {
    pub sample_rate: Option<u32>,
    pub channels: Option<u32>,
    pub avg_bit_rate: Option<u32>,
}

impl CompressMetadata {
    pub fn is_empty(&self) -> bool {
        self.sample_rate.is_none() && self.channels.is_none() && self.avg_bit_rate.is_none()
    }
}

fn positive(parms: &StrParms, key: &str) -> Option<u32> {
    let value = parms.get_int(key)?;
    match u32::try_from(value) {
        Ok(v) if v > 0 => Some(v),
        _ => {
            log::warn!("ignoring {}={}", key, value);
            None
        }
    }
}

/// Read the offload metadata keys; absent or non-positive values are `None`
pub fn parse_compress_metadata(parms: &StrParms) -> CompressMetadata {
    CompressMetadata {
        sample_rate: positive(parms, OFFLOAD_SAMPLE_RATE),
        channels: positive(parms, OFFLOAD_NUM_CHANNELS),
        avg_bit_rate: positive(parms, OFFLOAD_AVG_BIT_RATE),
    }
}
