use serde::{Deserialize, Serialize};

use crate::PalResult;

/// Encoder settings pushed to a compress session in one call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderConfig {
    pub bitrate: u32,
    /// Global cutoff frequency in Hz, AAC-LC only
    pub cutoff_frequency: Option<u32>,
    pub encoding_mode: u32,
    pub format_flag: u32,
}

/// Hardware compress-capture session. The negotiator only hands it
/// complete configurations.
pub trait CodecSession: Send {
    fn apply_encoder_config(&mut self, config: &EncoderConfig) -> PalResult<()>;
}
