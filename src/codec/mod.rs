//! Compressed-capture codec negotiation.

pub mod aac;
pub mod metadata;
pub mod session;

pub use aac::{AacFormat, AacTransport, CompressAac};
pub use metadata::{parse_compress_metadata, CompressMetadata};
pub use session::{CodecSession, EncoderConfig};

use crate::config::FeatureFlags;
use crate::{PalError, PalResult};

/// AAC encoder for a compress-capture stream, when the feature is enabled
pub fn open_aac_capture(
    flags: &FeatureFlags,
    format: AacFormat,
    sample_rate: u32,
    channels: u32,
) -> PalResult<CompressAac> {
    if !flags.compress_capture {
        log::error!("compress capture disabled");
        return Err(PalError::FeatureDisabled("compress_capture"));
    }
    CompressAac::new(format, sample_rate, channels)
}
