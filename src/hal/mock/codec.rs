use crate::codec::{CodecSession, EncoderConfig};
use crate::{PalError, PalResult};

/// Codec session that records every configuration it is handed.
#[derive(Debug, Default)]
pub struct RecordingSession {
    applied: Vec<EncoderConfig>,
    fail_next: bool,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn applied(&self) -> &[EncoderConfig] {
        &self.applied
    }

    /// Make the next apply fail, as a session rejecting the config would
    pub fn fail_next(&mut self) {
        self.fail_next = true;
    }
}

impl CodecSession for RecordingSession {
    fn apply_encoder_config(&mut self, config: &EncoderConfig) -> PalResult<()> {
        if std::mem::take(&mut self.fail_next) {
            return Err(PalError::InvalidState("session rejected config".to_string()));
        }
        self.applied.push(*config);
        Ok(())
    }
}
