//! AAC compress-capture parameter negotiation.
//!
//! Bitrate bounds are a fixed function of the format family, the channel
//! count and (for HE-AAC minimums) the sample rate. Requests outside the
//! bounds are rejected; nothing is clamped.

use serde::{Deserialize, Serialize};

use super::session::{CodecSession, EncoderConfig};
use crate::extn::StrParms;
use crate::{PalError, PalResult};

pub const AAC_BITRATE_KEY: &str = "dsp_aac_audio_bitrate";
pub const AAC_CUTOFF_KEY: &str = "dsp_aac_audio_global_cutoff_frequency";

pub const ENCODING_MODE_LC: u32 = 0x02;
pub const ENCODING_MODE_SBR: u32 = 0x05;
pub const ENCODING_MODE_PS: u32 = 0x1D;

pub const DEFAULT_BITRATE: u32 = 36000;
pub const MAX_BUFFER_SIZE: usize = 2048;

const LC_SAMPLES_PER_FRAME: u32 = 1024;
const HE_SAMPLES_PER_FRAME: u32 = 2048;

/// HE-AAC minimums step up at this rate
const HE_LOW_RATE_LIMIT: u32 = 32000;

const SUPPORTED_SAMPLE_RATES: [u32; 9] = [
    8000, 11025, 12000, 16000, 22050, 24000, 32000, 44100, 48000,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AacFormat {
    Lc,
    /// HE-AAC v1 (SBR)
    HeV1,
    /// HE-AAC v2 (SBR + parametric stereo)
    HeV2,
}

impl AacFormat {
    pub fn encoding_mode(self) -> u32 {
        match self {
            Self::Lc => ENCODING_MODE_LC,
            Self::HeV1 => ENCODING_MODE_SBR,
            Self::HeV2 => ENCODING_MODE_PS,
        }
    }

    pub fn pcm_samples_per_frame(self) -> u32 {
        match self {
            Self::Lc => LC_SAMPLES_PER_FRAME,
            Self::HeV1 | Self::HeV2 => HE_SAMPLES_PER_FRAME,
        }
    }
}

/// Bitstream transport
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AacTransport {
    #[default]
    Adts,
    Loas,
    Raw,
    Latm,
}

impl AacTransport {
    pub fn flag(self) -> u32 {
        match self {
            Self::Adts => 0x0,
            Self::Loas => 0x1,
            Self::Raw => 0x3,
            Self::Latm => 0x4,
        }
    }
}

/// Negotiated encoder state of one compress-capture stream
#[derive(Debug)]
pub struct CompressAac {
    format: AacFormat,
    transport: AacTransport,
    sample_rate: u32,
    channels: u32,
    bitrate: u32,
    cutoff_frequency: Option<u32>,
    last_applied: Option<EncoderConfig>,
    read_calls: u64,
}

impl CompressAac {
    pub fn new(format: AacFormat, sample_rate: u32, channels: u32) -> PalResult<Self> {
        if !SUPPORTED_SAMPLE_RATES.contains(&sample_rate) {
            log::error!("aac: sample rate {} not supported", sample_rate);
            return Err(PalError::SampleRateNotSupported(sample_rate));
        }
        let channels_ok = match format {
            AacFormat::HeV2 => channels == 2,
            AacFormat::Lc | AacFormat::HeV1 => channels == 1 || channels == 2,
        };
        if !channels_ok {
            log::error!("aac: {} channels not supported for {:?}", channels, format);
            return Err(PalError::ChannelsNotSupported(channels));
        }

        Ok(Self {
            format,
            transport: AacTransport::default(),
            sample_rate,
            channels,
            bitrate: DEFAULT_BITRATE,
            cutoff_frequency: None,
            last_applied: None,
            read_calls: 0,
        })
    }

    pub fn with_transport(mut self, transport: AacTransport) -> Self {
        self.transport = transport;
        self
    }

    pub fn format(&self) -> AacFormat {
        self.format
    }

    pub fn bitrate(&self) -> u32 {
        self.bitrate
    }

    pub fn cutoff_frequency(&self) -> Option<u32> {
        self.cutoff_frequency
    }

    pub fn pcm_samples_per_frame(&self) -> u32 {
        self.format.pcm_samples_per_frame()
    }

    pub fn max_buffer_size(&self) -> usize {
        MAX_BUFFER_SIZE
    }

    /// Inclusive `(min, max)` bitrate for the current format and channels
    pub fn bitrate_bounds(&self) -> (u32, u32) {
        let low_rate = self.sample_rate < HE_LOW_RATE_LIMIT;
        let mono = self.channels == 1;
        match self.format {
            AacFormat::Lc if mono => (8000, 192000),
            AacFormat::Lc => (16000, 384000),
            AacFormat::HeV1 if mono => (if low_rate { 10000 } else { 12000 }, 192000),
            AacFormat::HeV1 => (if low_rate { 18000 } else { 24000 }, 192000),
            AacFormat::HeV2 => (if low_rate { 10000 } else { 12000 }, 192000),
        }
    }

    /// Accept `requested` if it lies within [`Self::bitrate_bounds`]
    pub fn set_dsp_bitrate(&mut self, requested: i32) -> PalResult<()> {
        let (min, max) = self.bitrate_bounds();
        match u32::try_from(requested) {
            Ok(bitrate) if (min..=max).contains(&bitrate) => {
                log::debug!("aac bitrate {}", bitrate);
                self.bitrate = bitrate;
                Ok(())
            }
            _ => {
                log::error!(
                    "aac bitrate {} outside [{}, {}] for {:?} {}ch",
                    requested,
                    min,
                    max,
                    self.format,
                    self.channels
                );
                Err(PalError::BitrateOutOfRange {
                    requested,
                    min: min as i32,
                    max: max as i32,
                })
            }
        }
    }

    /// Global cutoff frequency, AAC-LC only, at most Nyquist
    pub fn set_cutoff_frequency(&mut self, hz: i32) -> PalResult<()> {
        if self.format != AacFormat::Lc {
            log::error!("aac cutoff frequency unsupported for {:?}", self.format);
            return Err(PalError::InvalidParam(format!(
                "cutoff frequency unsupported for {:?}",
                self.format
            )));
        }
        match u32::try_from(hz) {
            Ok(hz) if hz > 0 && hz <= self.sample_rate / 2 => {
                self.cutoff_frequency = Some(hz);
                Ok(())
            }
            _ => Err(PalError::InvalidParam(format!("{}={}", AAC_CUTOFF_KEY, hz))),
        }
    }

    pub fn encoder_config(&self) -> EncoderConfig {
        EncoderConfig {
            bitrate: self.bitrate,
            cutoff_frequency: self.cutoff_frequency,
            encoding_mode: self.format.encoding_mode(),
            format_flag: self.transport.flag(),
        }
    }

    /// Push the negotiated state to `session`. Returns `false` when the
    /// session already holds exactly this configuration.
    pub fn configure(&mut self, session: &mut dyn CodecSession) -> PalResult<bool> {
        let config = self.encoder_config();
        if self.last_applied == Some(config) {
            log::debug!("aac config unchanged, skipping");
            return Ok(false);
        }
        session.apply_encoder_config(&config).map_err(|e| {
            log::error!("aac config not applied: {}", e);
            e
        })?;
        log::info!("aac configured: {:?}", config);
        self.last_applied = Some(config);
        Ok(true)
    }

    /// Apply the AAC keys of `parms` and reconfigure `session`. Keys that
    /// fail validation leave the previous value in place.
    pub fn set_parameters(
        &mut self,
        session: &mut dyn CodecSession,
        parms: &StrParms,
    ) -> PalResult<()> {
        if let Some(bitrate) = parms.get_int(AAC_BITRATE_KEY) {
            self.set_dsp_bitrate(bitrate)?;
        }
        if let Some(cutoff) = parms.get_int(AAC_CUTOFF_KEY) {
            self.set_cutoff_frequency(cutoff)?;
        }
        self.configure(session)?;
        Ok(())
    }

    pub fn get_parameters(&self, query: &StrParms, reply: &mut StrParms) {
        if query.contains(AAC_BITRATE_KEY) {
            reply.add_int(AAC_BITRATE_KEY, self.bitrate as i32);
        }
        if query.contains(AAC_CUTOFF_KEY) {
            if let Some(cutoff) = self.cutoff_frequency {
                reply.add_int(AAC_CUTOFF_KEY, cutoff as i32);
            }
        }
    }

    /// Count one successful read of a compressed frame
    pub fn record_read(&mut self) {
        self.read_calls += 1;
    }

    pub fn frames_read(&self) -> u64 {
        self.read_calls * u64::from(self.pcm_samples_per_frame())
    }
}
