//! Hands-free profile voice call over SCO.

use std::sync::Arc;

use audiopal_macros::RegisterFeature;

use super::feature::{ExtnContext, ExtnFeature};
use super::params::StrParms;
use crate::hal::devices::bluetooth::{SCO_NB_SAMPLE_RATE, SCO_WB_SAMPLE_RATE};
use crate::hal::{mixer, Device, DeviceAttributes, DeviceId, DeviceParam};
use crate::{PalError, PalResult};

pub const HFP_ENABLE: &str = "hfp_enable";
pub const HFP_SET_SAMPLING_RATE: &str = "hfp_set_sampling_rate";
pub const HFP_VOLUME: &str = "hfp_volume";
pub const HFP_MIC_MUTE: &str = "hfp_mic_mute";

pub const HFP_RX_VOLUME_CTL: &str = "HFP RX Volume";

const SCO_PAIR: [DeviceId; 2] = [DeviceId::OutBluetoothSco, DeviceId::InBluetoothScoHeadset];

#[derive(Debug, RegisterFeature)]
#[extn(
    name = "hfp",
    keys = "hfp_enable,hfp_set_sampling_rate,hfp_volume,hfp_mic_mute",
    prefixes = "hfp_"
)]
pub struct HfpFeature {
    active: bool,
    sample_rate: u32,
    volume: f32,
    mic_mute: bool,
}

impl Default for HfpFeature {
    fn default() -> Self {
        Self {
            active: false,
            sample_rate: SCO_NB_SAMPLE_RATE,
            volume: 0.0,
            mic_mute: false,
        }
    }
}

impl HfpFeature {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_mic_muted(&self) -> bool {
        self.mic_mute
    }

    pub fn set_mic_mute(&mut self, mute: bool) -> PalResult<()> {
        if !self.active {
            log::error!("hfp mic mute requested while hfp inactive");
            return Err(PalError::InvalidState("hfp inactive".to_string()));
        }
        self.mic_mute = mute;
        log::info!("hfp mic mute {}", mute);
        Ok(())
    }

    fn sco_devices(ctx: &ExtnContext) -> PalResult<Vec<Arc<dyn Device>>> {
        SCO_PAIR
            .iter()
            .map(|id| ctx.registry.get_instance(&DeviceAttributes::new(*id), &ctx.rm))
            .collect()
    }

    fn start(&mut self, ctx: &ExtnContext) -> PalResult<()> {
        if self.active {
            return Ok(());
        }
        log::info!("starting hfp at {} Hz", self.sample_rate);

        let devices = Self::sco_devices(ctx)?;
        let wideband = self.sample_rate == SCO_WB_SAMPLE_RATE;
        for device in &devices {
            device.set_parameter(DeviceParam::ScoWideband(wideband))?;
            device.set_parameter(DeviceParam::ScoOn(true))?;
        }
        for device in &devices {
            let started = device.open().and_then(|_| device.start());
            if let Err(e) = started {
                log::error!("failed to start {:?}: {}", device.id(), e);
                Self::teardown(&devices);
                return Err(e);
            }
        }

        self.active = true;
        self.apply_volume(ctx);
        Ok(())
    }

    fn stop(&mut self, ctx: &ExtnContext) -> PalResult<()> {
        if !self.active {
            return Ok(());
        }
        log::info!("stopping hfp");
        Self::teardown(&Self::sco_devices(ctx)?);
        self.active = false;
        self.mic_mute = false;
        Ok(())
    }

    fn teardown(devices: &[Arc<dyn Device>]) {
        for device in devices {
            if let Err(e) = device.stop().and_then(|_| device.close()) {
                log::error!("failed to stop {:?}: {}", device.id(), e);
            }
            if let Err(e) = device.set_parameter(DeviceParam::ScoOn(false)) {
                log::error!("failed to clear sco on {:?}: {}", device.id(), e);
            }
        }
    }

    fn apply_volume(&self, ctx: &ExtnContext) {
        if !self.active {
            log::debug!("hfp volume {} stored until hfp starts", self.volume);
            return;
        }
        let level = (self.volume * 100.0).round() as i64;
        if let Err(e) = mixer::set_control_value(ctx.rm.as_ref(), HFP_RX_VOLUME_CTL, level) {
            log::error!("hfp volume not applied: {}", e);
        }
    }
}

impl ExtnFeature for HfpFeature {
    fn deinit(&mut self, ctx: &ExtnContext) {
        if let Err(e) = self.stop(ctx) {
            log::error!("hfp deinit: {}", e);
        }
    }

    fn set_parameters(&mut self, ctx: &ExtnContext, parms: &StrParms) -> PalResult<()> {
        if let Some(rate) = parms.get_int(HFP_SET_SAMPLING_RATE) {
            match u32::try_from(rate) {
                Ok(rate) if rate == SCO_NB_SAMPLE_RATE || rate == SCO_WB_SAMPLE_RATE => {
                    self.sample_rate = rate;
                }
                Ok(rate) => {
                    log::error!("unsupported hfp sample rate {}", rate);
                    return Err(PalError::SampleRateNotSupported(rate));
                }
                Err(_) => {
                    log::error!("invalid hfp sample rate {}", rate);
                    return Err(PalError::InvalidParam(format!(
                        "{}={}",
                        HFP_SET_SAMPLING_RATE, rate
                    )));
                }
            }
        }

        if let Some(volume) = parms.get_float(HFP_VOLUME) {
            if !(0.0..=1.0).contains(&volume) {
                log::error!("hfp volume {} out of range", volume);
                return Err(PalError::InvalidParam(format!("{}={}", HFP_VOLUME, volume)));
            }
            self.volume = volume;
            self.apply_volume(ctx);
        }

        if let Some(enable) = parms.get_bool(HFP_ENABLE) {
            if enable {
                self.start(ctx)?;
            } else {
                self.stop(ctx)?;
            }
        }

        if let Some(mute) = parms.get_bool(HFP_MIC_MUTE) {
            self.set_mic_mute(mute)?;
        }

        Ok(())
    }

    fn get_parameters(&mut self, _ctx: &ExtnContext, query: &StrParms, reply: &mut StrParms) {
        if query.contains(HFP_ENABLE) {
            reply.add_bool(HFP_ENABLE, self.active);
        }
        if query.contains(HFP_SET_SAMPLING_RATE) {
            reply.add_int(HFP_SET_SAMPLING_RATE, self.sample_rate as i32);
        }
        if query.contains(HFP_VOLUME) {
            reply.add_float(HFP_VOLUME, self.volume);
        }
        if query.contains(HFP_MIC_MUTE) {
            reply.add_bool(HFP_MIC_MUTE, self.mic_mute);
        }
    }
}
