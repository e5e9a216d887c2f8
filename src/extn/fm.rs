//! FM radio playback: tuner capture routed to an output device.

use audiopal_macros::RegisterFeature;

use super::device_utils::{self, AudioDeviceType, DeviceSet};
use super::feature::{ExtnContext, ExtnFeature};
use super::params::StrParms;
use crate::hal::{mixer, DeviceAttributes, DeviceId};
use crate::{PalError, PalResult};

pub const HANDLE_FM: &str = "handle_fm";
pub const FM_VOLUME: &str = "fm_volume";
pub const FM_MUTE: &str = "fm_mute";
pub const FM_RESTORE_VOLUME: &str = "fm_restore_volume";
pub const FM_STATUS: &str = "fm_status";

pub const FM_VOLUME_CTL: &str = "FM Volume";

#[derive(Debug, Default, RegisterFeature)]
#[extn(name = "fm", keys = "handle_fm", prefixes = "fm_")]
pub struct FmFeature {
    running: bool,
    muted: bool,
    volume: f32,
    devices: DeviceSet,
}

impl FmFeature {
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Output devices FM is currently routed to
    pub fn devices(&self) -> &DeviceSet {
        &self.devices
    }

    fn start(&mut self, ctx: &ExtnContext, devices: DeviceSet) -> PalResult<()> {
        self.devices = devices;
        if self.running {
            log::info!(
                "fm rerouted to {:#x}",
                device_utils::get_device_types(&self.devices)
            );
            return Ok(());
        }

        let tuner = ctx
            .registry
            .get_instance(&DeviceAttributes::new(DeviceId::InFmTuner), &ctx.rm)?;
        tuner.open()?;
        if let Err(e) = tuner.start() {
            log::error!("fm tuner start failed: {}", e);
            if let Err(e) = tuner.close() {
                log::error!("fm tuner close failed: {}", e);
            }
            return Err(e);
        }

        self.running = true;
        log::info!(
            "fm started on {:#x}",
            device_utils::get_device_types(&self.devices)
        );
        self.apply_volume(ctx, self.volume);
        Ok(())
    }

    fn stop(&mut self, ctx: &ExtnContext) {
        self.devices.clear();
        if !self.running {
            return;
        }
        if let Some(tuner) = ctx.registry.get_object(DeviceId::InFmTuner) {
            if let Err(e) = tuner.stop().and_then(|_| tuner.close()) {
                log::error!("fm tuner stop failed: {}", e);
            }
        }
        self.running = false;
        self.muted = false;
        log::info!("fm stopped");
    }

    fn apply_volume(&self, ctx: &ExtnContext, volume: f32) {
        if !self.running {
            log::debug!("fm volume {} stored until fm starts", volume);
            return;
        }
        let level = if self.muted {
            0
        } else {
            (volume * 100.0).round() as i64
        };
        if let Err(e) = mixer::set_control_value(ctx.rm.as_ref(), FM_VOLUME_CTL, level) {
            log::error!("fm volume not applied: {}", e);
        }
    }
}

impl ExtnFeature for FmFeature {
    fn deinit(&mut self, ctx: &ExtnContext) {
        self.stop(ctx);
    }

    fn set_parameters(&mut self, ctx: &ExtnContext, parms: &StrParms) -> PalResult<()> {
        if let Some(volume) = parms.get_float(FM_VOLUME) {
            if !(0.0..=1.0).contains(&volume) {
                log::error!("fm volume {} out of range", volume);
                return Err(PalError::InvalidParam(format!("{}={}", FM_VOLUME, volume)));
            }
            self.volume = volume;
            self.apply_volume(ctx, volume);
        }

        if let Some(mask) = parms.get_int(HANDLE_FM) {
            let devices = AudioDeviceType::from_output_mask(mask as u32);
            if device_utils::audio_devices_cmp(&devices, AudioDeviceType::is_output) {
                self.start(ctx, devices)?;
            } else {
                self.stop(ctx);
            }
        }

        if let Some(mute) = parms.get_bool(FM_MUTE) {
            self.muted = mute;
            self.apply_volume(ctx, self.volume);
        }

        if parms.contains(FM_RESTORE_VOLUME) {
            self.muted = false;
            self.apply_volume(ctx, self.volume);
        }

        Ok(())
    }

    fn get_parameters(&mut self, _ctx: &ExtnContext, query: &StrParms, reply: &mut StrParms) {
        if query.contains(FM_STATUS) {
            reply.add_int(FM_STATUS, i32::from(self.running));
        }
        if query.contains(FM_VOLUME) {
            reply.add_float(FM_VOLUME, self.volume);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeatureFlags;
    use crate::hal::mock::MockResourceManager;
    use crate::hal::{DeviceRegistry, DeviceState, ResourceManager};
    use std::sync::Arc;

    fn setup() -> (Arc<MockResourceManager>, ExtnContext) {
        let rm = Arc::new(MockResourceManager::new());
        let rm_dyn: Arc<dyn ResourceManager> = rm.clone();
        let registry = Arc::new(DeviceRegistry::with_defaults(FeatureFlags::all()));
        (rm, ExtnContext::new(registry, rm_dyn))
    }

    #[test]
    fn test_handle_fm_starts_and_stops_tuner() {
        let (_rm, ctx) = setup();
        let mut fm = FmFeature::default();

        fm.set_parameters(&ctx, &StrParms::parse("handle_fm=2")).unwrap();
        assert!(fm.is_running());
        let tuner = ctx.registry.get_object(DeviceId::InFmTuner).unwrap();
        assert_eq!(tuner.state(), DeviceState::Running);

        fm.set_parameters(&ctx, &StrParms::parse("handle_fm=0")).unwrap();
        assert!(!fm.is_running());
        assert_eq!(tuner.state(), DeviceState::Closed);
    }

    #[test]
    fn test_volume_mute_and_restore() {
        let (rm, ctx) = setup();
        let mixer = rm.mixer().unwrap();
        let mut fm = FmFeature::default();

        fm.set_parameters(&ctx, &StrParms::parse("fm_volume=0.5")).unwrap();
        assert!(mixer.writes_to(FM_VOLUME_CTL).is_empty());

        fm.set_parameters(&ctx, &StrParms::parse("handle_fm=2")).unwrap();
        fm.set_parameters(&ctx, &StrParms::parse("fm_mute=true")).unwrap();
        fm.set_parameters(&ctx, &StrParms::parse("fm_restore_volume")).unwrap();

        assert_eq!(mixer.writes_to(FM_VOLUME_CTL), vec![50, 0, 50]);
    }

    #[test]
    fn test_status_query() {
        let (_rm, ctx) = setup();
        let mut fm = FmFeature::default();
        let mut reply = StrParms::new();

        fm.get_parameters(&ctx, &StrParms::parse("fm_status"), &mut reply);

        assert_eq!(reply.get_int(FM_STATUS), Some(0));
    }
}
