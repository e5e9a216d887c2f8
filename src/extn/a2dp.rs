//! A2DP / LE audio runtime controls. Only devices that already exist are
//! touched; this feature never constructs one.

use std::sync::Arc;

use audiopal_macros::RegisterFeature;

use super::feature::{ExtnContext, ExtnFeature};
use super::params::StrParms;
use crate::hal::{Device, DeviceId, DeviceParam, ParamId};
use crate::{PalError, PalResult};

pub const A2DP_SUSPENDED: &str = "A2dpSuspended";
pub const RECONFIG_A2DP: &str = "reconfigA2dp";
pub const TWS_CHANNEL_CONFIG: &str = "TwsChannelConfig";
pub const LE_AUDIO_MONO: &str = "LEAMono";
pub const RECONFIG_SUPPORTED: &str = "isReconfigA2dpSupported";

const A2DP_DEVICES: [DeviceId; 2] = [DeviceId::OutBluetoothA2dp, DeviceId::InBluetoothA2dp];
const BLE_DEVICES: [DeviceId; 3] = [
    DeviceId::OutBluetoothBle,
    DeviceId::InBluetoothBle,
    DeviceId::OutBluetoothBleBroadcast,
];

#[derive(Debug, Default, RegisterFeature)]
#[extn(
    name = "a2dp",
    keys = "A2dpSuspended,reconfigA2dp,TwsChannelConfig,LEAMono,isReconfigA2dpSupported"
)]
pub struct A2dpFeature;

fn live(ctx: &ExtnContext, ids: &[DeviceId]) -> Vec<Arc<dyn Device>> {
    ids.iter()
        .filter_map(|id| ctx.registry.get_object(*id))
        .collect()
}

fn forward(devices: &[Arc<dyn Device>], param: DeviceParam) -> PalResult<()> {
    if devices.is_empty() {
        log::debug!("{:?} dropped: no bluetooth device instance", param.id());
    }
    let mut result = Ok(());
    for device in devices {
        if let Err(e) = device.set_parameter(param) {
            log::error!("{:?} on {:?} failed: {}", param.id(), device.id(), e);
            if result.is_ok() {
                result = Err(e);
            }
        }
    }
    result
}

fn reply_bool(ctx: &ExtnContext, id: ParamId) -> Option<bool> {
    let device = ctx.registry.get_object(DeviceId::OutBluetoothA2dp)?;
    match device.get_parameter(id).ok()? {
        DeviceParam::A2dpSuspended(v)
        | DeviceParam::A2dpReconfig(v)
        | DeviceParam::A2dpReconfigSupported(v)
        | DeviceParam::A2dpTwsMono(v) => Some(v),
        _ => None,
    }
}

impl ExtnFeature for A2dpFeature {
    fn set_parameters(&mut self, ctx: &ExtnContext, parms: &StrParms) -> PalResult<()> {
        let mut result = Ok(());
        let mut record = |r: PalResult<()>| {
            if result.is_ok() {
                result = r;
            }
        };

        if let Some(suspended) = parms.get_bool(A2DP_SUSPENDED) {
            let mut devices = live(ctx, &A2DP_DEVICES);
            devices.extend(live(ctx, &BLE_DEVICES));
            record(forward(&devices, DeviceParam::A2dpSuspended(suspended)));
        }

        if let Some(reconfig) = parms.get_bool(RECONFIG_A2DP) {
            record(forward(
                &live(ctx, &A2DP_DEVICES),
                DeviceParam::A2dpReconfig(reconfig),
            ));
        }

        if let Some(config) = parms.get_str(TWS_CHANNEL_CONFIG) {
            let mono = match config {
                "mono" => Some(true),
                "dual-mono" => Some(false),
                other => {
                    log::error!("unknown {} value '{}'", TWS_CHANNEL_CONFIG, other);
                    record(Err(PalError::InvalidParam(format!(
                        "{}={}",
                        TWS_CHANNEL_CONFIG, other
                    ))));
                    None
                }
            };
            if let Some(mono) = mono {
                record(forward(
                    &live(ctx, &[DeviceId::OutBluetoothA2dp]),
                    DeviceParam::A2dpTwsMono(mono),
                ));
            }
        }

        if let Some(mono) = parms.get_bool(LE_AUDIO_MONO) {
            record(forward(&live(ctx, &BLE_DEVICES), DeviceParam::A2dpLc3Mono(mono)));
        }

        result
    }

    fn get_parameters(&mut self, ctx: &ExtnContext, query: &StrParms, reply: &mut StrParms) {
        let answers = [
            (RECONFIG_SUPPORTED, ParamId::A2dpReconfigSupported),
            (A2DP_SUSPENDED, ParamId::A2dpSuspended),
            (RECONFIG_A2DP, ParamId::A2dpReconfig),
        ];
        for (key, id) in answers {
            if !query.contains(key) {
                continue;
            }
            match reply_bool(ctx, id) {
                Some(value) => reply.add_bool(key, value),
                None => log::debug!("no a2dp answer for {}", key),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeatureFlags;
    use crate::hal::devices::BtA2dp;
    use crate::hal::mock::MockResourceManager;
    use crate::hal::{DeviceAttributes, DeviceRegistry, ResourceManager};

    fn setup() -> ExtnContext {
        let rm: Arc<dyn ResourceManager> = Arc::new(MockResourceManager::new());
        ExtnContext::new(
            Arc::new(DeviceRegistry::with_defaults(FeatureFlags::all())),
            rm,
        )
    }

    #[test]
    fn test_never_constructs_devices() {
        let ctx = setup();
        let mut a2dp = A2dpFeature;

        a2dp.set_parameters(&ctx, &StrParms::parse("A2dpSuspended=true"))
            .unwrap();

        assert!(ctx.registry.live_devices().is_empty());
    }

    #[test]
    fn test_suspend_forwarded_to_live_device() {
        let ctx = setup();
        let device = ctx
            .registry
            .get_instance(&DeviceAttributes::new(DeviceId::OutBluetoothA2dp), &ctx.rm)
            .unwrap();
        let mut a2dp = A2dpFeature;

        a2dp.set_parameters(&ctx, &StrParms::parse("A2dpSuspended=true"))
            .unwrap();

        let bt = device.as_any().downcast_ref::<BtA2dp>().unwrap();
        assert!(bt.is_suspended());

        let mut reply = StrParms::new();
        a2dp.get_parameters(&ctx, &StrParms::parse("A2dpSuspended"), &mut reply);
        assert_eq!(reply.get_bool(A2DP_SUSPENDED), Some(true));
    }

    #[test]
    fn test_bad_tws_config_rejected() {
        let ctx = setup();
        let mut a2dp = A2dpFeature;

        let result = a2dp.set_parameters(&ctx, &StrParms::parse("TwsChannelConfig=quad"));

        assert!(matches!(result, Err(PalError::InvalidParam(_))));
    }
}
