use std::sync::Arc;

use audiopal::extn::device_utils::{self, AudioDeviceType, DeviceSet};
use audiopal::extn::fm::FmFeature;
use audiopal::extn::hfp::HfpFeature;
use audiopal::extn::{AudioExtn, ExtnRouter, FeatureDescriptor, FeatureRegistration};
use audiopal::hal::devices::BtA2dp;
use audiopal::hal::mock::MockResourceManager;
use audiopal::hal::*;
use audiopal::{FeatureFlags, PalError};

fn extn(flags: FeatureFlags) -> (Arc<MockResourceManager>, AudioExtn) {
    let rm = Arc::new(MockResourceManager::new());
    let rm_dyn: Arc<dyn ResourceManager> = rm.clone();
    let registry = Arc::new(DeviceRegistry::with_defaults(flags));
    let extn = AudioExtn::new(registry, rm_dyn).unwrap();
    (rm, extn)
}

#[test]
fn test_inventory_collects_builtin_features() {
    let _ = (HfpFeature::default(), FmFeature::default());

    let mut descriptors: Vec<FeatureDescriptor> = Vec::new();
    for registration in inventory::iter::<FeatureRegistration> {
        descriptors.push((registration.0)());
    }

    let names: Vec<&str> = descriptors.iter().map(|d| d.name).collect();
    assert!(names.contains(&"hfp"), "hfp not registered");
    assert!(names.contains(&"fm"), "fm not registered");
    assert!(names.contains(&"a2dp"), "a2dp not registered");
}

#[test]
fn test_builtin_keys_do_not_collide() {
    assert!(ExtnRouter::from_inventory(&FeatureFlags::all()).is_ok());
}

#[test]
fn test_only_enabled_feature_handles_mixed_request() {
    let flags = FeatureFlags {
        fm: true,
        ..FeatureFlags::default()
    };
    let (_rm, extn) = extn(flags);

    extn.set_parameters("hfp_enable=true;handle_fm=2").unwrap();

    assert!(extn.fm_is_running());
    assert!(!extn.hfp_is_active());
    assert!(extn
        .context()
        .registry
        .get_object(DeviceId::OutBluetoothSco)
        .is_none());
}

#[test]
fn test_disabled_feature_query_is_neutral() {
    let (_rm, extn) = extn(FeatureFlags::default());

    assert_eq!(extn.get_parameters("hfp_enable;fm_status"), "");
    assert_eq!(
        extn.hfp_set_mic_mute(true),
        Err(PalError::FeatureDisabled("hfp"))
    );
}

#[test]
fn test_reply_accumulates_across_features() {
    let (_rm, extn) = extn(FeatureFlags::all());

    extn.set_parameters("handle_fm=2").unwrap();

    let reply = extn.get_parameters("hfp_enable;fm_status;unowned_key");
    assert_eq!(reply, "hfp_enable=false;fm_status=1");
}

#[test]
fn test_hfp_session_through_facade() {
    let (rm, extn) = extn(FeatureFlags::all());
    let mixer = rm.mixer().unwrap();

    extn.set_parameters("hfp_set_sampling_rate=16000;hfp_volume=0.25;hfp_enable=true")
        .unwrap();
    assert!(extn.hfp_is_active());
    extn.hfp_set_mic_mute(true).unwrap();
    assert_eq!(mixer.writes_to("HFP RX Volume"), vec![25]);

    extn.set_parameters("hfp_enable=false").unwrap();
    assert!(!extn.hfp_is_active());
    assert!(matches!(
        extn.hfp_set_mic_mute(true),
        Err(PalError::InvalidState(_))
    ));
}

#[test]
fn test_a2dp_keys_reach_live_device() {
    let (_rm, extn) = extn(FeatureFlags::all());
    let ctx = extn.context();
    let device = ctx
        .registry
        .get_instance(&DeviceAttributes::new(DeviceId::OutBluetoothA2dp), &ctx.rm)
        .unwrap();
    device
        .set_parameter(DeviceParam::A2dpConnection(true))
        .unwrap();

    extn.set_parameters("A2dpSuspended=true;TwsChannelConfig=mono")
        .unwrap();

    let bt = device.as_any().downcast_ref::<BtA2dp>().unwrap();
    assert!(bt.is_suspended());
    assert_eq!(
        device.get_parameter(ParamId::A2dpTwsMono).unwrap(),
        DeviceParam::A2dpTwsMono(true)
    );
    assert_eq!(
        extn.get_parameters("isReconfigA2dpSupported"),
        "isReconfigA2dpSupported=true"
    );
}

#[test]
fn test_battery_listener_follows_flag() {
    let (_rm, disabled) = extn(FeatureFlags::default());
    disabled.battery().notify(true);
    assert!(!disabled.battery().is_charging());

    let (_rm, enabled) = extn(FeatureFlags::all());
    let rx = enabled.battery().subscribe();
    enabled.battery().notify(true);
    assert!(enabled.battery().is_charging());
    assert_eq!(rx.try_recv(), Ok(true));
}

#[test]
fn test_device_set_helpers() {
    let devices: DeviceSet = [
        AudioDeviceType::OutSpeaker,
        AudioDeviceType::OutBluetoothScoHeadset,
    ]
    .into_iter()
    .collect();

    assert!(device_utils::audio_devices_cmp(&devices, AudioDeviceType::is_sco_out));
    assert!(!device_utils::audio_devices_cmp(&devices, |ty| ty.is_a2dp_out()));
    assert!(device_utils::audio_devices_contains(&devices, AudioDeviceType::OutSpeaker));
    assert_eq!(device_utils::get_device_types(&devices), 0x2 | 0x20);
    assert!(!device_utils::audio_devices_empty(&devices));
    assert!(device_utils::audio_devices_empty(&DeviceSet::new()));
}
