use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use audiopal::codec::{self, AacFormat};
use audiopal::extn::AudioExtn;
use audiopal::hal::mock::{MockResourceManager, RecordingSession};
use audiopal::hal::{
    Device, DeviceAttributes, DeviceId, DeviceParam, DeviceRegistry, HapticSource,
    ResourceManager,
};
use audiopal::PalConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("audiopal device core demo");
    println!("=========================\n");

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("audiopal").join("pal.json"));
    let config = PalConfig::load(&path)?;
    println!("config {:?}: {:?}\n", path, config.features);

    let mock_rm = Arc::new(MockResourceManager::new());
    let rm: Arc<dyn ResourceManager> = mock_rm.clone();
    let registry = Arc::new(DeviceRegistry::with_defaults(config.features));

    // Racing first use of the haptics device
    let mut handles = Vec::new();
    for i in 0..4 {
        let registry = registry.clone();
        let rm = rm.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            let device =
                registry.get_instance(&DeviceAttributes::new(DeviceId::OutHaptics), &rm)?;
            let source = if i % 2 == 0 {
                HapticSource::Ach
            } else {
                HapticSource::A2h
            };
            device.set_parameter(DeviceParam::HapticSource(source))?;
            Ok::<_, audiopal::PalError>(device.variant())
        }));
    }
    for handle in handles {
        let variant = handle.await.context("haptics task panicked")??;
        println!("haptics variant: {:?}", variant);
    }
    println!("live devices: {:?}\n", registry.live_devices());

    // Extension parameters
    let extn = AudioExtn::new(registry.clone(), rm.clone())?;
    println!("extensions: {:?}", extn.router().feature_names());
    for kvpairs in ["hfp_volume=0.6;hfp_enable=true", "handle_fm=2;fm_volume=0.3"] {
        match extn.set_parameters(kvpairs) {
            Ok(()) => println!("set '{}'", kvpairs),
            Err(e) => println!("set '{}' failed: {}", kvpairs, e),
        }
    }
    println!(
        "get: '{}'",
        extn.get_parameters("hfp_enable;fm_status;isReconfigA2dpSupported")
    );
    if let Some(mixer) = mock_rm.mixer() {
        println!("mixer writes: {:?}\n", mixer.writes());
    }

    // Compressed capture
    match codec::open_aac_capture(&config.features, AacFormat::Lc, 44100, 1) {
        Ok(mut aac) => {
            let mut session = RecordingSession::new();
            aac.set_dsp_bitrate(64000)?;
            aac.configure(&mut session)?;
            for _ in 0..10 {
                aac.record_read();
            }
            println!(
                "aac bounds {:?}, frames read {}, applied {:?}",
                aac.bitrate_bounds(),
                aac.frames_read(),
                session.applied()
            );
        }
        Err(e) => println!("aac capture unavailable: {}", e),
    }

    Ok(())
}
