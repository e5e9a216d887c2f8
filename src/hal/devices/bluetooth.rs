use std::any::Any;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::config::FeatureFlags;
use crate::hal::interlock::{self, ApplyOutcome};
use crate::hal::lifecycle::DeviceCore;
use crate::hal::mixer;
use crate::hal::registry::DeviceFactory;
use crate::hal::traits::{Device, ResourceManager};
use crate::hal::types::{DeviceAttributes, DeviceId, DeviceParam, DeviceState, ParamId};
use crate::{PalError, PalResult};

pub const A2DP_SUSPEND_CTL: &str = "BT A2DP Suspend";
pub const SCO_NREC_CTL: &str = "BT SCO NREC";

pub const SCO_NB_SAMPLE_RATE: u32 = 8000;
pub const SCO_WB_SAMPLE_RATE: u32 = 16000;
pub const SCO_SWB_SAMPLE_RATE: u32 = 96000;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_through_interlock(core: &DeviceCore, control: &'static str, value: i64) {
    let rm = match core.rm() {
        Ok(rm) => rm,
        Err(e) => {
            log::error!("{} stored but not applied: {}", control, e);
            return;
        }
    };
    match interlock::apply_if_active(rm.as_ref(), core.id(), |rm| {
        mixer::set_control_value(rm, control, value)
    }) {
        ApplyOutcome::Applied => log::debug!("{} set to {}", control, value),
        ApplyOutcome::Deferred => {}
        ApplyOutcome::Failed(e) => log::error!("{} write failed: {}", control, e),
    }
}

// ---------------------------------------------------------------------------
// A2DP / LE audio
// ---------------------------------------------------------------------------

pub fn create_a2dp(
    descriptor: &DeviceAttributes,
    rm: Weak<dyn ResourceManager>,
    _flags: &FeatureFlags,
) -> PalResult<Arc<dyn Device>> {
    Ok(Arc::new(BtA2dp::new(descriptor, rm)?))
}

#[derive(Debug, Default, Clone, Copy)]
struct A2dpState {
    connected: bool,
    suspended: bool,
    reconfig: bool,
    tws_mono: bool,
    lc3_mono: bool,
}

/// A2DP and LE audio endpoints. Each direction/transport id is its own
/// instance.
pub struct BtA2dp {
    core: DeviceCore,
    state: Mutex<A2dpState>,
}

impl BtA2dp {
    pub fn new(descriptor: &DeviceAttributes, rm: Weak<dyn ResourceManager>) -> PalResult<Self> {
        Ok(Self {
            core: DeviceCore::new(descriptor, rm)?,
            state: Mutex::new(A2dpState::default()),
        })
    }

    pub fn is_suspended(&self) -> bool {
        lock(&self.state).suspended
    }

    pub fn is_connected(&self) -> bool {
        lock(&self.state).connected
    }
}

impl Device for BtA2dp {
    fn id(&self) -> DeviceId {
        self.core.id()
    }

    fn attributes(&self) -> DeviceAttributes {
        self.core.attributes()
    }

    fn state(&self) -> DeviceState {
        self.core.state()
    }

    fn open(&self) -> PalResult<()> {
        self.core.open()
    }

    fn start(&self) -> PalResult<()> {
        let state = lock(&self.state);
        if !state.connected || state.suspended {
            log::error!(
                "{:?} not ready: connected {} suspended {}",
                self.id(),
                state.connected,
                state.suspended
            );
            return Err(PalError::InvalidState("a2dp not ready".to_string()));
        }
        self.core.start()
    }

    fn stop(&self) -> PalResult<()> {
        self.core.stop()
    }

    fn close(&self) -> PalResult<()> {
        self.core.close()
    }

    fn set_parameter(&self, param: DeviceParam) -> PalResult<()> {
        let mut state = lock(&self.state);
        match param {
            DeviceParam::A2dpConnection(connected) => {
                state.connected = connected;
                if !connected {
                    state.suspended = false;
                    state.reconfig = false;
                }
            }
            DeviceParam::A2dpSuspended(suspended) => {
                state.suspended = suspended;
                write_through_interlock(&self.core, A2DP_SUSPEND_CTL, i64::from(suspended));
            }
            DeviceParam::A2dpReconfig(reconfig) => state.reconfig = reconfig,
            DeviceParam::A2dpTwsMono(mono) => state.tws_mono = mono,
            DeviceParam::A2dpLc3Mono(mono) => state.lc3_mono = mono,
            other => {
                return Err(PalError::InvalidParam(format!(
                    "{:?} not handled by a2dp",
                    other.id()
                )))
            }
        }
        log::info!("{:?} {:?}", self.id(), param);
        Ok(())
    }

    fn get_parameter(&self, id: ParamId) -> PalResult<DeviceParam> {
        let state = lock(&self.state);
        match id {
            ParamId::A2dpConnection => Ok(DeviceParam::A2dpConnection(state.connected)),
            ParamId::A2dpSuspended => Ok(DeviceParam::A2dpSuspended(state.suspended)),
            ParamId::A2dpReconfig => Ok(DeviceParam::A2dpReconfig(state.reconfig)),
            ParamId::A2dpReconfigSupported => {
                Ok(DeviceParam::A2dpReconfigSupported(state.connected))
            }
            ParamId::A2dpTwsMono => Ok(DeviceParam::A2dpTwsMono(state.tws_mono)),
            ParamId::A2dpLc3Mono => Ok(DeviceParam::A2dpLc3Mono(state.lc3_mono)),
            other => Err(PalError::InvalidParam(format!(
                "{:?} not handled by a2dp",
                other
            ))),
        }
    }

    fn is_device_ready(&self) -> bool {
        let state = lock(&self.state);
        state.connected && !state.suspended
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// SCO (HFP voice path)
// ---------------------------------------------------------------------------

/// Link state shared by the SCO RX and TX instances
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScoLinkState {
    pub sco_on: bool,
    pub wideband: bool,
    pub swb_mode: Option<u32>,
    pub nrec: bool,
}

impl ScoLinkState {
    pub fn sample_rate(&self) -> u32 {
        if self.wideband {
            SCO_WB_SAMPLE_RATE
        } else if self.swb_mode.is_some() {
            SCO_SWB_SAMPLE_RATE
        } else {
            SCO_NB_SAMPLE_RATE
        }
    }
}

/// Registry factory for SCO devices. Both directions built by one factory
/// share a single link state.
pub fn sco_factory() -> DeviceFactory {
    let link = Arc::new(Mutex::new(ScoLinkState::default()));
    Box::new(
        move |descriptor: &DeviceAttributes,
              rm: Weak<dyn ResourceManager>,
              _flags: &FeatureFlags|
              -> PalResult<Arc<dyn Device>> {
            Ok(Arc::new(BtSco::new(descriptor, rm, link.clone())?))
        },
    )
}

pub struct BtSco {
    core: DeviceCore,
    link: Arc<Mutex<ScoLinkState>>,
}

impl BtSco {
    pub fn new(
        descriptor: &DeviceAttributes,
        rm: Weak<dyn ResourceManager>,
        link: Arc<Mutex<ScoLinkState>>,
    ) -> PalResult<Self> {
        Ok(Self {
            core: DeviceCore::new(descriptor, rm)?,
            link,
        })
    }

    pub fn link_state(&self) -> ScoLinkState {
        *lock(&self.link)
    }

    /// Sample rate the link runs at for the negotiated speech mode
    pub fn updated_sample_rate(&self) -> u32 {
        lock(&self.link).sample_rate()
    }
}

impl Device for BtSco {
    fn id(&self) -> DeviceId {
        self.core.id()
    }

    fn attributes(&self) -> DeviceAttributes {
        self.core.attributes()
    }

    fn state(&self) -> DeviceState {
        self.core.state()
    }

    fn open(&self) -> PalResult<()> {
        self.core.open()
    }

    fn start(&self) -> PalResult<()> {
        let link = lock(&self.link);
        if !link.sco_on {
            log::error!("{:?} not ready: sco is off", self.id());
            return Err(PalError::InvalidState("sco not ready".to_string()));
        }
        self.core.set_sample_rate(link.sample_rate());
        self.core.start()
    }

    fn stop(&self) -> PalResult<()> {
        self.core.stop()
    }

    fn close(&self) -> PalResult<()> {
        self.core.close()
    }

    fn set_parameter(&self, param: DeviceParam) -> PalResult<()> {
        let mut link = lock(&self.link);
        match param {
            DeviceParam::ScoOn(on) => link.sco_on = on,
            DeviceParam::ScoWideband(enabled) => link.wideband = enabled,
            DeviceParam::ScoSuperWideband(mode) => link.swb_mode = mode,
            DeviceParam::ScoNrec(enabled) => {
                link.nrec = enabled;
                write_through_interlock(&self.core, SCO_NREC_CTL, i64::from(enabled));
            }
            other => {
                return Err(PalError::InvalidParam(format!(
                    "{:?} not handled by sco",
                    other.id()
                )))
            }
        }
        log::debug!("{:?} {:?}", self.id(), param);
        Ok(())
    }

    fn get_parameter(&self, id: ParamId) -> PalResult<DeviceParam> {
        let link = lock(&self.link);
        match id {
            ParamId::ScoOn => Ok(DeviceParam::ScoOn(link.sco_on)),
            ParamId::ScoWideband => Ok(DeviceParam::ScoWideband(link.wideband)),
            ParamId::ScoSuperWideband => Ok(DeviceParam::ScoSuperWideband(link.swb_mode)),
            ParamId::ScoNrec => Ok(DeviceParam::ScoNrec(link.nrec)),
            other => Err(PalError::InvalidParam(format!(
                "{:?} not handled by sco",
                other
            ))),
        }
    }

    fn is_device_ready(&self) -> bool {
        lock(&self.link).sco_on
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::mock::MockResourceManager;

    fn dyn_rm(rm: &Arc<MockResourceManager>) -> Arc<dyn ResourceManager> {
        rm.clone()
    }

    #[test]
    fn test_a2dp_start_requires_connection() {
        let rm = Arc::new(MockResourceManager::new());
        let rm_dyn = dyn_rm(&rm);
        let dev = BtA2dp::new(
            &DeviceAttributes::new(DeviceId::OutBluetoothA2dp),
            Arc::downgrade(&rm_dyn),
        )
        .unwrap();

        dev.open().unwrap();
        assert!(dev.start().is_err());

        dev.set_parameter(DeviceParam::A2dpConnection(true)).unwrap();
        dev.start().unwrap();
        assert_eq!(dev.state(), DeviceState::Running);
        assert_eq!(
            dev.get_parameter(ParamId::A2dpReconfigSupported).unwrap(),
            DeviceParam::A2dpReconfigSupported(true)
        );
    }

    #[test]
    fn test_a2dp_suspend_goes_through_interlock() {
        let rm = Arc::new(MockResourceManager::new());
        let rm_dyn = dyn_rm(&rm);
        let dev = BtA2dp::new(
            &DeviceAttributes::new(DeviceId::OutBluetoothA2dp),
            Arc::downgrade(&rm_dyn),
        )
        .unwrap();
        let mixer = rm.mixer().unwrap();

        dev.set_parameter(DeviceParam::A2dpSuspended(true)).unwrap();
        assert!(mixer.writes_to(A2DP_SUSPEND_CTL).is_empty());
        assert!(dev.is_suspended());

        rm.attach_stream(DeviceId::OutBluetoothA2dp);
        dev.set_parameter(DeviceParam::A2dpSuspended(false)).unwrap();
        assert_eq!(mixer.writes_to(A2DP_SUSPEND_CTL), vec![0]);
    }

    #[test]
    fn test_sco_instances_share_link_state() {
        let rm = Arc::new(MockResourceManager::new());
        let rm_dyn = dyn_rm(&rm);
        let factory = sco_factory();
        let flags = FeatureFlags::default();

        let rx = factory(
            &DeviceAttributes::new(DeviceId::OutBluetoothSco),
            Arc::downgrade(&rm_dyn),
            &flags,
        )
        .unwrap();
        let tx = factory(
            &DeviceAttributes::new(DeviceId::InBluetoothScoHeadset),
            Arc::downgrade(&rm_dyn),
            &flags,
        )
        .unwrap();

        rx.set_parameter(DeviceParam::ScoOn(true)).unwrap();
        rx.set_parameter(DeviceParam::ScoWideband(true)).unwrap();

        assert!(tx.is_device_ready());
        let tx_sco = tx.as_any().downcast_ref::<BtSco>().unwrap();
        assert_eq!(tx_sco.updated_sample_rate(), SCO_WB_SAMPLE_RATE);
    }

    #[test]
    fn test_sco_sample_rate_selection() {
        let mut link = ScoLinkState::default();
        assert_eq!(link.sample_rate(), SCO_NB_SAMPLE_RATE);

        link.swb_mode = Some(1);
        assert_eq!(link.sample_rate(), SCO_SWB_SAMPLE_RATE);

        link.wideband = true;
        assert_eq!(link.sample_rate(), SCO_WB_SAMPLE_RATE);
    }

    #[test]
    fn test_sco_start_applies_link_rate() {
        let rm = Arc::new(MockResourceManager::new());
        let rm_dyn = dyn_rm(&rm);
        let link = Arc::new(Mutex::new(ScoLinkState::default()));
        let dev = BtSco::new(
            &DeviceAttributes::new(DeviceId::OutBluetoothSco),
            Arc::downgrade(&rm_dyn),
            link,
        )
        .unwrap();

        dev.open().unwrap();
        assert!(dev.start().is_err());

        dev.set_parameter(DeviceParam::ScoOn(true)).unwrap();
        dev.set_parameter(DeviceParam::ScoWideband(true)).unwrap();
        dev.start().unwrap();
        assert_eq!(dev.attributes().sample_rate, SCO_WB_SAMPLE_RATE);
    }
}
