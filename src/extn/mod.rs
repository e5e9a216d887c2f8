//! Optional audio features reached through the `key=value` parameter
//! protocol, plus the battery listener.

pub mod a2dp;
pub mod battery;
pub mod device_utils;
pub mod feature;
pub mod fm;
pub mod hfp;
pub mod params;
pub mod router;

use std::sync::Arc;

pub use battery::BatteryListener;
pub use feature::{AsAny, ExtnContext, ExtnFeature, FeatureDescriptor, FeatureRegistration};
pub use params::StrParms;
pub use router::{ExtnRouter, ExtnRouterBuilder};

use crate::config::FeatureFlags;
use crate::hal::{DeviceRegistry, ResourceManager};
use crate::{PalError, PalResult};

/// Entry point for the framework's parameter strings.
pub struct AudioExtn {
    ctx: ExtnContext,
    router: ExtnRouter,
    battery: BatteryListener,
}

impl AudioExtn {
    /// Build the router from every registered feature and run the init hook
    /// of each enabled one.
    pub fn new(registry: Arc<DeviceRegistry>, rm: Arc<dyn ResourceManager>) -> PalResult<Self> {
        let flags = *registry.flags();
        let router = ExtnRouter::from_inventory(&flags)?;
        Ok(Self::with_router(registry, rm, router, &flags))
    }

    pub fn with_router(
        registry: Arc<DeviceRegistry>,
        rm: Arc<dyn ResourceManager>,
        router: ExtnRouter,
        flags: &FeatureFlags,
    ) -> Self {
        let ctx = ExtnContext::new(registry, rm);
        router.init_all(&ctx);

        let battery = BatteryListener::new();
        battery.init(flags.battery_listener);

        Self {
            ctx,
            router,
            battery,
        }
    }

    pub fn context(&self) -> &ExtnContext {
        &self.ctx
    }

    pub fn router(&self) -> &ExtnRouter {
        &self.router
    }

    pub fn battery(&self) -> &BatteryListener {
        &self.battery
    }

    pub fn set_parameters(&self, kvpairs: &str) -> PalResult<()> {
        let parms = StrParms::parse(kvpairs);
        log::debug!("set_parameters: {}", parms);
        self.router.set_parameters(&self.ctx, &parms)
    }

    /// Reply string for the keys in `keys`. Keys no enabled feature owns
    /// are left out of the reply.
    pub fn get_parameters(&self, keys: &str) -> String {
        let query = StrParms::parse(keys);
        let mut reply = StrParms::new();
        self.router.get_parameters(&self.ctx, &query, &mut reply);
        reply.to_string()
    }

    /// False when HFP is disabled or inactive
    pub fn hfp_is_active(&self) -> bool {
        self.router
            .with_feature::<hfp::HfpFeature, _, _>(|hfp| hfp.is_active())
            .unwrap_or(false)
    }

    pub fn hfp_set_mic_mute(&self, mute: bool) -> PalResult<()> {
        self.router
            .with_feature::<hfp::HfpFeature, _, _>(|hfp| hfp.set_mic_mute(mute))
            .unwrap_or(Err(PalError::FeatureDisabled("hfp")))
    }

    pub fn fm_is_running(&self) -> bool {
        self.router
            .with_feature::<fm::FmFeature, _, _>(|fm| fm.is_running())
            .unwrap_or(false)
    }
}

impl Drop for AudioExtn {
    fn drop(&mut self) {
        self.router.deinit_all(&self.ctx);
        self.battery.deinit();
    }
}
