use std::any::Any;
use std::sync::Arc;

use super::params::StrParms;
use crate::hal::{DeviceRegistry, ResourceManager};
use crate::PalResult;

/// Collaborators every feature handler may reach.
#[derive(Clone)]
pub struct ExtnContext {
    pub registry: Arc<DeviceRegistry>,
    pub rm: Arc<dyn ResourceManager>,
}

impl ExtnContext {
    pub fn new(registry: Arc<DeviceRegistry>, rm: Arc<dyn ResourceManager>) -> Self {
        Self { registry, rm }
    }
}

pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any + Send> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// An optional capability reachable through the parameter protocol.
///
/// Handlers receive the whole request map and pick out the keys they own.
/// The router serializes calls into one feature instance.
pub trait ExtnFeature: AsAny + Send {
    fn init(&mut self, _ctx: &ExtnContext) {}

    fn deinit(&mut self, _ctx: &ExtnContext) {}

    fn set_parameters(&mut self, ctx: &ExtnContext, parms: &StrParms) -> PalResult<()>;

    fn get_parameters(&mut self, ctx: &ExtnContext, query: &StrParms, reply: &mut StrParms);
}

/// Static description of a feature, produced by `#[derive(RegisterFeature)]`
#[derive(Clone, Copy)]
pub struct FeatureDescriptor {
    pub name: &'static str,
    pub keys: &'static [&'static str],
    pub prefixes: &'static [&'static str],
    pub factory: fn() -> Box<dyn ExtnFeature>,
}

impl FeatureDescriptor {
    pub fn owns(&self, key: &str) -> bool {
        self.keys.contains(&key) || self.prefixes.iter().any(|p| key.starts_with(p))
    }
}

pub struct FeatureRegistration(pub fn() -> FeatureDescriptor);

inventory::collect!(FeatureRegistration);
