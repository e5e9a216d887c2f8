use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::feature::{ExtnContext, ExtnFeature, FeatureDescriptor, FeatureRegistration};
use super::params::StrParms;
use crate::config::FeatureFlags;
use crate::{PalError, PalResult};

struct FeatureSlot {
    descriptor: FeatureDescriptor,
    enabled: bool,
    feature: Mutex<Box<dyn ExtnFeature>>,
}

impl FeatureSlot {
    fn lock(&self) -> MutexGuard<'_, Box<dyn ExtnFeature>> {
        self.feature
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Routes parameter keys to the feature that owns them.
///
/// Built once. Exact keys are looked up in a table; anything else is matched
/// against the owned prefixes. A request reaches each owning feature at most
/// once, with the full map.
pub struct ExtnRouter {
    slots: Vec<FeatureSlot>,
    keys: HashMap<&'static str, usize>,
    prefixes: Vec<(&'static str, usize)>,
}

pub struct ExtnRouterBuilder {
    entries: Vec<(FeatureDescriptor, bool)>,
}

impl ExtnRouterBuilder {
    pub fn register(mut self, descriptor: FeatureDescriptor, enabled: bool) -> Self {
        self.entries.push((descriptor, enabled));
        self
    }

    /// Fails if two features claim the same key, overlapping prefixes, or a
    /// key inside another feature's prefix
    pub fn build(self) -> PalResult<ExtnRouter> {
        let mut keys: HashMap<&'static str, usize> = HashMap::new();
        let mut prefixes: Vec<(&'static str, usize)> = Vec::new();
        let mut slots = Vec::with_capacity(self.entries.len());

        for (index, (descriptor, enabled)) in self.entries.into_iter().enumerate() {
            if slots
                .iter()
                .any(|s: &FeatureSlot| s.descriptor.name == descriptor.name)
            {
                return Err(PalError::InvalidParam(format!(
                    "feature '{}' registered twice",
                    descriptor.name
                )));
            }

            for &key in descriptor.keys {
                if let Some(owner) = keys.insert(key, index) {
                    return Err(duplicate(key, &slots, owner, &descriptor));
                }
                // A key inside another feature's prefix namespace
                let shadowed = prefixes
                    .iter()
                    .find(|&&(p, owner)| owner != index && key.starts_with(p));
                if let Some(&(_, owner)) = shadowed {
                    return Err(duplicate(key, &slots, owner, &descriptor));
                }
            }

            for &prefix in descriptor.prefixes {
                let clash = prefixes
                    .iter()
                    .find(|(p, _)| p.starts_with(prefix) || prefix.starts_with(*p));
                if let Some(&(_, owner)) = clash {
                    return Err(duplicate(prefix, &slots, owner, &descriptor));
                }
                let shadowed = keys
                    .iter()
                    .find(|&(k, &owner)| owner != index && k.starts_with(prefix));
                if let Some((_, &owner)) = shadowed {
                    return Err(duplicate(prefix, &slots, owner, &descriptor));
                }
                prefixes.push((prefix, index));
            }

            log::info!(
                "extension '{}' {}",
                descriptor.name,
                if enabled { "enabled" } else { "disabled" }
            );
            slots.push(FeatureSlot {
                descriptor,
                enabled,
                feature: Mutex::new((descriptor.factory)()),
            });
        }

        // Longest prefix first
        prefixes.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        Ok(ExtnRouter {
            slots,
            keys,
            prefixes,
        })
    }
}

fn duplicate(
    key: &str,
    slots: &[FeatureSlot],
    owner: usize,
    descriptor: &FeatureDescriptor,
) -> PalError {
    let owner_name = slots
        .get(owner)
        .map(|s| s.descriptor.name)
        .unwrap_or(descriptor.name);
    log::error!(
        "key '{}' claimed by both '{}' and '{}'",
        key,
        owner_name,
        descriptor.name
    );
    PalError::InvalidParam(format!(
        "key '{}' claimed by '{}' and '{}'",
        key, owner_name, descriptor.name
    ))
}

impl ExtnRouter {
    pub fn builder() -> ExtnRouterBuilder {
        ExtnRouterBuilder {
            entries: Vec::new(),
        }
    }

    /// Router over every feature linked into the binary, enabled per `flags`
    pub fn from_inventory(flags: &FeatureFlags) -> PalResult<Self> {
        let mut descriptors = Vec::new();
        for registration in inventory::iter::<FeatureRegistration> {
            descriptors.push((registration.0)());
        }
        descriptors.sort_by_key(|d: &FeatureDescriptor| d.name);

        let mut builder = Self::builder();
        for descriptor in descriptors {
            let enabled = flags.feature_enabled(descriptor.name);
            builder = builder.register(descriptor, enabled);
        }
        builder.build()
    }

    pub fn feature_names(&self) -> Vec<&'static str> {
        self.slots.iter().map(|s| s.descriptor.name).collect()
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.slots
            .iter()
            .any(|s| s.descriptor.name == name && s.enabled)
    }

    /// Name of the feature owning `key`, enabled or not
    pub fn owner_of(&self, key: &str) -> Option<&'static str> {
        self.resolve(key).map(|index| self.slots[index].descriptor.name)
    }

    fn resolve(&self, key: &str) -> Option<usize> {
        if let Some(&index) = self.keys.get(key) {
            return Some(index);
        }
        self.prefixes
            .iter()
            .find(|(prefix, _)| key.starts_with(prefix))
            .map(|&(_, index)| index)
    }

    /// Enabled features owning at least one key of `parms`, in request order
    fn targets(&self, parms: &StrParms) -> Vec<usize> {
        let mut targets = Vec::new();
        for key in parms.keys() {
            let Some(index) = self.resolve(key) else {
                continue;
            };
            if !self.slots[index].enabled {
                log::debug!(
                    "ignoring '{}': extension '{}' disabled",
                    key,
                    self.slots[index].descriptor.name
                );
                continue;
            }
            if !targets.contains(&index) {
                targets.push(index);
            }
        }
        targets
    }

    pub fn init_all(&self, ctx: &ExtnContext) {
        for slot in self.slots.iter().filter(|s| s.enabled) {
            slot.lock().init(ctx);
        }
    }

    pub fn deinit_all(&self, ctx: &ExtnContext) {
        for slot in self.slots.iter().filter(|s| s.enabled) {
            slot.lock().deinit(ctx);
        }
    }

    /// Hand `parms` to every enabled owning feature. All handlers run; the
    /// first error is returned.
    pub fn set_parameters(&self, ctx: &ExtnContext, parms: &StrParms) -> PalResult<()> {
        let mut result = Ok(());
        for index in self.targets(parms) {
            let slot = &self.slots[index];
            if let Err(e) = slot.lock().set_parameters(ctx, parms) {
                log::error!("extension '{}' set failed: {}", slot.descriptor.name, e);
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }

    /// Collect replies from every enabled owning feature into `reply`
    pub fn get_parameters(&self, ctx: &ExtnContext, query: &StrParms, reply: &mut StrParms) {
        for index in self.targets(query) {
            self.slots[index].lock().get_parameters(ctx, query, reply);
        }
    }

    /// Run `f` against the feature of concrete type `T`. `None` when the
    /// feature is absent or disabled.
    pub fn with_feature<T, R, F>(&self, f: F) -> Option<R>
    where
        T: ExtnFeature + 'static,
        F: FnOnce(&mut T) -> R,
    {
        for slot in self.slots.iter().filter(|s| s.enabled) {
            let mut guard = slot.lock();
            let feature: &mut dyn ExtnFeature = &mut **guard;
            if let Some(concrete) = feature.as_any_mut().downcast_mut::<T>() {
                return Some(f(concrete));
            }
        }
        None
    }
}
