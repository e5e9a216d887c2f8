use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use super::devices;
use super::traits::{Device, ResourceManager};
use super::types::{DeviceAttributes, DeviceClass, DeviceId};
use crate::config::FeatureFlags;
use crate::{PalError, PalResult};

/// Builds a device for a class from a descriptor and the resolved flags
pub type DeviceFactory = Box<
    dyn Fn(&DeviceAttributes, Weak<dyn ResourceManager>, &FeatureFlags) -> PalResult<Arc<dyn Device>>
        + Send
        + Sync,
>;

/// Owns the one live instance per device id.
///
/// The first `get_instance` for an id picks the implementation from the flags
/// captured when the registry was built and stores it; later calls return
/// that instance whatever descriptor they pass. Hardware paths are opened once
/// and shared by every stream of the device.
pub struct DeviceRegistry {
    flags: FeatureFlags,
    factories: HashMap<DeviceClass, DeviceFactory>,
    slots: Mutex<HashMap<DeviceId, Arc<dyn Device>>>,
}

impl DeviceRegistry {
    /// Empty registry; register factories before use
    pub fn new(flags: FeatureFlags) -> Self {
        Self {
            flags,
            factories: HashMap::new(),
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Registry with the built-in haptics, Bluetooth and FM devices
    pub fn with_defaults(flags: FeatureFlags) -> Self {
        let mut registry = Self::new(flags);
        registry.register_factory(DeviceClass::Haptics, devices::haptics::create);
        registry.register_factory(DeviceClass::A2dp, devices::bluetooth::create_a2dp);
        registry.register_factory(DeviceClass::Sco, devices::bluetooth::sco_factory());
        registry.register_factory(DeviceClass::Fm, devices::fm::create);
        registry
    }

    pub fn register_factory<F>(&mut self, class: DeviceClass, factory: F)
    where
        F: Fn(&DeviceAttributes, Weak<dyn ResourceManager>, &FeatureFlags) -> PalResult<Arc<dyn Device>>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(class, Box::new(factory));
    }

    pub fn flags(&self) -> &FeatureFlags {
        &self.flags
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<DeviceId, Arc<dyn Device>>> {
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Return the instance for `descriptor.id`, constructing it on first use.
    ///
    /// Check and construction happen under one lock, so racing callers get a
    /// single instance. A failed construction leaves the slot empty and the
    /// next call tries again.
    pub fn get_instance(
        &self,
        descriptor: &DeviceAttributes,
        rm: &Arc<dyn ResourceManager>,
    ) -> PalResult<Arc<dyn Device>> {
        let mut slots = self.slots();
        if let Some(device) = slots.get(&descriptor.id) {
            return Ok(device.clone());
        }

        let class = descriptor.id.class();
        let factory = self
            .factories
            .get(&class)
            .ok_or(PalError::UnknownDevice(descriptor.id))?;

        log::info!("creating instance for {:?}", descriptor.id);
        let device = factory(descriptor, Arc::downgrade(rm), &self.flags).map_err(|e| {
            log::error!("failed to create {:?}: {}", descriptor.id, e);
            e
        })?;

        slots.insert(descriptor.id, device.clone());
        Ok(device)
    }

    /// Existing instance for `id`, never constructs
    pub fn get_object(&self, id: DeviceId) -> Option<Arc<dyn Device>> {
        self.slots().get(&id).cloned()
    }

    /// Drop the registry's reference to `id`'s instance. Callers still
    /// holding the old instance keep it alive.
    pub fn reset(&self, id: DeviceId) -> Option<Arc<dyn Device>> {
        let removed = self.slots().remove(&id);
        if removed.is_some() {
            log::info!("reset instance for {:?}", id);
        }
        removed
    }

    pub fn reset_all(&self) {
        self.slots().clear();
    }

    pub fn live_devices(&self) -> Vec<DeviceId> {
        let mut ids: Vec<DeviceId> = self.slots().keys().copied().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::mock::MockResourceManager;
    use crate::hal::DeviceVariant;

    fn rm() -> Arc<dyn ResourceManager> {
        Arc::new(MockResourceManager::new())
    }

    #[test]
    fn test_get_object_never_constructs() {
        let registry = DeviceRegistry::with_defaults(FeatureFlags::default());
        assert!(registry.get_object(DeviceId::OutHaptics).is_none());
        assert!(registry.live_devices().is_empty());
    }

    #[test]
    fn test_second_call_returns_same_instance() {
        let registry = DeviceRegistry::with_defaults(FeatureFlags::default());
        let rm = rm();

        let first = registry
            .get_instance(&DeviceAttributes::new(DeviceId::OutHaptics), &rm)
            .unwrap();
        let second = registry
            .get_instance(
                &DeviceAttributes::with_config(DeviceId::OutHaptics, 8000, 2, 24),
                &rm,
            )
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.attributes().sample_rate, 48000);
        assert!(Arc::ptr_eq(
            &first,
            &registry.get_object(DeviceId::OutHaptics).unwrap()
        ));
    }

    #[test]
    fn test_failed_construction_leaves_slot_empty() {
        let registry = DeviceRegistry::with_defaults(FeatureFlags::default());
        let rm = rm();

        let bad = DeviceAttributes::with_config(DeviceId::OutHaptics, 44100, 1, 16);
        assert!(registry.get_instance(&bad, &rm).is_err());
        assert!(registry.get_object(DeviceId::OutHaptics).is_none());

        let good = DeviceAttributes::new(DeviceId::OutHaptics);
        assert!(registry.get_instance(&good, &rm).is_ok());
    }

    #[test]
    fn test_unregistered_class() {
        let registry = DeviceRegistry::new(FeatureFlags::default());
        let result = registry.get_instance(&DeviceAttributes::new(DeviceId::InFmTuner), &rm());

        assert!(matches!(result, Err(PalError::UnknownDevice(DeviceId::InFmTuner))));
    }

    #[test]
    fn test_variant_fixed_by_flags_at_build_time() {
        let registry = DeviceRegistry::with_defaults(FeatureFlags {
            haptics_protection: true,
            haptics_through_wsa: false,
            ..FeatureFlags::default()
        });

        let device = registry
            .get_instance(&DeviceAttributes::new(DeviceId::OutHaptics), &rm())
            .unwrap();
        assert_eq!(device.variant(), DeviceVariant::Plain);
    }

    #[test]
    fn test_reset_allows_fresh_construction() {
        let registry = DeviceRegistry::with_defaults(FeatureFlags::default());
        let rm = rm();
        let descriptor = DeviceAttributes::new(DeviceId::InFmTuner);

        let first = registry.get_instance(&descriptor, &rm).unwrap();
        assert!(registry.reset(DeviceId::InFmTuner).is_some());
        assert!(registry.get_object(DeviceId::InFmTuner).is_none());

        let second = registry.get_instance(&descriptor, &rm).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }
}
