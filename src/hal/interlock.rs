use super::traits::ResourceManager;
use super::types::DeviceId;
use crate::PalError;

/// What happened to a runtime change after the interlock looked at the
/// device's active streams
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// No stream bound; the value takes effect when the path is next opened
    Deferred,
    /// Written to hardware
    Applied,
    /// Streams were active but the hardware write failed
    Failed(PalError),
}

/// Apply a hardware change only if `device` has active streams.
///
/// The stream set is re-queried on every call and `apply` runs while the
/// resource manager's stream lock is held, so a stream being torn down
/// concurrently cannot be written to.
pub fn apply_if_active<F>(rm: &dyn ResourceManager, device: DeviceId, apply: F) -> ApplyOutcome
where
    F: FnOnce(&dyn ResourceManager) -> Result<(), PalError>,
{
    let mut apply = Some(apply);
    let mut outcome = ApplyOutcome::Deferred;

    let status = rm.with_active_streams(device, &mut |streams| {
        if streams.is_empty() {
            log::debug!("no active stream available on {:?}", device);
            return;
        }
        if let Some(apply) = apply.take() {
            outcome = match apply(rm) {
                Ok(()) => ApplyOutcome::Applied,
                Err(e) => ApplyOutcome::Failed(e),
            };
        }
    });

    if let Err(e) = status {
        log::debug!("active stream query for {:?} failed: {}", device, e);
        return ApplyOutcome::Deferred;
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::mock::MockResourceManager;

    #[test]
    fn test_defers_without_streams() {
        let rm = MockResourceManager::new();
        let mut called = false;

        let outcome = apply_if_active(&rm, DeviceId::OutHaptics, |_| {
            called = true;
            Ok(())
        });

        assert_eq!(outcome, ApplyOutcome::Deferred);
        assert!(!called);
    }

    #[test]
    fn test_applies_with_streams() {
        let rm = MockResourceManager::new();
        rm.attach_stream(DeviceId::OutHaptics);

        let outcome = apply_if_active(&rm, DeviceId::OutHaptics, |_| Ok(()));
        assert_eq!(outcome, ApplyOutcome::Applied);
    }

    #[test]
    fn test_streams_on_other_device_do_not_count() {
        let rm = MockResourceManager::new();
        rm.attach_stream(DeviceId::OutBluetoothA2dp);

        let outcome = apply_if_active(&rm, DeviceId::OutHaptics, |_| Ok(()));
        assert_eq!(outcome, ApplyOutcome::Deferred);
    }

    #[test]
    fn test_reports_failed_write() {
        let rm = MockResourceManager::new();
        rm.attach_stream(DeviceId::OutHaptics);

        let outcome = apply_if_active(&rm, DeviceId::OutHaptics, |_| Err(PalError::MixerUnavailable));
        assert_eq!(outcome, ApplyOutcome::Failed(PalError::MixerUnavailable));
    }
}
