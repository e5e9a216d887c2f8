use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::MockMixer;
use crate::hal::traits::{Mixer, ResourceManager};
use crate::hal::types::{DeviceId, StreamHandle};
use crate::{PalError, PalResult};

/// Resource manager double: stream membership per device plus an optional
/// mixer handle.
pub struct MockResourceManager {
    mixer: Mutex<Option<Arc<MockMixer>>>,
    streams: Mutex<HashMap<DeviceId, Vec<StreamHandle>>>,
    next_stream: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockResourceManager {
    pub fn new() -> Self {
        Self::with_mixer(Arc::new(MockMixer::new()))
    }

    pub fn with_mixer(mixer: Arc<MockMixer>) -> Self {
        Self {
            mixer: Mutex::new(Some(mixer)),
            streams: Mutex::new(HashMap::new()),
            next_stream: AtomicU64::new(1),
        }
    }

    pub fn without_mixer() -> Self {
        Self {
            mixer: Mutex::new(None),
            streams: Mutex::new(HashMap::new()),
            next_stream: AtomicU64::new(1),
        }
    }

    pub fn mixer(&self) -> Option<Arc<MockMixer>> {
        lock(&self.mixer).clone()
    }

    pub fn set_mixer(&self, mixer: Option<Arc<MockMixer>>) {
        *lock(&self.mixer) = mixer;
    }

    /// Bind a new stream to `device`
    pub fn attach_stream(&self, device: DeviceId) -> StreamHandle {
        let handle = StreamHandle(self.next_stream.fetch_add(1, Ordering::Relaxed));
        lock(&self.streams).entry(device).or_default().push(handle);
        handle
    }

    pub fn detach_stream(&self, device: DeviceId, handle: StreamHandle) {
        if let Some(streams) = lock(&self.streams).get_mut(&device) {
            streams.retain(|s| *s != handle);
        }
    }

    pub fn active_stream_count(&self, device: DeviceId) -> usize {
        lock(&self.streams).get(&device).map(Vec::len).unwrap_or(0)
    }
}

impl Default for MockResourceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceManager for MockResourceManager {
    fn hw_mixer(&self) -> PalResult<Arc<dyn Mixer>> {
        match lock(&self.mixer).clone() {
            Some(mixer) => Ok(mixer),
            None => Err(PalError::MixerUnavailable),
        }
    }

    fn with_active_streams(
        &self,
        device: DeviceId,
        visit: &mut dyn FnMut(&[StreamHandle]),
    ) -> PalResult<()> {
        let streams = lock(&self.streams);
        let bound = streams.get(&device).map(Vec::as_slice).unwrap_or(&[]);
        visit(bound);
        Ok(())
    }
}
