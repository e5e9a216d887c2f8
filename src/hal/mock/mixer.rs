use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::hal::traits::{Mixer, MixerControl};
use crate::{PalError, PalResult};

/// In-memory mixer. Records every control write and tracks enabled paths;
/// applying a path writes its default values without recording them as
/// control writes.
pub struct MockMixer {
    inner: Arc<MixerInner>,
}

struct MixerInner {
    controls: Mutex<BTreeMap<String, i64>>,
    path_defaults: HashMap<String, Vec<(String, i64)>>,
    enabled_paths: Mutex<BTreeSet<String>>,
    writes: Mutex<Vec<(String, i64)>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockMixer {
    /// Mixer exposing every control the built-in devices and features use
    pub fn new() -> Self {
        let controls = [
            "Haptics Source",
            "BT A2DP Suspend",
            "BT SCO NREC",
            "HFP RX Volume",
            "FM Volume",
        ]
        .iter()
        .map(|name| (name.to_string(), 0))
        .collect();

        let mut path_defaults = HashMap::new();
        path_defaults.insert(
            "haptics-dev".to_string(),
            vec![("Haptics Source".to_string(), 0)],
        );

        Self {
            inner: Arc::new(MixerInner {
                controls: Mutex::new(controls),
                path_defaults,
                enabled_paths: Mutex::new(BTreeSet::new()),
                writes: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Remove a control, to simulate a misconfigured mixer
    pub fn without_control(self, name: &str) -> Self {
        lock(&self.inner.controls).remove(name);
        self
    }

    pub fn control_value(&self, name: &str) -> Option<i64> {
        lock(&self.inner.controls).get(name).copied()
    }

    /// Every control write, in order
    pub fn writes(&self) -> Vec<(String, i64)> {
        lock(&self.inner.writes).clone()
    }

    /// Values written to one control, in order
    pub fn writes_to(&self, name: &str) -> Vec<i64> {
        lock(&self.inner.writes)
            .iter()
            .filter(|(ctl, _)| ctl == name)
            .map(|(_, value)| *value)
            .collect()
    }

    pub fn is_path_enabled(&self, path: &str) -> bool {
        lock(&self.inner.enabled_paths).contains(path)
    }
}

impl Default for MockMixer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mixer for MockMixer {
    fn control(&self, name: &str) -> Option<Arc<dyn MixerControl>> {
        if !lock(&self.inner.controls).contains_key(name) {
            return None;
        }
        Some(Arc::new(MockControl {
            name: name.to_string(),
            inner: self.inner.clone(),
        }))
    }

    fn apply_path(&self, path: &str) -> PalResult<()> {
        if let Some(defaults) = self.inner.path_defaults.get(path) {
            let mut controls = lock(&self.inner.controls);
            for (name, value) in defaults {
                controls.insert(name.clone(), *value);
            }
        }
        lock(&self.inner.enabled_paths).insert(path.to_string());
        Ok(())
    }

    fn reset_path(&self, path: &str) -> PalResult<()> {
        lock(&self.inner.enabled_paths).remove(path);
        Ok(())
    }
}

struct MockControl {
    name: String,
    inner: Arc<MixerInner>,
}

impl MixerControl for MockControl {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_value(&self, index: u32, value: i64) -> PalResult<()> {
        if index != 0 {
            return Err(PalError::InvalidParam(format!("{}[{}]", self.name, index)));
        }
        lock(&self.inner.controls).insert(self.name.clone(), value);
        lock(&self.inner.writes).push((self.name.clone(), value));
        Ok(())
    }

    fn value(&self, index: u32) -> PalResult<i64> {
        if index != 0 {
            return Err(PalError::InvalidParam(format!("{}[{}]", self.name, index)));
        }
        lock(&self.inner.controls)
            .get(&self.name)
            .copied()
            .ok_or_else(|| PalError::ControlNotFound(self.name.clone()))
    }
}
