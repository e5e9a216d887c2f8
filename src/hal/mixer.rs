//! Named hardware control access through the resource manager's mixer.
//!
//! A missing mixer or control is a static configuration defect: it is logged
//! and reported, never retried.

use super::traits::ResourceManager;
use crate::{PalError, PalResult};

pub fn set_control_value(rm: &dyn ResourceManager, name: &str, value: i64) -> PalResult<()> {
    let mixer = rm.hw_mixer().map_err(|e| {
        log::error!("mixer error: {}", e);
        e
    })?;

    let ctl = mixer.control(name).ok_or_else(|| {
        log::error!("Could not get ctl for mixer cmd - {}", name);
        PalError::ControlNotFound(name.to_string())
    })?;

    log::debug!("Setting mixer control: {}, value: {}", name, value);
    ctl.set_value(0, value)
}

pub fn get_control_value(rm: &dyn ResourceManager, name: &str) -> PalResult<i64> {
    let mixer = rm.hw_mixer()?;
    let ctl = mixer
        .control(name)
        .ok_or_else(|| PalError::ControlNotFound(name.to_string()))?;
    ctl.value(0)
}
