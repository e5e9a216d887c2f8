use std::sync::{Mutex, MutexGuard};

use crossbeam_channel::{Receiver, Sender};

#[derive(Default)]
struct ListenerState {
    enabled: bool,
    charging: bool,
    subscribers: Vec<Sender<bool>>,
}

/// Tracks the charger state reported by the power service and fans changes
/// out to subscribers. Inert until initialized with the flag enabled.
#[derive(Default)]
pub struct BatteryListener {
    state: Mutex<ListenerState>,
}

impl BatteryListener {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ListenerState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn init(&self, enabled: bool) {
        let mut state = self.lock();
        state.enabled = enabled;
        log::info!("battery listener {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Stop listening. Subscribers see their channel disconnect.
    pub fn deinit(&self) {
        let mut state = self.lock();
        state.enabled = false;
        state.charging = false;
        state.subscribers.clear();
    }

    pub fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    /// Receive every subsequent charging-state change
    pub fn subscribe(&self) -> Receiver<bool> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut state = self.lock();
        if state.enabled {
            state.subscribers.push(tx);
        }
        rx
    }

    /// Charger state change from the power service
    pub fn notify(&self, charging: bool) {
        let mut state = self.lock();
        if !state.enabled {
            log::debug!("battery notification dropped: listener disabled");
            return;
        }
        if state.charging == charging {
            return;
        }
        state.charging = charging;
        log::info!("charging status {}", charging);
        state.subscribers.retain(|tx| tx.send(charging).is_ok());
    }

    pub fn is_charging(&self) -> bool {
        let state = self.lock();
        state.enabled && state.charging
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_listener_ignores_notifications() {
        let listener = BatteryListener::new();
        listener.init(false);
        let rx = listener.subscribe();

        listener.notify(true);

        assert!(!listener.is_charging());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_changes_fan_out() {
        let listener = BatteryListener::new();
        listener.init(true);
        let first = listener.subscribe();
        let second = listener.subscribe();

        listener.notify(true);
        listener.notify(true);
        listener.notify(false);

        assert_eq!(first.try_iter().collect::<Vec<_>>(), vec![true, false]);
        assert_eq!(second.try_iter().collect::<Vec<_>>(), vec![true, false]);
    }

    #[test]
    fn test_deinit_disconnects() {
        let listener = BatteryListener::new();
        listener.init(true);
        let rx = listener.subscribe();

        listener.deinit();

        assert!(rx.recv().is_err());
        assert!(!listener.is_enabled());
    }
}
