pub mod bluetooth;
pub mod fm;
pub mod haptics;

pub use bluetooth::{BtA2dp, BtSco, ScoLinkState};
pub use fm::FmDevice;
pub use haptics::{HapticsDev, HapticsDevProtection};
