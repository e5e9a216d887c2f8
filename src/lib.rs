pub mod codec;
pub mod config;
pub mod error;
pub mod extn;
pub mod hal;

pub use config::{FeatureFlags, PalConfig};
pub use error::{PalError, PalResult};
