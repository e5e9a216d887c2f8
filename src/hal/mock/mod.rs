//! In-process doubles for the external collaborators the device core and
//! the codec negotiator talk to. Used by the tests and the demo binary.

pub mod codec;
pub mod mixer;
pub mod resource_manager;

pub use codec::RecordingSession;
pub use mixer::MockMixer;
pub use resource_manager::MockResourceManager;
