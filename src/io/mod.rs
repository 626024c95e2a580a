// Purpose - audio hardware on both ends of the engine

pub mod device;
pub mod mic;

pub use device::{AudioDevice, CpalOutput, OfflineHandle, OfflineOutput};
pub use mic::{CpalInput, FeedHandle, FeedInput, InputSource, MicSession, MicStream};
