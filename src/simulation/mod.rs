//! 体积模拟的加载与播放

pub mod loader;
pub mod playback;
pub mod state;
pub mod ticker;
pub mod upload;

pub use loader::{LoadContext, MissingFramePolicy};
pub use state::{SimulationState, SimulationStatus};
pub use ticker::{FrameTimer, SharedStaging, run_ticker};
pub use upload::StagingVolume;
