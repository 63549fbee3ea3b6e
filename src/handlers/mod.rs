pub mod frame;
pub mod health;
pub mod performance;
pub mod simulation;

pub use frame::{get_frame, get_frame_slice, get_voxel};
pub use health::hello;
pub use performance::get_performance;
pub use simulation::{cancel_load, get_status, load_simulation, play, reset, stop};
