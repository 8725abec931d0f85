//! The frame host: window, device and message loop around a [`Sample`]. Windows only.

pub mod frame_host;
pub mod sample;

pub use frame_host::run_sample;
pub use frame_host::FrameHost;
pub use sample::Sample;
