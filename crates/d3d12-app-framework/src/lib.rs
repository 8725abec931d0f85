//! The shared skeleton behind the Direct3D 12 samples: a clock, upload
//! regions for per-frame constants, and a frame host that owns the window,
//! device, swap chain and fence.
//!
//! Everything outside `d3d12`, `win32` and `host` is plain Rust and builds on
//! any platform.

pub mod back_buffer;
pub mod clock;
pub mod config;
pub mod error;
pub mod frame_pacing;
pub mod lifecycle;
pub mod logging;
pub mod mailbox;
pub mod resource_state;
pub mod sync;
pub mod upload;
pub mod window_state;

#[cfg(windows)]
pub mod d3d12;
#[cfg(windows)]
pub mod host;
#[cfg(windows)]
pub mod win32;

pub use clock::Clock;
pub use config::HostConfig;
pub use error::DxError;
pub use error::HostReport;
pub use error::HostResult;
pub use upload::UploadRegion;
