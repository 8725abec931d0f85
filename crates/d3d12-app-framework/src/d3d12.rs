//! Direct3D 12 and DXGI plumbing. Windows only.

pub mod barrier;
pub mod buffers;
pub mod compile_shader;
pub mod create_device;
pub mod create_root_signature;
pub mod fence_sync;
pub mod graphics_context;
pub mod log_adapters;

pub use barrier::transition_barrier;
pub use barrier::TrackedResource;
pub use buffers::create_default_buffer;
pub use buffers::create_upload_region;
pub use buffers::DefaultBuffer;
pub use buffers::GpuUploadRegion;
pub use buffers::UploadHeapBuffer;
pub use compile_shader::compile_shader;
pub use compile_shader::shader_bytecode;
pub use create_root_signature::create_root_signature;
pub use graphics_context::GraphicsContext;
pub use graphics_context::BACK_BUFFER_FORMAT;
pub use graphics_context::DEPTH_STENCIL_FORMAT;
