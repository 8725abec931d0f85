pub mod camera;
pub mod geometry;

#[cfg(windows)]
pub mod box_app;
#[cfg(windows)]
pub mod mesh_geometry;
#[cfg(windows)]
pub mod pipeline;
