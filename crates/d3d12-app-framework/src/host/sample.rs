use crate::clock::Clock;
use crate::config::HostConfig;
use crate::d3d12::GraphicsContext;
use crate::error::HostResult;
use crate::window_state::MouseButtons;

/// What a demo plugs into the frame host.
///
/// The host owns the window, device and loop; a sample only builds its own
/// resources and records its frames.
pub trait Sample: Sized {
    /// Builds the sample's GPU resources.
    ///
    /// The command list is open. Whatever gets recorded here (buffer uploads
    /// and the like) is executed and flushed before the first frame.
    fn initialize(context: &mut GraphicsContext, config: &HostConfig) -> HostResult<Self>;

    /// Called after the back buffers and depth buffer were rebuilt.
    fn on_resize(&mut self, _context: &GraphicsContext) -> HostResult<()> {
        Ok(())
    }

    fn update(&mut self, context: &GraphicsContext, clock: &Clock) -> HostResult<()>;

    /// Records and submits one frame, typically between
    /// [`GraphicsContext::begin_frame`] and [`GraphicsContext::end_frame`].
    fn draw(&mut self, context: &mut GraphicsContext, clock: &Clock) -> HostResult<()>;

    fn on_mouse_down(&mut self, _context: &GraphicsContext, _buttons: MouseButtons, _x: i32, _y: i32) {}

    fn on_mouse_up(&mut self, _context: &GraphicsContext, _buttons: MouseButtons, _x: i32, _y: i32) {}

    fn on_mouse_move(&mut self, _context: &GraphicsContext, _buttons: MouseButtons, _x: i32, _y: i32) {}
}
