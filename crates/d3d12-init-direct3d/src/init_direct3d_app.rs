use d3d12_app_framework::d3d12::GraphicsContext;
use d3d12_app_framework::host::Sample;
use d3d12_app_framework::resource_state::ResourceState;
use d3d12_app_framework::Clock;
use d3d12_app_framework::HostConfig;
use d3d12_app_framework::HostResult;

/// Clears the back buffer and the depth buffer every frame. Nothing else.
pub struct InitDirect3dApp {
    clear_color: [f32; 4],
}

impl Sample for InitDirect3dApp {
    fn initialize(_context: &mut GraphicsContext, config: &HostConfig) -> HostResult<Self> {
        Ok(Self {
            clear_color: config.clear_color,
        })
    }

    fn update(&mut self, _context: &GraphicsContext, _clock: &Clock) -> HostResult<()> {
        Ok(())
    }

    fn draw(&mut self, context: &mut GraphicsContext, _clock: &Clock) -> HostResult<()> {
        // Safe to reuse the allocator: the last frame ended with a full flush.
        context.begin_frame(None)?;

        context.transition_back_buffer(ResourceState::Present, ResourceState::RenderTarget)?;
        // Must be set again whenever the command list is reset.
        context.set_viewport_and_scissor();

        context.clear_back_buffer(&self.clear_color);
        context.clear_depth_stencil();
        context.bind_render_targets();

        context.end_frame()
    }
}
