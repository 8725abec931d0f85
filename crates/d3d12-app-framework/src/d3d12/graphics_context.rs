use super::barrier::TrackedResource;
use super::create_device::create_device;
use super::fence_sync::FenceSync;
use super::log_adapters::log_adapters;
use crate::back_buffer::BackBufferRing;
use crate::back_buffer::SWAP_CHAIN_BUFFER_COUNT;
use crate::config::HostConfig;
use crate::dx;
use crate::error::HostResult;
use crate::resource_state::ResourceState;
use crate::sync::QueueFence;
use eyre::eyre;
use tracing::debug;
use tracing::info;
use windows::core::Interface;
use windows::Win32::Foundation::*;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;
use windows::Win32::Graphics::Dxgi::*;

pub const BACK_BUFFER_FORMAT: DXGI_FORMAT = DXGI_FORMAT_R8G8B8A8_UNORM;
pub const DEPTH_STENCIL_FORMAT: DXGI_FORMAT = DXGI_FORMAT_D24_UNORM_S8_UINT;

/// Everything the frame host owns on the graphics side: device, the one
/// direct queue with its allocator/list pair, the swap chain and its views,
/// and the depth buffer.
pub struct GraphicsContext {
    hwnd: HWND,
    dxgi_factory: IDXGIFactory4,
    device: ID3D12Device,
    command_queue: ID3D12CommandQueue,
    command_allocator: ID3D12CommandAllocator,
    command_list: ID3D12GraphicsCommandList,
    fence_sync: FenceSync,
    queue_fence: QueueFence,

    swap_chain: Option<IDXGISwapChain3>,
    back_buffers: Option<[TrackedResource; SWAP_CHAIN_BUFFER_COUNT]>,
    back_buffer_ring: BackBufferRing,
    depth_stencil_buffer: Option<TrackedResource>,

    rtv_heap: ID3D12DescriptorHeap,
    dsv_heap: ID3D12DescriptorHeap,
    rtv_descriptor_size: u32,
    dsv_descriptor_size: u32,
    cbv_srv_uav_descriptor_size: u32,

    screen_viewport: D3D12_VIEWPORT,
    scissor_rect: RECT,
    client_width: u32,
    client_height: u32,

    msaa_enabled: bool,
    msaa_quality: u32,
}

impl GraphicsContext {
    /// Creates the device and command objects and the swap chain. The back
    /// buffers and depth buffer don't exist until the first [`Self::resize`].
    pub fn new(hwnd: HWND, config: &HostConfig) -> HostResult<Self> {
        let (dxgi_factory, device) = create_device(config.use_warp_device)?;

        let command_queue: ID3D12CommandQueue = dx!(unsafe {
            device.CreateCommandQueue(&D3D12_COMMAND_QUEUE_DESC {
                Type: D3D12_COMMAND_LIST_TYPE_DIRECT,
                Flags: D3D12_COMMAND_QUEUE_FLAG_NONE,
                ..Default::default()
            })
        })?;
        let fence_sync = FenceSync::new(&device, &command_queue)?;

        let rtv_descriptor_size =
            unsafe { device.GetDescriptorHandleIncrementSize(D3D12_DESCRIPTOR_HEAP_TYPE_RTV) };
        let dsv_descriptor_size =
            unsafe { device.GetDescriptorHandleIncrementSize(D3D12_DESCRIPTOR_HEAP_TYPE_DSV) };
        let cbv_srv_uav_descriptor_size = unsafe {
            device.GetDescriptorHandleIncrementSize(D3D12_DESCRIPTOR_HEAP_TYPE_CBV_SRV_UAV)
        };

        // All Direct3D 11 capable devices support 4X MSAA for all render
        // target formats, so only the quality level needs checking.
        let mut quality_levels = D3D12_FEATURE_DATA_MULTISAMPLE_QUALITY_LEVELS {
            Format: BACK_BUFFER_FORMAT,
            SampleCount: 4,
            Flags: D3D12_MULTISAMPLE_QUALITY_LEVELS_FLAG_NONE,
            NumQualityLevels: 0,
        };
        dx!(unsafe {
            device.CheckFeatureSupport(
                D3D12_FEATURE_MULTISAMPLE_QUALITY_LEVELS,
                &mut quality_levels as *mut _ as *mut _,
                std::mem::size_of::<D3D12_FEATURE_DATA_MULTISAMPLE_QUALITY_LEVELS>() as u32,
            )
        })?;
        let msaa_quality = quality_levels.NumQualityLevels;
        debug_assert!(msaa_quality > 0, "Unexpected MSAA quality level.");

        if cfg!(debug_assertions) {
            log_adapters(&dxgi_factory, BACK_BUFFER_FORMAT);
        }

        let command_allocator: ID3D12CommandAllocator =
            dx!(unsafe { device.CreateCommandAllocator(D3D12_COMMAND_LIST_TYPE_DIRECT) })?;
        let command_list: ID3D12GraphicsCommandList = dx!(unsafe {
            device.CreateCommandList(0, D3D12_COMMAND_LIST_TYPE_DIRECT, &command_allocator, None)
        })?;
        // Start off closed: the first thing every user does is Reset it.
        dx!(unsafe { command_list.Close() })?;

        let rtv_heap: ID3D12DescriptorHeap = dx!(unsafe {
            device.CreateDescriptorHeap(&D3D12_DESCRIPTOR_HEAP_DESC {
                Type: D3D12_DESCRIPTOR_HEAP_TYPE_RTV,
                NumDescriptors: SWAP_CHAIN_BUFFER_COUNT as u32,
                Flags: D3D12_DESCRIPTOR_HEAP_FLAG_NONE,
                NodeMask: 0,
            })
        })?;
        let dsv_heap: ID3D12DescriptorHeap = dx!(unsafe {
            device.CreateDescriptorHeap(&D3D12_DESCRIPTOR_HEAP_DESC {
                Type: D3D12_DESCRIPTOR_HEAP_TYPE_DSV,
                NumDescriptors: 1,
                Flags: D3D12_DESCRIPTOR_HEAP_FLAG_NONE,
                NodeMask: 0,
            })
        })?;

        let mut context = Self {
            hwnd,
            dxgi_factory,
            device,
            command_queue,
            command_allocator,
            command_list,
            fence_sync,
            queue_fence: QueueFence::new(),
            swap_chain: None,
            back_buffers: None,
            back_buffer_ring: BackBufferRing::new(SWAP_CHAIN_BUFFER_COUNT),
            depth_stencil_buffer: None,
            rtv_heap,
            dsv_heap,
            rtv_descriptor_size,
            dsv_descriptor_size,
            cbv_srv_uav_descriptor_size,
            screen_viewport: D3D12_VIEWPORT::default(),
            scissor_rect: RECT::default(),
            client_width: config.client_width,
            client_height: config.client_height,
            msaa_enabled: config.msaa_enabled,
            msaa_quality,
        };
        context.create_swap_chain()?;
        info!(
            msaa_quality,
            rtv_descriptor_size, dsv_descriptor_size, cbv_srv_uav_descriptor_size, "Direct3D initialized"
        );
        Ok(context)
    }

    fn create_swap_chain(&mut self) -> HostResult<()> {
        // Only one flip-model swap chain may be bound to a window at a time.
        self.back_buffers = None;
        self.swap_chain = None;

        let desc = DXGI_SWAP_CHAIN_DESC1 {
            Width: self.client_width,
            Height: self.client_height,
            Format: BACK_BUFFER_FORMAT,
            SampleDesc: self.msaa_sample_desc(),
            BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
            BufferCount: SWAP_CHAIN_BUFFER_COUNT as u32,
            SwapEffect: DXGI_SWAP_EFFECT_FLIP_DISCARD,
            Flags: DXGI_SWAP_CHAIN_FLAG_ALLOW_MODE_SWITCH.0 as u32,
            ..Default::default()
        };

        // The swap chain flushes through the queue, so it is created from it.
        let swap_chain: IDXGISwapChain1 = dx!(unsafe {
            self.dxgi_factory
                .CreateSwapChainForHwnd(&self.command_queue, self.hwnd, &desc, None, None)
        })?;
        self.swap_chain = Some(dx!(swap_chain.cast::<IDXGISwapChain3>())?);
        Ok(())
    }

    /// Turns 4x MSAA on or off. The swap chain is rebuilt; call
    /// [`Self::resize`] afterwards to rebuild its views and the depth buffer.
    pub fn set_msaa(&mut self, enabled: bool) -> HostResult<()> {
        if self.msaa_enabled == enabled {
            return Ok(());
        }
        self.flush_queue()?;
        self.msaa_enabled = enabled;
        self.create_swap_chain()
    }

    /// Rebuilds the back buffer views, the depth buffer, the viewport and the
    /// scissor rectangle for a `width` x `height` client area.
    pub fn resize(&mut self, width: u32, height: u32) -> HostResult<()> {
        // Nothing may still reference the resources about to be released.
        self.flush_queue()?;
        dx!(unsafe { self.command_list.Reset(&self.command_allocator, None) })?;

        self.client_width = width;
        self.client_height = height;
        self.back_buffers = None;
        self.depth_stencil_buffer = None;

        let swap_chain = self.swap_chain()?.clone();
        dx!(unsafe {
            swap_chain.ResizeBuffers(
                SWAP_CHAIN_BUFFER_COUNT as u32,
                width,
                height,
                BACK_BUFFER_FORMAT,
                DXGI_SWAP_CHAIN_FLAG_ALLOW_MODE_SWITCH,
            )
        })?;
        self.back_buffer_ring.reset();

        let rtv_heap_start = unsafe { self.rtv_heap.GetCPUDescriptorHandleForHeapStart() };
        let back_buffers = array_init::try_array_init(|i| -> HostResult<TrackedResource> {
            let buffer: ID3D12Resource = dx!(unsafe { swap_chain.GetBuffer(i as u32) })?;
            let handle = D3D12_CPU_DESCRIPTOR_HANDLE {
                ptr: rtv_heap_start.ptr + i * self.rtv_descriptor_size as usize,
            };
            unsafe { self.device.CreateRenderTargetView(&buffer, None, handle) };
            Ok(TrackedResource::new(buffer, ResourceState::Present))
        })?;
        self.back_buffers = Some(back_buffers);

        let mut depth_stencil_buffer = self.create_depth_stencil_buffer(width, height)?;
        let to_depth_write =
            depth_stencil_buffer.transition(ResourceState::Common, ResourceState::DepthWrite);
        unsafe { self.command_list.ResourceBarrier(&[to_depth_write]) };
        self.depth_stencil_buffer = Some(depth_stencil_buffer);

        self.execute_command_list()?;
        self.flush_queue()?;

        self.screen_viewport = D3D12_VIEWPORT {
            TopLeftX: 0.0,
            TopLeftY: 0.0,
            Width: width as f32,
            Height: height as f32,
            MinDepth: 0.0,
            MaxDepth: 1.0,
        };
        self.scissor_rect = RECT {
            left: 0,
            top: 0,
            right: width as i32,
            bottom: height as i32,
        };
        debug!(width, height, msaa = self.msaa_enabled, "swap chain resized");
        Ok(())
    }

    fn create_depth_stencil_buffer(&self, width: u32, height: u32) -> HostResult<TrackedResource> {
        // Typeless so an SRV could read the depth channel later; the DSV
        // below views it as D24_UNORM_S8_UINT.
        let desc = D3D12_RESOURCE_DESC {
            Dimension: D3D12_RESOURCE_DIMENSION_TEXTURE2D,
            Alignment: 0,
            Width: u64::from(width),
            Height: height,
            DepthOrArraySize: 1,
            MipLevels: 1,
            Format: DXGI_FORMAT_R24G8_TYPELESS,
            SampleDesc: self.msaa_sample_desc(),
            Layout: D3D12_TEXTURE_LAYOUT_UNKNOWN,
            Flags: D3D12_RESOURCE_FLAG_ALLOW_DEPTH_STENCIL,
        };
        let clear_value = D3D12_CLEAR_VALUE {
            Format: DEPTH_STENCIL_FORMAT,
            Anonymous: D3D12_CLEAR_VALUE_0 {
                DepthStencil: D3D12_DEPTH_STENCIL_VALUE {
                    Depth: 1.0,
                    Stencil: 0,
                },
            },
        };
        let heap_props = D3D12_HEAP_PROPERTIES {
            Type: D3D12_HEAP_TYPE_DEFAULT,
            ..Default::default()
        };

        let mut resource: Option<ID3D12Resource> = None;
        dx!(unsafe {
            self.device.CreateCommittedResource(
                &heap_props,
                D3D12_HEAP_FLAG_NONE,
                &desc,
                D3D12_RESOURCE_STATE_COMMON,
                Some(&clear_value),
                &mut resource,
            )
        })?;
        let resource = resource.ok_or_else(|| eyre!("CreateCommittedResource returned no depth buffer"))?;

        let dsv_desc = if self.msaa_enabled {
            D3D12_DEPTH_STENCIL_VIEW_DESC {
                Format: DEPTH_STENCIL_FORMAT,
                ViewDimension: D3D12_DSV_DIMENSION_TEXTURE2DMS,
                Flags: D3D12_DSV_FLAG_NONE,
                Anonymous: D3D12_DEPTH_STENCIL_VIEW_DESC_0 {
                    Texture2DMS: D3D12_TEX2DMS_DSV::default(),
                },
            }
        } else {
            D3D12_DEPTH_STENCIL_VIEW_DESC {
                Format: DEPTH_STENCIL_FORMAT,
                ViewDimension: D3D12_DSV_DIMENSION_TEXTURE2D,
                Flags: D3D12_DSV_FLAG_NONE,
                Anonymous: D3D12_DEPTH_STENCIL_VIEW_DESC_0 {
                    Texture2D: D3D12_TEX2D_DSV { MipSlice: 0 },
                },
            }
        };
        unsafe {
            self.device
                .CreateDepthStencilView(&resource, Some(&dsv_desc), self.depth_stencil_view())
        };

        Ok(TrackedResource::new(resource, ResourceState::Common))
    }

    /// Signals a new fence value on the queue and blocks until the GPU reaches it.
    pub fn flush_queue(&mut self) -> HostResult<u64> {
        self.queue_fence.flush(&self.fence_sync)
    }

    /// Closes the command list and submits it.
    pub fn execute_command_list(&self) -> HostResult<()> {
        dx!(unsafe { self.command_list.Close() })?;
        let command_lists = [Some(dx!(self.command_list.cast::<ID3D12CommandList>())?)];
        unsafe { self.command_queue.ExecuteCommandLists(&command_lists) };
        Ok(())
    }

    /// Reopens the command list for one-off setup work, e.g. uploading geometry.
    pub fn open_command_list(&mut self) -> HostResult<()> {
        dx!(unsafe { self.command_list.Reset(&self.command_allocator, None) })?;
        Ok(())
    }

    /// Submits the setup work recorded since [`Self::open_command_list`] and waits for it.
    pub fn submit_and_flush(&mut self) -> HostResult<()> {
        self.execute_command_list()?;
        self.flush_queue()?;
        Ok(())
    }

    /// Starts recording a frame.
    ///
    /// The allocator is only reset here because the previous frame ended with
    /// a full flush.
    pub fn begin_frame(&mut self, initial_state: Option<&ID3D12PipelineState>) -> HostResult<()> {
        debug_assert!(
            self.queue_fence.is_idle(&self.fence_sync),
            "command allocator reset while the GPU may still be using it"
        );
        dx!(unsafe { self.command_allocator.Reset() })?;
        dx!(unsafe { self.command_list.Reset(&self.command_allocator, initial_state) })?;
        Ok(())
    }

    pub fn set_viewport_and_scissor(&self) {
        unsafe {
            self.command_list.RSSetViewports(&[self.screen_viewport]);
            self.command_list.RSSetScissorRects(&[self.scissor_rect]);
        }
    }

    #[track_caller]
    pub fn transition_back_buffer(
        &mut self,
        expected_before: ResourceState,
        after: ResourceState,
    ) -> HostResult<()> {
        let index = self.back_buffer_ring.current();
        let back_buffers = self
            .back_buffers
            .as_mut()
            .ok_or_else(|| eyre!("back buffers are missing; resize must run first"))?;
        let barrier = back_buffers[index].transition(expected_before, after);
        unsafe { self.command_list.ResourceBarrier(&[barrier]) };
        Ok(())
    }

    pub fn clear_back_buffer(&self, color: &[f32; 4]) {
        unsafe {
            self.command_list
                .ClearRenderTargetView(self.current_back_buffer_view(), color, None)
        };
    }

    pub fn clear_depth_stencil(&self) {
        unsafe {
            self.command_list.ClearDepthStencilView(
                self.depth_stencil_view(),
                D3D12_CLEAR_FLAG_DEPTH | D3D12_CLEAR_FLAG_STENCIL,
                1.0,
                0,
                None,
            )
        };
    }

    /// Binds the current back buffer and the depth buffer as the output targets.
    pub fn bind_render_targets(&self) {
        let rtv = self.current_back_buffer_view();
        let dsv = self.depth_stencil_view();
        unsafe {
            self.command_list
                .OMSetRenderTargets(1, Some(&rtv), true, Some(&dsv))
        };
    }

    /// Moves the back buffer back to PRESENT, submits, presents, and waits
    /// for the GPU to finish the frame.
    pub fn end_frame(&mut self) -> HostResult<()> {
        self.transition_back_buffer(ResourceState::RenderTarget, ResourceState::Present)?;
        self.execute_command_list()?;

        let swap_chain = self.swap_chain()?.clone();
        dx!(unsafe { swap_chain.Present(0, DXGI_PRESENT(0)) }.ok())?;
        let next = self.back_buffer_ring.advance();
        debug_assert_eq!(
            next as u32,
            unsafe { swap_chain.GetCurrentBackBufferIndex() },
            "back buffer ring drifted from the swap chain"
        );

        // Waiting here every frame is simple but leaves the GPU idle while
        // the next frame is recorded.
        self.flush_queue()?;
        Ok(())
    }

    fn swap_chain(&self) -> HostResult<&IDXGISwapChain3> {
        self.swap_chain
            .as_ref()
            .ok_or_else(|| eyre!("swap chain has not been created").into())
    }

    pub fn current_back_buffer(&self) -> Option<&ID3D12Resource> {
        self.back_buffers
            .as_ref()
            .map(|buffers| buffers[self.back_buffer_ring.current()].resource())
    }

    pub fn current_back_buffer_view(&self) -> D3D12_CPU_DESCRIPTOR_HANDLE {
        let start = unsafe { self.rtv_heap.GetCPUDescriptorHandleForHeapStart() };
        D3D12_CPU_DESCRIPTOR_HANDLE {
            ptr: start.ptr
                + self.back_buffer_ring.current() * self.rtv_descriptor_size as usize,
        }
    }

    pub fn depth_stencil_view(&self) -> D3D12_CPU_DESCRIPTOR_HANDLE {
        unsafe { self.dsv_heap.GetCPUDescriptorHandleForHeapStart() }
    }

    pub fn msaa_sample_desc(&self) -> DXGI_SAMPLE_DESC {
        if self.msaa_enabled {
            DXGI_SAMPLE_DESC {
                Count: 4,
                Quality: self.msaa_quality - 1,
            }
        } else {
            DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            }
        }
    }

    pub fn msaa_enabled(&self) -> bool {
        self.msaa_enabled
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.client_width as f32 / self.client_height as f32
    }

    pub fn client_size(&self) -> (u32, u32) {
        (self.client_width, self.client_height)
    }

    pub fn hwnd(&self) -> HWND {
        self.hwnd
    }

    pub fn device(&self) -> &ID3D12Device {
        &self.device
    }

    pub fn command_list(&self) -> &ID3D12GraphicsCommandList {
        &self.command_list
    }

    pub fn cbv_srv_uav_descriptor_size(&self) -> u32 {
        self.cbv_srv_uav_descriptor_size
    }

    pub fn back_buffer_index(&self) -> usize {
        self.back_buffer_ring.current()
    }
}
