use crate::camera::projection;
use crate::camera::OrbitCamera;
use crate::geometry::as_bytes;
use crate::geometry::box_submesh;
use crate::geometry::ObjectConstants;
use crate::geometry::Vertex;
use crate::geometry::BOX_INDICES;
use crate::geometry::BOX_SUBMESH_NAME;
use crate::geometry::BOX_VERTICES;
use crate::mesh_geometry::MeshGeometry;
use crate::pipeline::create_box_pipeline_state;
use crate::pipeline::create_box_root_signature;
use bevy_math::Mat4;
use d3d12_app_framework::d3d12::create_default_buffer;
use d3d12_app_framework::d3d12::create_upload_region;
use d3d12_app_framework::d3d12::GpuUploadRegion;
use d3d12_app_framework::d3d12::GraphicsContext;
use d3d12_app_framework::dx;
use d3d12_app_framework::host::Sample;
use d3d12_app_framework::resource_state::ResourceState;
use d3d12_app_framework::window_state::MouseButtons;
use d3d12_app_framework::Clock;
use d3d12_app_framework::HostConfig;
use d3d12_app_framework::HostResult;
use eyre::eyre;
use std::collections::HashMap;
use tracing::debug;
use tracing::warn;
use windows::core::w;
use windows::Win32::Graphics::Direct3D::*;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;
use windows::Win32::UI::Input::KeyboardAndMouse::ReleaseCapture;
use windows::Win32::UI::Input::KeyboardAndMouse::SetCapture;

/// Index of the box's constants in the object constant buffer.
const BOX_CONSTANTS_INDEX: usize = 0;

/// A vertex-coloured cube the mouse can orbit around and zoom in on.
pub struct BoxApp {
    root_signature: ID3D12RootSignature,
    cbv_heap: ID3D12DescriptorHeap,
    object_cb: GpuUploadRegion<ObjectConstants>,
    box_geo: MeshGeometry,
    pso: ID3D12PipelineState,

    camera: OrbitCamera,
    world: Mat4,
    proj: Mat4,
    clear_color: [f32; 4],
}

impl Sample for BoxApp {
    fn initialize(context: &mut GraphicsContext, config: &HostConfig) -> HostResult<Self> {
        let device = context.device().clone();

        let cbv_heap = build_descriptor_heap(&device)?;
        let object_cb = build_constant_buffer(&device, &cbv_heap)?;
        let root_signature = create_box_root_signature(&device)?;
        let box_geo = build_box_geometry(&device, context.command_list())?;
        let pso = create_box_pipeline_state(&device, &root_signature, context.msaa_sample_desc())?;

        Ok(Self {
            root_signature,
            cbv_heap,
            object_cb,
            box_geo,
            pso,
            camera: OrbitCamera::default(),
            world: Mat4::IDENTITY,
            proj: projection(context.aspect_ratio()),
            clear_color: config.clear_color,
        })
    }

    fn on_resize(&mut self, context: &GraphicsContext) -> HostResult<()> {
        // The window resized, so update the aspect ratio and recompute the projection matrix.
        self.proj = projection(context.aspect_ratio());
        Ok(())
    }

    fn update(&mut self, _context: &GraphicsContext, _clock: &Clock) -> HostResult<()> {
        let world_view_proj = self.proj * self.camera.view() * self.world;
        // Update the constant buffer with the latest worldViewProj matrix.
        self.object_cb
            .write(BOX_CONSTANTS_INDEX, &ObjectConstants::new(world_view_proj));
        Ok(())
    }

    fn draw(&mut self, context: &mut GraphicsContext, _clock: &Clock) -> HostResult<()> {
        let submesh = self
            .box_geo
            .draw_args
            .get(BOX_SUBMESH_NAME)
            .copied()
            .ok_or_else(|| eyre!("{} has no {BOX_SUBMESH_NAME:?} submesh", self.box_geo.name))?;

        context.begin_frame(Some(&self.pso))?;
        context.set_viewport_and_scissor();
        context.transition_back_buffer(ResourceState::Present, ResourceState::RenderTarget)?;
        context.clear_back_buffer(&self.clear_color);
        context.clear_depth_stencil();
        context.bind_render_targets();

        let command_list = context.command_list();
        unsafe {
            command_list.SetDescriptorHeaps(&[Some(self.cbv_heap.clone())]);
            command_list.SetGraphicsRootSignature(&self.root_signature);

            command_list.IASetVertexBuffers(0, Some(&[self.box_geo.vertex_buffer_view()]));
            command_list.IASetIndexBuffer(Some(&self.box_geo.index_buffer_view()));
            command_list.IASetPrimitiveTopology(D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST);

            command_list
                .SetGraphicsRootDescriptorTable(0, self.cbv_heap.GetGPUDescriptorHandleForHeapStart());

            command_list.DrawIndexedInstanced(
                submesh.index_count,
                1,
                submesh.start_index_location,
                submesh.base_vertex_location,
                0,
            );
        }

        context.end_frame()
    }

    fn on_mouse_down(&mut self, context: &GraphicsContext, _buttons: MouseButtons, x: i32, y: i32) {
        self.camera.begin_drag(x, y);
        unsafe { SetCapture(context.hwnd()) };
    }

    fn on_mouse_up(&mut self, _context: &GraphicsContext, _buttons: MouseButtons, _x: i32, _y: i32) {
        if let Err(error) = unsafe { ReleaseCapture() } {
            warn!(%error, "ReleaseCapture failed");
        }
    }

    fn on_mouse_move(&mut self, _context: &GraphicsContext, buttons: MouseButtons, x: i32, y: i32) {
        self.camera.drag(buttons, x, y);
    }
}

fn build_descriptor_heap(device: &ID3D12Device) -> HostResult<ID3D12DescriptorHeap> {
    let cbv_heap = dx!(unsafe {
        device.CreateDescriptorHeap(&D3D12_DESCRIPTOR_HEAP_DESC {
            Type: D3D12_DESCRIPTOR_HEAP_TYPE_CBV_SRV_UAV,
            NumDescriptors: 1,
            Flags: D3D12_DESCRIPTOR_HEAP_FLAG_SHADER_VISIBLE,
            NodeMask: 0,
        })
    })?;
    Ok(cbv_heap)
}

/// One constant buffer slot for the box, and a view of it in the CBV heap.
fn build_constant_buffer(
    device: &ID3D12Device,
    cbv_heap: &ID3D12DescriptorHeap,
) -> HostResult<GpuUploadRegion<ObjectConstants>> {
    let object_cb = create_upload_region::<ObjectConstants>(device, 1, true)?;

    // Offset to the box's constants in the buffer.
    let cb_address = object_cb.buffer().gpu_virtual_address()
        + object_cb.layout().offset_of(BOX_CONSTANTS_INDEX) as u64;
    let cbv_desc = D3D12_CONSTANT_BUFFER_VIEW_DESC {
        BufferLocation: cb_address,
        SizeInBytes: object_cb.element_stride() as u32,
    };
    unsafe {
        device.CreateConstantBufferView(Some(&cbv_desc), cbv_heap.GetCPUDescriptorHandleForHeapStart())
    };
    debug!(stride = object_cb.element_stride(), "object constant buffer created");
    Ok(object_cb)
}

/// Records uploads of the box's vertices and indices on the open command list.
fn build_box_geometry(
    device: &ID3D12Device,
    command_list: &ID3D12GraphicsCommandList,
) -> HostResult<MeshGeometry> {
    let vertex_bytes = as_bytes(&BOX_VERTICES);
    let index_bytes = as_bytes(&BOX_INDICES);

    let vertex_buffer =
        create_default_buffer(device, command_list, vertex_bytes, w!("BoxVertexBuffer"))?;
    let index_buffer =
        create_default_buffer(device, command_list, index_bytes, w!("BoxIndexBuffer"))?;

    let mut draw_args = HashMap::new();
    draw_args.insert(BOX_SUBMESH_NAME.to_string(), box_submesh());

    Ok(MeshGeometry {
        name: "boxGeo".to_string(),
        vertex_buffer,
        index_buffer,
        vertex_byte_stride: std::mem::size_of::<Vertex>() as u32,
        vertex_buffer_byte_size: vertex_bytes.len() as u32,
        index_format: DXGI_FORMAT_R16_UINT,
        index_buffer_byte_size: index_bytes.len() as u32,
        draw_args,
    })
}
