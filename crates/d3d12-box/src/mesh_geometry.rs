use crate::geometry::SubmeshGeometry;
use d3d12_app_framework::d3d12::DefaultBuffer;
use std::collections::HashMap;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;

/// One vertex buffer and one index buffer on the GPU, plus the named ranges
/// of the index buffer that make up separate draws.
pub struct MeshGeometry {
    pub name: String,
    pub vertex_buffer: DefaultBuffer,
    pub index_buffer: DefaultBuffer,
    pub vertex_byte_stride: u32,
    pub vertex_buffer_byte_size: u32,
    pub index_format: DXGI_FORMAT,
    pub index_buffer_byte_size: u32,
    pub draw_args: HashMap<String, SubmeshGeometry>,
}

impl MeshGeometry {
    pub fn vertex_buffer_view(&self) -> D3D12_VERTEX_BUFFER_VIEW {
        D3D12_VERTEX_BUFFER_VIEW {
            BufferLocation: self.vertex_buffer.gpu_virtual_address(),
            StrideInBytes: self.vertex_byte_stride,
            SizeInBytes: self.vertex_buffer_byte_size,
        }
    }

    pub fn index_buffer_view(&self) -> D3D12_INDEX_BUFFER_VIEW {
        D3D12_INDEX_BUFFER_VIEW {
            BufferLocation: self.index_buffer.gpu_virtual_address(),
            SizeInBytes: self.index_buffer_byte_size,
            Format: self.index_format,
        }
    }
}
