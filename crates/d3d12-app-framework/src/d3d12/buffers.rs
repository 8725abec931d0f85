use super::barrier::TrackedResource;
use crate::dx;
use crate::error::HostResult;
use crate::resource_state::ResourceState;
use crate::upload::MappedBuffer;
use crate::upload::UploadRegion;
use eyre::eyre;
use windows::core::PCWSTR;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;

pub fn buffer_desc(byte_size: u64) -> D3D12_RESOURCE_DESC {
    D3D12_RESOURCE_DESC {
        Dimension: D3D12_RESOURCE_DIMENSION_BUFFER,
        Alignment: 0,
        Width: byte_size,
        Height: 1,
        DepthOrArraySize: 1,
        MipLevels: 1,
        Format: DXGI_FORMAT_UNKNOWN,
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: 1,
            Quality: 0,
        },
        Layout: D3D12_TEXTURE_LAYOUT_ROW_MAJOR,
        Flags: D3D12_RESOURCE_FLAG_NONE,
    }
}

fn create_committed_buffer(
    device: &ID3D12Device,
    heap_type: D3D12_HEAP_TYPE,
    byte_size: u64,
    initial_state: ResourceState,
) -> HostResult<ID3D12Resource> {
    let heap_props = D3D12_HEAP_PROPERTIES {
        Type: heap_type,
        ..Default::default()
    };
    let mut resource: Option<ID3D12Resource> = None;
    dx!(unsafe {
        device.CreateCommittedResource(
            &heap_props,
            D3D12_HEAP_FLAG_NONE,
            &buffer_desc(byte_size),
            initial_state.into(),
            None,
            &mut resource,
        )
    })?;
    Ok(resource.ok_or_else(|| eyre!("CreateCommittedResource returned no buffer"))?)
}

/// A GPU-only buffer and the staging buffer that fills it.
///
/// The staging buffer must outlive the copy recorded on the command list, so
/// keep this value until that list has executed and the queue was flushed.
pub struct DefaultBuffer {
    pub buffer: TrackedResource,
    pub uploader: ID3D12Resource,
}

impl DefaultBuffer {
    pub fn gpu_virtual_address(&self) -> u64 {
        unsafe { self.buffer.resource().GetGPUVirtualAddress() }
    }
}

/// Records a copy of `data` into a new DEFAULT-heap buffer on `command_list`.
pub fn create_default_buffer(
    device: &ID3D12Device,
    command_list: &ID3D12GraphicsCommandList,
    data: &[u8],
    name: PCWSTR,
) -> HostResult<DefaultBuffer> {
    let byte_size = data.len() as u64;
    let default_buffer = create_committed_buffer(
        device,
        D3D12_HEAP_TYPE_DEFAULT,
        byte_size,
        ResourceState::Common,
    )?;
    unsafe { default_buffer.SetName(name) }.ok();

    // CPU data goes through an intermediate upload heap first.
    let uploader = create_committed_buffer(
        device,
        D3D12_HEAP_TYPE_UPLOAD,
        byte_size,
        ResourceState::GenericRead,
    )?;
    unsafe {
        let mut mapped = std::ptr::null_mut();
        let read_range = D3D12_RANGE { Begin: 0, End: 0 };
        dx!(uploader.Map(0, Some(&read_range), Some(&mut mapped)))?;
        std::ptr::copy_nonoverlapping(data.as_ptr(), mapped.cast::<u8>(), data.len());
        uploader.Unmap(0, None);
    }

    let mut buffer = TrackedResource::new(default_buffer, ResourceState::Common);
    unsafe {
        command_list.ResourceBarrier(&[buffer.transition(ResourceState::Common, ResourceState::CopyDest)]);
        command_list.CopyBufferRegion(buffer.resource(), 0, &uploader, 0, byte_size);
        command_list.ResourceBarrier(&[
            buffer.transition(ResourceState::CopyDest, ResourceState::GenericRead),
        ]);
    }

    Ok(DefaultBuffer { buffer, uploader })
}

/// A buffer on the UPLOAD heap, mapped from creation until drop.
pub struct UploadHeapBuffer {
    resource: ID3D12Resource,
    mapped: *mut u8,
    byte_len: usize,
}

impl UploadHeapBuffer {
    pub fn new(device: &ID3D12Device, byte_len: usize) -> HostResult<Self> {
        let resource = create_committed_buffer(
            device,
            D3D12_HEAP_TYPE_UPLOAD,
            byte_len as u64,
            ResourceState::GenericRead,
        )?;
        let mut mapped = std::ptr::null_mut();
        // Never read back by the CPU; unmapped only on drop.
        dx!(unsafe { resource.Map(0, None, Some(&mut mapped)) })?;
        Ok(Self {
            resource,
            mapped: mapped.cast(),
            byte_len,
        })
    }

    pub fn resource(&self) -> &ID3D12Resource {
        &self.resource
    }

    pub fn gpu_virtual_address(&self) -> u64 {
        unsafe { self.resource.GetGPUVirtualAddress() }
    }
}

unsafe impl MappedBuffer for UploadHeapBuffer {
    fn mapped_ptr(&self) -> *mut u8 {
        self.mapped
    }

    fn byte_len(&self) -> usize {
        self.byte_len
    }
}

impl Drop for UploadHeapBuffer {
    fn drop(&mut self) {
        unsafe { self.resource.Unmap(0, None) };
    }
}

pub type GpuUploadRegion<T> = UploadRegion<T, UploadHeapBuffer>;

/// An upload region of `element_count` elements backed by a new upload heap buffer.
pub fn create_upload_region<T: Copy>(
    device: &ID3D12Device,
    element_count: usize,
    is_constant_buffer: bool,
) -> HostResult<GpuUploadRegion<T>> {
    let layout = crate::upload::UploadLayout::of::<T>(element_count, is_constant_buffer)?;
    let buffer = UploadHeapBuffer::new(device, layout.byte_len())?;
    UploadRegion::new(buffer, element_count, is_constant_buffer)
}
