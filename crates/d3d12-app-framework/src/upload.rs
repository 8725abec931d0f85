use crate::error::HostResult;
use eyre::eyre;
use std::alloc::Layout;
use std::marker::PhantomData;
use std::ptr::NonNull;

/// Constant buffer views must start on, and span a multiple of, this many bytes.
pub const CONSTANT_BUFFER_ALIGNMENT: usize = 256;

/// Rounds `byte_size` up to the next multiple of 256, or `None` if that overflows.
///
/// e.g. 300 -> 512, 256 -> 256, 1 -> 256.
pub const fn constant_buffer_byte_size(byte_size: usize) -> Option<usize> {
    match byte_size.checked_add(CONSTANT_BUFFER_ALIGNMENT - 1) {
        Some(padded) => Some(padded & !(CONSTANT_BUFFER_ALIGNMENT - 1)),
        None => None,
    }
}

/// Where each element of an upload region lives.
///
/// Only built through [`UploadLayout::new`], so `stride * count` always fits
/// in a `usize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLayout {
    element_size: usize,
    stride: usize,
    count: usize,
}

impl UploadLayout {
    pub fn new(element_size: usize, count: usize, is_constant_buffer: bool) -> HostResult<Self> {
        let stride = if is_constant_buffer {
            constant_buffer_byte_size(element_size)
                .ok_or_else(|| eyre!("constant buffer element of {element_size} bytes is too large"))?
        } else {
            element_size
        };
        if stride.checked_mul(count).is_none() {
            return Err(eyre!("{count} upload elements of stride {stride} overflow the address space").into());
        }
        Ok(Self {
            element_size,
            stride,
            count,
        })
    }

    pub fn of<T>(count: usize, is_constant_buffer: bool) -> HostResult<Self> {
        Self::new(std::mem::size_of::<T>(), count, is_constant_buffer)
    }

    pub fn element_size(&self) -> usize {
        self.element_size
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn byte_len(&self) -> usize {
        // Checked in `new`.
        self.stride * self.count
    }

    /// Byte offset of slot `index`. Panics if `index` is not a slot.
    pub fn offset_of(&self, index: usize) -> usize {
        assert!(
            index < self.count,
            "upload slot {index} out of range for {} elements",
            self.count
        );
        index * self.stride
    }
}

/// CPU-visible memory that stays mapped for as long as the value lives.
///
/// # Safety
///
/// `mapped_ptr` must stay valid for writes of `byte_len` bytes until the value
/// is dropped, and must not move.
pub unsafe trait MappedBuffer {
    fn mapped_ptr(&self) -> *mut u8;
    fn byte_len(&self) -> usize;
}

/// Heap memory aligned like a constant buffer.
pub struct HostMappedBuffer {
    ptr: NonNull<u8>,
    layout: Layout,
    byte_len: usize,
}

impl HostMappedBuffer {
    pub fn new(byte_len: usize) -> HostResult<Self> {
        let layout = Layout::from_size_align(byte_len.max(1), CONSTANT_BUFFER_ALIGNMENT)
            .map_err(|error| eyre::eyre!("invalid upload buffer size {byte_len}: {error}"))?;
        // SAFETY: layout has a non-zero size.
        let raw = unsafe { std::alloc::alloc_zeroed(layout) };
        let Some(ptr) = NonNull::new(raw) else {
            std::alloc::handle_alloc_error(layout);
        };
        Ok(Self {
            ptr,
            layout,
            byte_len,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: the allocation is at least byte_len bytes and zero-initialized.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.byte_len) }
    }
}

unsafe impl MappedBuffer for HostMappedBuffer {
    fn mapped_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    fn byte_len(&self) -> usize {
        self.byte_len
    }
}

impl Drop for HostMappedBuffer {
    fn drop(&mut self) {
        // SAFETY: allocated in `new` with the same layout.
        unsafe { std::alloc::dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

/// A fixed-stride array of `T` in persistently mapped memory.
///
/// Nothing here tracks whether the GPU is still reading a slot. Callers
/// overwrite a slot only after the queue has been flushed past any
/// submission that referenced it.
pub struct UploadRegion<T: Copy, B: MappedBuffer> {
    buffer: B,
    mapped: NonNull<u8>,
    layout: UploadLayout,
    _element: PhantomData<T>,
}

impl<T: Copy, B: MappedBuffer> UploadRegion<T, B> {
    pub fn new(buffer: B, element_count: usize, is_constant_buffer: bool) -> HostResult<Self> {
        let layout = UploadLayout::of::<T>(element_count, is_constant_buffer)?;
        if buffer.byte_len() < layout.byte_len() {
            return Err(eyre!(
                "upload buffer holds {} bytes but {} elements of stride {} need {}",
                buffer.byte_len(),
                layout.count,
                layout.stride,
                layout.byte_len()
            ).into());
        }
        let Some(mapped) = NonNull::new(buffer.mapped_ptr()) else {
            return Err(eyre!("upload buffer is not mapped").into());
        };
        Ok(Self {
            buffer,
            mapped,
            layout,
            _element: PhantomData,
        })
    }

    /// Copies `value` into slot `index`.
    ///
    /// # Panics
    ///
    /// If `index` is outside the region.
    pub fn write(&mut self, index: usize, value: &T) {
        assert!(
            index < self.layout.count,
            "upload slot {index} out of range for {} elements",
            self.layout.count
        );
        // SAFETY: index is in range.
        unsafe { self.write_unchecked(index, value) }
    }

    /// Copies `value` into slot `index` without a release-mode bounds check.
    ///
    /// # Safety
    ///
    /// `index` must be less than [`Self::element_count`]; anything else writes
    /// past the slot and corrupts neighbouring memory.
    pub unsafe fn write_unchecked(&mut self, index: usize, value: &T) {
        debug_assert!(index < self.layout.count);
        // Slots never overflow: `byte_len` fits, and index < count.
        let destination = self.mapped.as_ptr().add(index * self.layout.stride);
        std::ptr::copy_nonoverlapping(
            (value as *const T).cast::<u8>(),
            destination,
            std::mem::size_of::<T>(),
        );
    }

    pub fn layout(&self) -> UploadLayout {
        self.layout
    }

    pub fn element_stride(&self) -> usize {
        self.layout.stride
    }

    pub fn element_count(&self) -> usize {
        self.layout.count
    }

    pub fn buffer(&self) -> &B {
        &self.buffer
    }
}
