use crate::dx;
use crate::error::HostResult;
use crate::sync::FenceTimeline;
use windows::Win32::Foundation::*;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::System::Threading::*;

/// The direct queue's fence plus the event the CPU sleeps on.
pub struct FenceSync {
    queue: ID3D12CommandQueue,
    fence: ID3D12Fence,
    event: HANDLE,
}

impl FenceSync {
    pub fn new(device: &ID3D12Device, queue: &ID3D12CommandQueue) -> HostResult<Self> {
        let fence: ID3D12Fence = dx!(unsafe { device.CreateFence(0, D3D12_FENCE_FLAG_NONE) })?;
        let event = dx!(unsafe { CreateEventW(None, false, false, None) })?;
        Ok(Self {
            queue: queue.clone(),
            fence,
            event,
        })
    }
}

impl FenceTimeline for FenceSync {
    fn signal(&self, value: u64) -> HostResult<()> {
        dx!(unsafe { self.queue.Signal(&self.fence, value) })?;
        Ok(())
    }

    fn completed_value(&self) -> u64 {
        unsafe { self.fence.GetCompletedValue() }
    }

    fn wait_for(&self, value: u64) -> HostResult<()> {
        // Fire the event when the GPU hits the fence value, then sleep on it.
        dx!(unsafe { self.fence.SetEventOnCompletion(value, self.event) })?;
        unsafe { WaitForSingleObjectEx(self.event, INFINITE, false) };
        Ok(())
    }
}

impl Drop for FenceSync {
    fn drop(&mut self) {
        unsafe {
            let _ = CloseHandle(self.event);
        }
    }
}
