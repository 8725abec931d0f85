use crate::resource_state::ResourceState;
use crate::resource_state::StateTransition;
use crate::resource_state::TrackedState;
use std::mem::ManuallyDrop;
use windows::Win32::Graphics::Direct3D12::*;

impl From<ResourceState> for D3D12_RESOURCE_STATES {
    fn from(state: ResourceState) -> Self {
        match state {
            ResourceState::Common => D3D12_RESOURCE_STATE_COMMON,
            ResourceState::Present => D3D12_RESOURCE_STATE_PRESENT,
            ResourceState::RenderTarget => D3D12_RESOURCE_STATE_RENDER_TARGET,
            ResourceState::DepthWrite => D3D12_RESOURCE_STATE_DEPTH_WRITE,
            ResourceState::CopyDest => D3D12_RESOURCE_STATE_COPY_DEST,
            ResourceState::GenericRead => D3D12_RESOURCE_STATE_GENERIC_READ,
        }
    }
}

pub fn transition_barrier(
    resource: &ID3D12Resource,
    transition: StateTransition,
) -> D3D12_RESOURCE_BARRIER {
    D3D12_RESOURCE_BARRIER {
        Type: D3D12_RESOURCE_BARRIER_TYPE_TRANSITION,
        Flags: D3D12_RESOURCE_BARRIER_FLAG_NONE,
        Anonymous: D3D12_RESOURCE_BARRIER_0 {
            // The barrier borrows the resource pointer without an AddRef, so
            // the field must never be dropped.
            Transition: ManuallyDrop::new(D3D12_RESOURCE_TRANSITION_BARRIER {
                pResource: unsafe { std::mem::transmute_copy(resource) },
                StateBefore: transition.before.into(),
                StateAfter: transition.after.into(),
                Subresource: D3D12_RESOURCE_BARRIER_ALL_SUBRESOURCES,
            }),
        },
    }
}

/// A resource together with the state the command list has left it in.
#[derive(Debug)]
pub struct TrackedResource {
    resource: ID3D12Resource,
    state: TrackedState,
}

impl TrackedResource {
    pub fn new(resource: ID3D12Resource, initial: ResourceState) -> Self {
        Self {
            resource,
            state: TrackedState::new(initial),
        }
    }

    pub fn resource(&self) -> &ID3D12Resource {
        &self.resource
    }

    pub fn state(&self) -> ResourceState {
        self.state.current()
    }

    /// Records `expected_before -> after` and returns the barrier to submit.
    #[track_caller]
    pub fn transition(
        &mut self,
        expected_before: ResourceState,
        after: ResourceState,
    ) -> D3D12_RESOURCE_BARRIER {
        let transition = self.state.transition(expected_before, after);
        transition_barrier(&self.resource, transition)
    }
}
