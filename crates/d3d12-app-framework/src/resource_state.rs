/// How a GPU resource is about to be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceState {
    Common,
    Present,
    RenderTarget,
    DepthWrite,
    CopyDest,
    GenericRead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub before: ResourceState,
    pub after: ResourceState,
}

/// The recorded state of one resource, updated as barriers are recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedState {
    current: ResourceState,
}

impl TrackedState {
    pub fn new(initial: ResourceState) -> Self {
        Self { current: initial }
    }

    pub fn current(&self) -> ResourceState {
        self.current
    }

    /// Records a move to `after`.
    ///
    /// Debug builds panic if the resource is not in `expected_before`; the
    /// returned transition always starts from the recorded state.
    #[track_caller]
    pub fn transition(
        &mut self,
        expected_before: ResourceState,
        after: ResourceState,
    ) -> StateTransition {
        debug_assert_eq!(
            self.current, expected_before,
            "resource is in {:?}, expected {:?} before moving to {:?}",
            self.current, expected_before, after
        );
        self.transition_to(after)
    }

    pub fn transition_to(&mut self, after: ResourceState) -> StateTransition {
        let before = self.current;
        self.current = after;
        StateTransition { before, after }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn back_buffer_round_trip() {
        let mut state = TrackedState::new(ResourceState::Present);
        let to_target = state.transition(ResourceState::Present, ResourceState::RenderTarget);
        assert_eq!(
            to_target,
            StateTransition {
                before: ResourceState::Present,
                after: ResourceState::RenderTarget
            }
        );
        let to_present = state.transition(ResourceState::RenderTarget, ResourceState::Present);
        assert_eq!(to_present.before, ResourceState::RenderTarget);
        assert_eq!(state.current(), ResourceState::Present);
    }

    #[test]
    fn upload_copy_sequence() {
        let mut state = TrackedState::new(ResourceState::Common);
        state.transition(ResourceState::Common, ResourceState::CopyDest);
        let last = state.transition(ResourceState::CopyDest, ResourceState::GenericRead);
        assert_eq!(last.after, ResourceState::GenericRead);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "expected RenderTarget")]
    fn out_of_order_transition_is_caught_in_debug_builds() {
        let mut state = TrackedState::new(ResourceState::Present);
        state.transition(ResourceState::RenderTarget, ResourceState::Present);
    }

    #[test]
    fn transition_to_uses_the_recorded_state() {
        let mut state = TrackedState::new(ResourceState::Common);
        let t = state.transition_to(ResourceState::DepthWrite);
        assert_eq!(t.before, ResourceState::Common);
    }
}
