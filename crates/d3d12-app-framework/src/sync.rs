use crate::error::HostResult;
use tracing::trace;

/// The GPU side of a fence: a counter the queue bumps as it finishes work.
pub trait FenceTimeline {
    /// Enqueue a command that sets the fence to `value` once all prior work is done.
    fn signal(&self, value: u64) -> HostResult<()>;
    fn completed_value(&self) -> u64;
    /// Block the calling thread until the fence reaches `value`.
    fn wait_for(&self, value: u64) -> HostResult<()>;
}

/// CPU bookkeeping for the single direct queue's fence.
#[derive(Debug, Default)]
pub struct QueueFence {
    current: u64,
}

impl QueueFence {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last value handed to the queue.
    pub fn current_value(&self) -> u64 {
        self.current
    }

    /// Whether the GPU has finished every value handed to the queue, i.e. the
    /// command allocator may be reset.
    pub fn is_idle(&self, timeline: &impl FenceTimeline) -> bool {
        timeline.completed_value() >= self.current
    }

    /// Waits until the GPU has finished everything submitted so far.
    ///
    /// Returns the value that was signaled. The fence has reached it by the
    /// time this returns.
    pub fn flush(&mut self, timeline: &impl FenceTimeline) -> HostResult<u64> {
        // Advance the fence value to mark commands up to this fence point.
        self.current += 1;

        // The new fence point is set by the queue only after it has processed
        // every command before this Signal().
        timeline.signal(self.current)?;

        if timeline.completed_value() < self.current {
            trace!(target_value = self.current, "waiting for the GPU");
            timeline.wait_for(self.current)?;
        }
        Ok(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyre::eyre;
    use std::cell::Cell;

    /// A queue that finishes work either immediately or only when waited on.
    #[derive(Default)]
    struct SimulatedTimeline {
        signaled: Cell<u64>,
        completed: Cell<u64>,
        completes_eagerly: bool,
        waits: Cell<usize>,
    }

    impl SimulatedTimeline {
        fn lagging() -> Self {
            Self::default()
        }

        fn eager() -> Self {
            Self {
                completes_eagerly: true,
                ..Self::default()
            }
        }
    }

    impl FenceTimeline for SimulatedTimeline {
        fn signal(&self, value: u64) -> HostResult<()> {
            self.signaled.set(value);
            if self.completes_eagerly {
                self.completed.set(value);
            }
            Ok(())
        }

        fn completed_value(&self) -> u64 {
            self.completed.get()
        }

        fn wait_for(&self, value: u64) -> HostResult<()> {
            self.waits.set(self.waits.get() + 1);
            if self.signaled.get() < value {
                return Err(eyre!("waiting for {value} which was never signaled").into());
            }
            self.completed.set(self.signaled.get());
            Ok(())
        }
    }

    #[test]
    fn flush_returns_only_after_the_signaled_value_completes() {
        let timeline = SimulatedTimeline::lagging();
        let mut fence = QueueFence::new();
        for _ in 0..5 {
            let value = fence.flush(&timeline).unwrap();
            assert!(timeline.completed_value() >= value);
        }
        assert_eq!(timeline.waits.get(), 5);
    }

    #[test]
    fn fence_values_increase_by_one_per_flush() {
        let timeline = SimulatedTimeline::eager();
        let mut fence = QueueFence::new();
        let values: Vec<u64> = (0..4).map(|_| fence.flush(&timeline).unwrap()).collect();
        assert_eq!(values, vec![1, 2, 3, 4]);
        assert_eq!(fence.current_value(), 4);
    }

    #[test]
    fn no_wait_when_the_gpu_is_already_done() {
        let timeline = SimulatedTimeline::eager();
        let mut fence = QueueFence::new();
        fence.flush(&timeline).unwrap();
        fence.flush(&timeline).unwrap();
        assert_eq!(timeline.waits.get(), 0);
    }

    #[test]
    fn idle_only_once_the_last_signal_completes() {
        let timeline = SimulatedTimeline::lagging();
        let mut fence = QueueFence::new();
        assert!(fence.is_idle(&timeline));

        // Submitted but not yet finished: resetting the allocator is not allowed.
        timeline.signal(1).unwrap();
        fence.current = 1;
        assert!(!fence.is_idle(&timeline));

        fence.flush(&timeline).unwrap();
        assert!(fence.is_idle(&timeline));
    }

    #[test]
    fn signal_failure_propagates() {
        struct LostDevice;
        impl FenceTimeline for LostDevice {
            fn signal(&self, _value: u64) -> HostResult<()> {
                Err(eyre!("device removed").into())
            }
            fn completed_value(&self) -> u64 {
                0
            }
            fn wait_for(&self, _value: u64) -> HostResult<()> {
                Ok(())
            }
        }
        let mut fence = QueueFence::new();
        assert!(fence.flush(&LostDevice).is_err());
    }
}
