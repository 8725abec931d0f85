use crate::error::HostResult;
use eyre::eyre;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPhase {
    Uninitialized,
    Initialized,
    Running,
    Paused,
    Terminated,
}

impl HostPhase {
    pub fn can_transition_to(self, next: HostPhase) -> bool {
        use HostPhase::*;
        matches!(
            (self, next),
            (Uninitialized, Initialized)
                | (Uninitialized, Terminated)
                | (Initialized, Running)
                | (Initialized, Terminated)
                | (Running, Paused)
                | (Paused, Running)
                | (Running, Terminated)
                | (Paused, Terminated)
        )
    }
}

#[derive(Debug)]
pub struct Lifecycle {
    phase: HostPhase,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            phase: HostPhase::Uninitialized,
        }
    }

    pub fn phase(&self) -> HostPhase {
        self.phase
    }

    pub fn advance(&mut self, next: HostPhase) -> HostResult<()> {
        if !self.phase.can_transition_to(next) {
            return Err(eyre!("frame host cannot go from {:?} to {:?}", self.phase, next).into());
        }
        debug!(from = ?self.phase, to = ?next, "frame host phase");
        self.phase = next;
        Ok(())
    }

    /// Follows the window's pause flag once the loop is running. Ignored before that.
    pub fn set_paused(&mut self, paused: bool) -> HostResult<()> {
        match (self.phase, paused) {
            (HostPhase::Running, true) => self.advance(HostPhase::Paused),
            (HostPhase::Paused, false) => self.advance(HostPhase::Running),
            _ => Ok(()),
        }
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

static HOST_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Proof that this is the only frame host in the process. Released on drop.
#[derive(Debug)]
pub struct HostInstanceGuard {
    _private: (),
}

impl HostInstanceGuard {
    pub fn acquire() -> HostResult<Self> {
        if HOST_ACTIVE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(eyre!("a frame host already exists in this process").into());
        }
        Ok(Self { _private: () })
    }
}

impl Drop for HostInstanceGuard {
    fn drop(&mut self) {
        HOST_ACTIVE.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_run() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.advance(HostPhase::Initialized).unwrap();
        lifecycle.set_paused(true).unwrap();
        assert_eq!(lifecycle.phase(), HostPhase::Initialized);

        lifecycle.advance(HostPhase::Running).unwrap();
        lifecycle.set_paused(true).unwrap();
        assert_eq!(lifecycle.phase(), HostPhase::Paused);
        lifecycle.set_paused(true).unwrap();
        lifecycle.set_paused(false).unwrap();
        assert_eq!(lifecycle.phase(), HostPhase::Running);
        lifecycle.advance(HostPhase::Terminated).unwrap();
    }

    #[test]
    fn illegal_transitions_are_rejected() {
        let mut lifecycle = Lifecycle::new();
        assert!(lifecycle.advance(HostPhase::Running).is_err());
        lifecycle.advance(HostPhase::Initialized).unwrap();
        assert!(lifecycle.advance(HostPhase::Paused).is_err());
        lifecycle.advance(HostPhase::Terminated).unwrap();
        assert!(lifecycle.advance(HostPhase::Running).is_err());
        assert!(lifecycle.advance(HostPhase::Initialized).is_err());
    }

    #[test]
    fn only_one_host_at_a_time() {
        let first = HostInstanceGuard::acquire().unwrap();
        assert!(HostInstanceGuard::acquire().is_err());
        drop(first);
        let second = HostInstanceGuard::acquire();
        assert!(second.is_ok());
    }
}
