use crate::window_state::WindowEvent;
use std::cell::RefCell;
use std::collections::VecDeque;
use tracing::warn;

/// Where the window procedure leaves decoded events for the frame host.
///
/// The window keeps a pointer to this in its user-data slot, so the host
/// never has to be reachable from the window procedure.
#[derive(Debug, Default)]
pub struct WindowMailbox {
    events: RefCell<VecDeque<WindowEvent>>,
}

impl WindowMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&self, event: WindowEvent) {
        match self.events.try_borrow_mut() {
            Ok(mut events) => events.push_back(event),
            Err(_) => warn!(?event, "mailbox busy, dropping window event"),
        }
    }

    /// Takes every pending event, oldest first.
    pub fn drain(&self) -> VecDeque<WindowEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window_state::SizeKind;

    #[test]
    fn drains_in_arrival_order() {
        let mailbox = WindowMailbox::new();
        mailbox.post(WindowEvent::EnterSizeMove);
        mailbox.post(WindowEvent::Resized {
            width: 640,
            height: 480,
            kind: SizeKind::Restored,
        });
        mailbox.post(WindowEvent::ExitSizeMove);

        let events: Vec<_> = mailbox.drain().into_iter().collect();
        assert_eq!(
            events,
            vec![
                WindowEvent::EnterSizeMove,
                WindowEvent::Resized {
                    width: 640,
                    height: 480,
                    kind: SizeKind::Restored,
                },
                WindowEvent::ExitSizeMove,
            ]
        );
        assert!(mailbox.is_empty());
    }

    #[test]
    fn post_while_draining_is_not_lost() {
        let mailbox = WindowMailbox::new();
        mailbox.post(WindowEvent::Activated);
        for _ in mailbox.drain() {
            // Handling an event can make Windows call back into the window procedure.
            mailbox.post(WindowEvent::Deactivated);
        }
        assert_eq!(mailbox.drain().pop_front(), Some(WindowEvent::Deactivated));
    }
}
