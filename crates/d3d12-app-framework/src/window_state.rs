use crate::clock::Clock;
use crate::clock::TimeSource;
use bitflags::bitflags;

pub const VK_ESCAPE_CODE: u16 = 0x1B;
pub const VK_F2_CODE: u16 = 0x71;

bitflags! {
    /// Mouse buttons and modifier keys held during a mouse message (`MK_*`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MouseButtons: u32 {
        const LEFT = 0x0001;
        const RIGHT = 0x0002;
        const SHIFT = 0x0004;
        const CONTROL = 0x0008;
        const MIDDLE = 0x0010;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeKind {
    Minimized,
    Maximized,
    Restored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseAction {
    Down,
    Up,
    Move,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub action: MouseAction,
    pub buttons: MouseButtons,
    pub x: i32,
    pub y: i32,
}

/// A window message the host cares about, already decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    Activated,
    Deactivated,
    Resized {
        width: u32,
        height: u32,
        kind: SizeKind,
    },
    EnterSizeMove,
    ExitSizeMove,
    Mouse(MouseEvent),
    KeyUp(u16),
}

/// Work the host must do in response to a window event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    /// Recreate the swap chain buffers and depth buffer at the current client size.
    Resize,
    ToggleMsaa,
    Quit,
    Mouse(MouseEvent),
}

/// Pause, minimize and drag bookkeeping for the main window.
#[derive(Debug, Clone)]
pub struct WindowState {
    client_width: u32,
    client_height: u32,
    paused: bool,
    minimized: bool,
    maximized: bool,
    resizing: bool,
    device_ready: bool,
    msaa_toggle_key: u16,
}

impl WindowState {
    pub fn new(client_width: u32, client_height: u32, msaa_toggle_key: u16) -> Self {
        Self {
            client_width,
            client_height,
            paused: false,
            minimized: false,
            maximized: false,
            resizing: false,
            device_ready: false,
            msaa_toggle_key,
        }
    }

    /// Size messages only update the stored size until the device exists.
    pub fn set_device_ready(&mut self, ready: bool) {
        self.device_ready = ready;
    }

    pub fn client_size(&self) -> (u32, u32) {
        (self.client_width, self.client_height)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_minimized(&self) -> bool {
        self.minimized
    }

    pub fn is_maximized(&self) -> bool {
        self.maximized
    }

    pub fn is_resizing(&self) -> bool {
        self.resizing
    }

    pub fn apply<S: TimeSource>(
        &mut self,
        event: WindowEvent,
        clock: &mut Clock<S>,
    ) -> Option<HostCommand> {
        match event {
            // Pause when the window is deactivated, unpause when it becomes active.
            WindowEvent::Deactivated => {
                self.paused = true;
                clock.stop();
                None
            }
            WindowEvent::Activated => {
                self.paused = false;
                clock.start();
                None
            }
            WindowEvent::Resized {
                width,
                height,
                kind,
            } => self.resized(width, height, kind),
            // The user grabbed the resize bars.
            WindowEvent::EnterSizeMove => {
                self.paused = true;
                self.resizing = true;
                clock.stop();
                None
            }
            // The user let go of the resize bars; rebuild everything for the new size.
            WindowEvent::ExitSizeMove => {
                self.paused = false;
                self.resizing = false;
                clock.start();
                self.device_ready.then_some(HostCommand::Resize)
            }
            WindowEvent::Mouse(mouse) => Some(HostCommand::Mouse(mouse)),
            WindowEvent::KeyUp(VK_ESCAPE_CODE) => Some(HostCommand::Quit),
            WindowEvent::KeyUp(key) if key == self.msaa_toggle_key => {
                Some(HostCommand::ToggleMsaa)
            }
            WindowEvent::KeyUp(_) => None,
        }
    }

    fn resized(&mut self, width: u32, height: u32, kind: SizeKind) -> Option<HostCommand> {
        self.client_width = width;
        self.client_height = height;
        if !self.device_ready {
            return None;
        }

        match kind {
            SizeKind::Minimized => {
                self.paused = true;
                self.minimized = true;
                self.maximized = false;
                None
            }
            SizeKind::Maximized => {
                self.paused = false;
                self.minimized = false;
                self.maximized = true;
                Some(HostCommand::Resize)
            }
            SizeKind::Restored if self.minimized => {
                self.paused = false;
                self.minimized = false;
                Some(HostCommand::Resize)
            }
            SizeKind::Restored if self.maximized => {
                self.paused = false;
                self.maximized = false;
                Some(HostCommand::Resize)
            }
            // A size message per pixel of drag; wait for ExitSizeMove.
            SizeKind::Restored if self.resizing => None,
            // SetWindowPos, or the swap chain leaving full screen.
            SizeKind::Restored => Some(HostCommand::Resize),
        }
    }
}

/// Client coordinates from a mouse message's `lParam`. Both halves are
/// signed so positions left of or above a captured window come out negative.
pub fn unpack_mouse_position(lparam: isize) -> (i32, i32) {
    let x = (lparam & 0xFFFF) as u16 as i16;
    let y = ((lparam >> 16) & 0xFFFF) as u16 as i16;
    (i32::from(x), i32::from(y))
}

/// Client width and height from a `WM_SIZE` `lParam`.
pub fn unpack_client_size(lparam: isize) -> (u32, u32) {
    ((lparam & 0xFFFF) as u32, ((lparam >> 16) & 0xFFFF) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualTimeSource;

    fn ready_state() -> (ManualTimeSource, Clock<ManualTimeSource>, WindowState) {
        let source = ManualTimeSource::millis();
        let mut clock = Clock::with_source(source.clone());
        clock.reset();
        let mut state = WindowState::new(800, 600, VK_F2_CODE);
        state.set_device_ready(true);
        (source, clock, state)
    }

    fn resized(width: u32, height: u32, kind: SizeKind) -> WindowEvent {
        WindowEvent::Resized {
            width,
            height,
            kind,
        }
    }

    #[test]
    fn deactivation_pauses_the_clock() {
        let (source, mut clock, mut state) = ready_state();
        source.advance(100);
        state.apply(WindowEvent::Deactivated, &mut clock);
        assert!(state.is_paused());
        assert!(clock.is_stopped());

        source.advance(1_000);
        state.apply(WindowEvent::Activated, &mut clock);
        assert!(!state.is_paused());
        assert!((clock.total_time() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn size_messages_before_the_device_only_store_the_size() {
        let source = ManualTimeSource::millis();
        let mut clock = Clock::with_source(source);
        let mut state = WindowState::new(800, 600, VK_F2_CODE);
        let command = state.apply(resized(1024, 768, SizeKind::Restored), &mut clock);
        assert_eq!(command, None);
        assert_eq!(state.client_size(), (1024, 768));
        let command = state.apply(resized(0, 0, SizeKind::Minimized), &mut clock);
        assert_eq!(command, None);
        assert!(!state.is_minimized());
    }

    #[test]
    fn drag_resizes_once_when_released() {
        let (_source, mut clock, mut state) = ready_state();
        assert_eq!(state.apply(WindowEvent::EnterSizeMove, &mut clock), None);
        assert!(state.is_paused() && state.is_resizing() && clock.is_stopped());

        for width in 801..=840 {
            let command = state.apply(resized(width, 600, SizeKind::Restored), &mut clock);
            assert_eq!(command, None);
        }

        let command = state.apply(WindowEvent::ExitSizeMove, &mut clock);
        assert_eq!(command, Some(HostCommand::Resize));
        assert_eq!(state.client_size(), (840, 600));
        assert!(!state.is_paused() && !state.is_resizing() && !clock.is_stopped());
    }

    #[test]
    fn programmatic_resize_happens_immediately() {
        let (_source, mut clock, mut state) = ready_state();
        let command = state.apply(resized(640, 480, SizeKind::Restored), &mut clock);
        assert_eq!(command, Some(HostCommand::Resize));
    }

    #[test]
    fn minimize_then_restore() {
        let (_source, mut clock, mut state) = ready_state();
        assert_eq!(state.apply(resized(0, 0, SizeKind::Minimized), &mut clock), None);
        assert!(state.is_paused() && state.is_minimized());

        let command = state.apply(resized(800, 600, SizeKind::Restored), &mut clock);
        assert_eq!(command, Some(HostCommand::Resize));
        assert!(!state.is_paused() && !state.is_minimized());
    }

    #[test]
    fn maximize_then_restore() {
        let (_source, mut clock, mut state) = ready_state();
        let command = state.apply(resized(1920, 1080, SizeKind::Maximized), &mut clock);
        assert_eq!(command, Some(HostCommand::Resize));
        assert!(state.is_maximized());

        let command = state.apply(resized(800, 600, SizeKind::Restored), &mut clock);
        assert_eq!(command, Some(HostCommand::Resize));
        assert!(!state.is_maximized());
    }

    #[test]
    fn keys() {
        let (_source, mut clock, mut state) = ready_state();
        assert_eq!(
            state.apply(WindowEvent::KeyUp(VK_ESCAPE_CODE), &mut clock),
            Some(HostCommand::Quit)
        );
        assert_eq!(
            state.apply(WindowEvent::KeyUp(VK_F2_CODE), &mut clock),
            Some(HostCommand::ToggleMsaa)
        );
        assert_eq!(state.apply(WindowEvent::KeyUp(b'A' as u16), &mut clock), None);
    }

    #[test]
    fn mouse_events_are_forwarded() {
        let (_source, mut clock, mut state) = ready_state();
        let mouse = MouseEvent {
            action: MouseAction::Move,
            buttons: MouseButtons::LEFT | MouseButtons::SHIFT,
            x: 10,
            y: -3,
        };
        assert_eq!(
            state.apply(WindowEvent::Mouse(mouse), &mut clock),
            Some(HostCommand::Mouse(mouse))
        );
    }

    #[test]
    fn unknown_button_bits_are_dropped() {
        let buttons = MouseButtons::from_bits_truncate(0x0001 | 0x0020 | 0x0040);
        assert_eq!(buttons, MouseButtons::LEFT);
    }

    #[test]
    fn mouse_position_is_signed() {
        assert_eq!(unpack_mouse_position(0x0020_0010), (16, 32));
        // (-5, -1) as sent while the mouse is captured and left of the window.
        assert_eq!(unpack_mouse_position(0xFFFF_FFFB_u32 as isize), (-5, -1));
    }

    #[test]
    fn client_size_halves() {
        assert_eq!(unpack_client_size((600 << 16) | 800), (800, 600));
        assert_eq!(unpack_client_size(0), (0, 0));
    }
}
