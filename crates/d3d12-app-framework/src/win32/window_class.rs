use crate::dx;
use crate::error::DxError;
use crate::error::HostResult;
use crate::mailbox::WindowMailbox;
use crate::window_state::unpack_client_size;
use crate::window_state::unpack_mouse_position;
use crate::window_state::MouseAction;
use crate::window_state::MouseButtons;
use crate::window_state::MouseEvent;
use crate::window_state::SizeKind;
use crate::window_state::WindowEvent;
use windows::core::*;
use windows::Win32::Foundation::*;
use windows::Win32::UI::WindowsAndMessaging::*;

pub const WINDOW_CLASS_NAME: PCWSTR = w!("MainWnd");

/// Registers the main window class. Registering again in the same process is fine.
pub fn register_window_class(instance: HINSTANCE) -> HostResult<()> {
    let wc = WNDCLASSEXW {
        cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
        style: CS_HREDRAW | CS_VREDRAW,
        lpfnWndProc: Some(wndproc),
        hInstance: instance,
        hIcon: dx!(unsafe { LoadIconW(None, IDI_APPLICATION) })?,
        hCursor: dx!(unsafe { LoadCursorW(None, IDC_ARROW) })?,
        lpszClassName: WINDOW_CLASS_NAME,
        ..Default::default()
    };

    let atom = unsafe { RegisterClassExW(&wc) };
    if atom == 0 {
        let error = Error::from_win32();
        if error.code() != ERROR_CLASS_ALREADY_EXISTS.to_hresult() {
            return Err(
                DxError::from_windows(&error, "RegisterClassExW(&wc)", file!(), line!()).into(),
            );
        }
    }
    Ok(())
}

/// Decodes the messages the frame host reacts to.
pub fn translate_message(message: u32, wparam: WPARAM, lparam: LPARAM) -> Option<WindowEvent> {
    let mouse = |action| {
        let (x, y) = unpack_mouse_position(lparam.0);
        WindowEvent::Mouse(MouseEvent {
            action,
            buttons: MouseButtons::from_bits_truncate(wparam.0 as u32),
            x,
            y,
        })
    };

    let event = match message {
        WM_ACTIVATE => {
            if (wparam.0 & 0xFFFF) as u32 == WA_INACTIVE {
                WindowEvent::Deactivated
            } else {
                WindowEvent::Activated
            }
        }
        WM_SIZE => {
            let kind = match wparam.0 as u32 {
                SIZE_MINIMIZED => SizeKind::Minimized,
                SIZE_MAXIMIZED => SizeKind::Maximized,
                SIZE_RESTORED => SizeKind::Restored,
                _ => return None,
            };
            let (width, height) = unpack_client_size(lparam.0);
            WindowEvent::Resized {
                width,
                height,
                kind,
            }
        }
        WM_ENTERSIZEMOVE => WindowEvent::EnterSizeMove,
        WM_EXITSIZEMOVE => WindowEvent::ExitSizeMove,
        WM_LBUTTONDOWN | WM_MBUTTONDOWN | WM_RBUTTONDOWN => mouse(MouseAction::Down),
        WM_LBUTTONUP | WM_MBUTTONUP | WM_RBUTTONUP => mouse(MouseAction::Up),
        WM_MOUSEMOVE => mouse(MouseAction::Move),
        WM_KEYUP => WindowEvent::KeyUp(wparam.0 as u16),
        _ => return None,
    };
    Some(event)
}

extern "system" fn wndproc(window: HWND, message: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    match message {
        WM_CREATE => {
            unsafe {
                let create_struct: &CREATESTRUCTW = &*(lparam.0 as *const CREATESTRUCTW);
                SetWindowLongPtrW(window, GWLP_USERDATA, create_struct.lpCreateParams as _);
            }
            return LRESULT(0);
        }
        // Keep the window from becoming too small.
        WM_GETMINMAXINFO => {
            let info = unsafe { &mut *(lparam.0 as *mut MINMAXINFO) };
            info.ptMinTrackSize = POINT { x: 200, y: 200 };
            return LRESULT(0);
        }
        // Alt-Enter with no menu: close it without beeping (MNC_CLOSE in the high word).
        WM_MENUCHAR => return LRESULT(1 << 16),
        WM_DESTROY => {
            unsafe { PostQuitMessage(0) };
            return LRESULT(0);
        }
        _ => {}
    }

    let user_data = unsafe { GetWindowLongPtrW(window, GWLP_USERDATA) };
    if user_data == 0 {
        // We can get messages before WM_CREATE or after the host let go.
        return unsafe { DefWindowProcW(window, message, wparam, lparam) };
    }

    match translate_message(message, wparam, lparam) {
        Some(event) => {
            let mailbox = unsafe { &*(user_data as *const WindowMailbox) };
            mailbox.post(event);
            LRESULT(0)
        }
        None => unsafe { DefWindowProcW(window, message, wparam, lparam) },
    }
}
