use super::window_class::register_window_class;
use super::window_class::WINDOW_CLASS_NAME;
use crate::config::HostConfig;
use crate::dx;
use crate::error::HostResult;
use crate::mailbox::WindowMailbox;
use eyre::WrapErr;
use tracing::debug;
use widestring::U16CString;
use windows::core::*;
use windows::Win32::Foundation::*;
use windows::Win32::Graphics::Gdi::UpdateWindow;
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::*;

/// The host's one top-level window and the mailbox its window procedure writes to.
pub struct MainWindow {
    hwnd: HWND,
    // Boxed so the address handed to the window stays put when `MainWindow` moves.
    mailbox: Box<WindowMailbox>,
}

impl MainWindow {
    /// Creates and shows a `WS_OVERLAPPEDWINDOW` whose client area is the configured size.
    pub fn create(config: &HostConfig) -> HostResult<Self> {
        let instance: HINSTANCE = dx!(unsafe { GetModuleHandleW(None) })?.into();
        register_window_class(instance)?;

        // Compute window rectangle dimensions based on requested client area dimensions.
        let mut window_rect = RECT {
            left: 0,
            top: 0,
            right: config.client_width as i32,
            bottom: config.client_height as i32,
        };
        dx!(unsafe { AdjustWindowRect(&mut window_rect, WS_OVERLAPPEDWINDOW, false) })?;

        let title = wide_string(&config.window_title())?;
        let mailbox = Box::new(WindowMailbox::new());
        let hwnd = dx!(unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE::default(),
                WINDOW_CLASS_NAME,
                PCWSTR(title.as_ptr()),
                WS_OVERLAPPEDWINDOW,
                CW_USEDEFAULT,
                CW_USEDEFAULT,
                window_rect.right - window_rect.left,
                window_rect.bottom - window_rect.top,
                None,
                None,
                Some(instance),
                Some(&*mailbox as *const WindowMailbox as _),
            )
        })?;

        unsafe {
            _ = ShowWindow(hwnd, SW_SHOW);
            _ = UpdateWindow(hwnd);
        }
        debug!(
            width = config.client_width,
            height = config.client_height,
            "main window created"
        );
        Ok(Self { hwnd, mailbox })
    }

    pub fn hwnd(&self) -> HWND {
        self.hwnd
    }

    pub fn mailbox(&self) -> &WindowMailbox {
        &self.mailbox
    }

    pub fn set_title(&self, text: &str) -> HostResult<()> {
        let text = wide_string(text)?;
        dx!(unsafe { SetWindowTextW(self.hwnd, PCWSTR(text.as_ptr())) })?;
        Ok(())
    }
}

impl Drop for MainWindow {
    fn drop(&mut self) {
        unsafe {
            // Stop the window procedure from touching the mailbox before it is freed.
            SetWindowLongPtrW(self.hwnd, GWLP_USERDATA, 0);
            // Fails harmlessly if WM_DESTROY already ran.
            _ = DestroyWindow(self.hwnd);
        }
    }
}

fn wide_string(text: &str) -> HostResult<U16CString> {
    Ok(U16CString::from_str(text).wrap_err_with(|| format!("{text:?} contains a NUL"))?)
}

/// Shows a fatal error the way every sample reports one: a modal box titled "HR Failed".
pub fn report_fatal(message: &str) {
    let text = U16CString::from_str_truncate(message);
    unsafe {
        _ = MessageBoxW(None, PCWSTR(text.as_ptr()), w!("HR Failed"), MB_OK);
    }
}
