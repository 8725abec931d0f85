use std::fmt;

pub type HostResult<T, E = HostReport> = core::result::Result<T, E>;

/// A graphics or windowing call that returned a failure code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DxError {
    pub function: String,
    pub file: &'static str,
    pub line: u32,
    pub code: i32,
    pub message: String,
}

impl DxError {
    pub fn new(
        function: impl Into<String>,
        file: &'static str,
        line: u32,
        code: i32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            function: call_text(&function.into()),
            file,
            line,
            code,
            message: message.into(),
        }
    }

    #[cfg(windows)]
    pub fn from_windows(
        error: &windows::core::Error,
        function: &str,
        file: &'static str,
        line: u32,
    ) -> Self {
        Self::new(function, file, line, error.code().0, error.message().to_string())
    }
}

impl fmt::Display for DxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed in {}; line {}; error: {}",
            self.function, self.file, self.line, self.message
        )
    }
}

impl std::error::Error for DxError {}

/// Strips the `unsafe { .. }` wrapper that `stringify!` keeps around the call,
/// and the `.ok()` that turns an `HRESULT` into a `Result`.
fn call_text(expression: &str) -> String {
    let trimmed = without_ok_suffix(expression.trim());
    let inner = trimmed
        .strip_prefix("unsafe")
        .map(str::trim_start)
        .and_then(|rest| rest.strip_prefix('{'))
        .and_then(|rest| rest.strip_suffix('}'));
    match inner {
        Some(inner) => without_ok_suffix(inner.trim().trim_end_matches(';').trim()).to_owned(),
        None => trimmed.to_owned(),
    }
}

fn without_ok_suffix(expression: &str) -> &str {
    expression
        .strip_suffix("ok()")
        .map(str::trim_end)
        .and_then(|rest| rest.strip_suffix('.'))
        .map(str::trim_end)
        .unwrap_or(expression)
}

/// Wraps a fallible graphics call, recording the call text and source location on failure.
///
/// ```ignore
/// let fence: ID3D12Fence = dx!(unsafe { device.CreateFence(0, D3D12_FENCE_FLAG_NONE) })?;
/// ```
#[macro_export]
macro_rules! dx {
    ($call:expr) => {
        ($call).map_err(|error| {
            $crate::error::DxError::from_windows(&error, stringify!($call), file!(), line!())
        })
    };
}

pub struct HostReport {
    inner: eyre::Report,
}

impl HostReport {
    pub fn inner(&self) -> &eyre::Report {
        &self.inner
    }

    pub fn into_inner(self) -> eyre::Report {
        self.inner
    }
}

impl From<eyre::Report> for HostReport {
    fn from(report: eyre::Report) -> Self {
        Self { inner: report }
    }
}

impl From<DxError> for HostReport {
    fn from(error: DxError) -> Self {
        Self {
            inner: eyre::Report::new(error),
        }
    }
}

#[cfg(windows)]
impl From<windows::core::Error> for HostReport {
    // `?` on a bare windows call still records where it happened.
    #[track_caller]
    fn from(error: windows::core::Error) -> Self {
        let location = std::panic::Location::caller();
        DxError::from_windows(&error, "<windows call>", location.file(), location.line()).into()
    }
}

impl fmt::Display for HostReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl fmt::Debug for HostReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

/// The process exit code for a finished run.
///
/// A fatal error is handed to `report` and still exits with 0.
pub fn exit_code_or_report(result: HostResult<i32>, report: impl FnOnce(&HostReport)) -> i32 {
    match result {
        Ok(exit_code) => exit_code,
        Err(error) => {
            report(&error);
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_like_the_message_box_text() {
        let error = DxError::new(
            "device.CreateFence(0, D3D12_FENCE_FLAG_NONE)",
            "src/d3d12/graphics_context.rs",
            42,
            0x887A0005u32 as i32,
            "The GPU device instance has been suspended.",
        );
        assert_eq!(
            error.to_string(),
            "device.CreateFence(0, D3D12_FENCE_FLAG_NONE) failed in src/d3d12/graphics_context.rs; \
             line 42; error: The GPU device instance has been suspended."
        );
    }

    #[test]
    fn unsafe_block_is_stripped_from_call_text() {
        assert_eq!(
            call_text("unsafe { swap_chain.Present(0, DXGI_PRESENT(0)) }"),
            "swap_chain.Present(0, DXGI_PRESENT(0))"
        );
        assert_eq!(call_text("unsafe {queue.Signal(&fence, 3)}"), "queue.Signal(&fence, 3)");
        assert_eq!(call_text("factory.EnumWarpAdapter()"), "factory.EnumWarpAdapter()");
    }

    #[test]
    fn hresult_ok_adapter_is_stripped_from_call_text() {
        assert_eq!(
            call_text("unsafe { swap_chain.Present(0, DXGI_PRESENT(0)) }.ok()"),
            "swap_chain.Present(0, DXGI_PRESENT(0))"
        );
        assert_eq!(
            call_text("unsafe { swap_chain.Present(0, DXGI_PRESENT(0)).ok() }"),
            "swap_chain.Present(0, DXGI_PRESENT(0))"
        );
        assert_eq!(call_text("unsafe { device.GetDeviceRemovedReason() } . ok()"), "device.GetDeviceRemovedReason()");
        // Only a trailing adapter call goes, not methods that merely end in "ok".
        assert_eq!(call_text("window.lookup_ok()"), "window.lookup_ok()");
    }

    #[test]
    fn report_keeps_the_dx_error_reachable() {
        let report: HostReport = DxError::new("Reset()", "lib.rs", 7, -1, "E_FAIL").into();
        assert_eq!(report.to_string(), "Reset() failed in lib.rs; line 7; error: E_FAIL");
        let inner = report.inner().downcast_ref::<DxError>();
        assert_eq!(inner.map(|e| e.line), Some(7));
    }

    #[test]
    fn eyre_reports_convert_with_question_mark() {
        fn fails() -> HostResult<u32> {
            let adapters: u32 = Err(eyre::eyre!("no adapter"))?;
            Ok(adapters)
        }
        assert_eq!(fails().unwrap_err().to_string(), "no adapter");
    }

    #[test]
    fn fatal_errors_are_reported_and_exit_cleanly() {
        let mut reported = None;
        let result = crate::config::HostConfig::default()
            .apply_args(["--width", "abc"])
            .map(|_| 1);
        let code = exit_code_or_report(result, |error| reported = Some(error.to_string()));
        assert_eq!(code, 0);
        assert!(reported.is_some_and(|text| text.contains("--width")));
    }

    #[test]
    fn a_clean_run_keeps_its_exit_code() {
        let code = exit_code_or_report(Ok(3), |_| panic!("nothing to report"));
        assert_eq!(code, 3);
    }
}
