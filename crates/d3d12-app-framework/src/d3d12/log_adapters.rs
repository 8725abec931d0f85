use tracing::info;
use tracing::warn;
use widestring::U16CStr;
use windows::Win32::Graphics::Dxgi::Common::*;
use windows::Win32::Graphics::Dxgi::*;

/// Reads a fixed-size, NUL-padded UTF-16 name out of a DXGI description.
pub fn wide_name(raw: &[u16]) -> String {
    U16CStr::from_slice_truncate(raw)
        .map(|name| name.to_string_lossy())
        .unwrap_or_else(|_| String::from_utf16_lossy(raw))
}

/// Logs every adapter, each adapter's outputs, and each output's display modes.
pub fn log_adapters(factory: &IDXGIFactory4, format: DXGI_FORMAT) {
    let mut i = 0;
    while let Ok(adapter) = unsafe { factory.EnumAdapters(i) } {
        match unsafe { adapter.GetDesc() } {
            Ok(desc) => info!("***Adapter: {}", wide_name(&desc.Description)),
            Err(error) => warn!(%error, "adapter {i} has no description"),
        }
        log_adapter_outputs(&adapter, format);
        i += 1;
    }
}

fn log_adapter_outputs(adapter: &IDXGIAdapter, format: DXGI_FORMAT) {
    let mut i = 0;
    while let Ok(output) = unsafe { adapter.EnumOutputs(i) } {
        if let Ok(desc) = unsafe { output.GetDesc() } {
            info!("***Output: {}", wide_name(&desc.DeviceName));
        }
        log_output_display_modes(&output, format);
        i += 1;
    }
}

fn log_output_display_modes(output: &IDXGIOutput, format: DXGI_FORMAT) {
    let mut count = 0u32;
    // Call with no buffer first to get the mode count.
    if let Err(error) =
        unsafe { output.GetDisplayModeList(format, Default::default(), &mut count, None) }
    {
        warn!(%error, "could not count display modes");
        return;
    }

    let mut modes = vec![DXGI_MODE_DESC::default(); count as usize];
    if let Err(error) = unsafe {
        output.GetDisplayModeList(
            format,
            Default::default(),
            &mut count,
            Some(modes.as_mut_ptr()),
        )
    } {
        warn!(%error, "could not list display modes");
        return;
    }

    for mode in modes.iter().take(count as usize) {
        info!(
            "Width = {} Height = {} Refresh = {}/{}",
            mode.Width, mode.Height, mode.RefreshRate.Numerator, mode.RefreshRate.Denominator
        );
    }
}
