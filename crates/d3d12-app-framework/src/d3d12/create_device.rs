use crate::dx;
use crate::error::HostResult;
use eyre::eyre;
use tracing::info;
use tracing::warn;
use windows::Win32::Graphics::Direct3D::*;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::*;

use super::log_adapters::wide_name;

/// Creates the DXGI factory and a feature level 11.0 device.
///
/// Uses the first hardware adapter that can create a device, and falls back to
/// WARP when there is none or when `use_warp_device` is set.
pub fn create_device(use_warp_device: bool) -> HostResult<(IDXGIFactory4, ID3D12Device)> {
    let mut debug_flags = DXGI_CREATE_FACTORY_FLAGS(0);
    if cfg!(debug_assertions) {
        unsafe {
            let mut debug: Option<ID3D12Debug> = None;
            if let Some(debug) = D3D12GetDebugInterface(&mut debug).ok().and(debug) {
                debug.EnableDebugLayer();
                debug_flags |= DXGI_CREATE_FACTORY_DEBUG;
                info!("D3D12 debug layer enabled");
            } else {
                warn!("D3D12 debug layer unavailable");
            }
        }
    }

    let dxgi_factory: IDXGIFactory4 = dx!(unsafe { CreateDXGIFactory2(debug_flags) })?;

    if !use_warp_device {
        match get_hardware_adapter(&dxgi_factory) {
            Ok(adapter) => {
                let mut device: Option<ID3D12Device> = None;
                dx!(unsafe { D3D12CreateDevice(&adapter, D3D_FEATURE_LEVEL_11_0, &mut device) })?;
                let device = device.ok_or_else(|| eyre!("D3D12CreateDevice returned no device"))?;
                return Ok((dxgi_factory, device));
            }
            Err(error) => warn!(%error, "no hardware adapter, falling back to WARP"),
        }
    }

    info!("Using WARP adapter.");
    let warp: IDXGIAdapter = dx!(unsafe { dxgi_factory.EnumWarpAdapter() })?;
    let mut device: Option<ID3D12Device> = None;
    dx!(unsafe { D3D12CreateDevice(&warp, D3D_FEATURE_LEVEL_11_0, &mut device) })?;
    let device = device.ok_or_else(|| eyre!("D3D12CreateDevice returned no WARP device"))?;
    Ok((dxgi_factory, device))
}

fn get_hardware_adapter(factory: &IDXGIFactory4) -> HostResult<IDXGIAdapter1> {
    // EnumAdapters1 fails with DXGI_ERROR_NOT_FOUND past the last adapter.
    for i in 0.. {
        let Ok(adapter) = (unsafe { factory.EnumAdapters1(i) }) else {
            break;
        };
        let desc = dx!(unsafe { adapter.GetDesc1() })?;

        if (DXGI_ADAPTER_FLAG(desc.Flags as i32) & DXGI_ADAPTER_FLAG_SOFTWARE)
            != DXGI_ADAPTER_FLAG_NONE
        {
            continue;
        }

        // Passing a null device only checks that creation would succeed.
        if unsafe {
            D3D12CreateDevice(
                &adapter,
                D3D_FEATURE_LEVEL_11_0,
                std::ptr::null_mut::<Option<ID3D12Device>>(),
            )
        }
        .is_ok()
        {
            info!(adapter = %wide_name(&desc.Description), "Using hardware adapter");
            return Ok(adapter);
        }
    }
    Err(eyre!("no hardware adapter supports feature level 11.0").into())
}
