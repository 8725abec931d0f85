use crate::dx;
use crate::error::HostResult;
use eyre::eyre;
use tracing::error;
use windows::core::PCSTR;
use windows::Win32::Graphics::Direct3D::ID3DBlob;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::System::Diagnostics::Debug::OutputDebugStringA;

/// Serializes `desc` as a version 1.0 root signature and creates it on `device`.
pub fn create_root_signature(
    device: &ID3D12Device,
    desc: &D3D12_ROOT_SIGNATURE_DESC,
) -> HostResult<ID3D12RootSignature> {
    let mut signature_blob: Option<ID3DBlob> = None;
    let mut error_blob: Option<ID3DBlob> = None;

    let serialize_result = unsafe {
        D3D12SerializeRootSignature(
            desc,
            D3D_ROOT_SIGNATURE_VERSION_1,
            &mut signature_blob,
            Some(&mut error_blob),
        )
    };

    if let Some(error) = error_blob {
        unsafe { OutputDebugStringA(PCSTR(error.GetBufferPointer().cast())) };
        let error_msg = unsafe {
            String::from_utf8_lossy(std::slice::from_raw_parts(
                error.GetBufferPointer() as *const u8,
                error.GetBufferSize(),
            ))
        };
        error!("Root signature serialization error: {}", error_msg.trim_end_matches('\0'));
    }
    dx!(serialize_result)?;

    let signature_blob =
        signature_blob.ok_or_else(|| eyre!("D3D12SerializeRootSignature produced no blob"))?;
    let signature_data: &[u8] = unsafe {
        std::slice::from_raw_parts(
            signature_blob.GetBufferPointer() as *const u8,
            signature_blob.GetBufferSize(),
        )
    };

    let root_signature = dx!(unsafe { device.CreateRootSignature(0, signature_data) })?;
    Ok(root_signature)
}
