use crate::dx;
use crate::error::HostResult;
use eyre::eyre;
use eyre::WrapErr;
use std::ffi::CString;
use std::path::Path;
use tracing::error;
use tracing::warn;
use windows::core::*;
use windows::Win32::Graphics::Direct3D::Fxc::*;
use windows::Win32::Graphics::Direct3D::*;
use windows::Win32::Graphics::Direct3D12::D3D12_SHADER_BYTECODE;
use windows::Win32::System::Diagnostics::Debug::OutputDebugStringA;

/// Compiles one entry point of an HLSL file, e.g. `("VS", "vs_5_0")`.
///
/// Debug builds compile with debug info and no optimization. Compiler
/// diagnostics go to the debugger output window and the log before the
/// failure is returned.
pub fn compile_shader(hlsl_path: &Path, entry_point: &str, target: &str) -> HostResult<ID3DBlob> {
    let compile_flags = if cfg!(debug_assertions) {
        D3DCOMPILE_DEBUG | D3DCOMPILE_SKIP_OPTIMIZATION
    } else {
        0
    };

    let file_name = HSTRING::from(hlsl_path);
    let entry_point_c = CString::new(entry_point).wrap_err("shader entry point contains NUL")?;
    let target_c = CString::new(target).wrap_err("shader target contains NUL")?;

    let mut byte_code = None;
    let mut errors = None;
    let result = unsafe {
        D3DCompileFromFile(
            &file_name,
            None,
            None,
            PCSTR(entry_point_c.as_ptr().cast()),
            PCSTR(target_c.as_ptr().cast()),
            compile_flags,
            0,
            &mut byte_code,
            Some(&mut errors),
        )
    };

    if let Some(errors) = errors {
        unsafe { OutputDebugStringA(PCSTR(errors.GetBufferPointer().cast())) };
        let message = unsafe {
            String::from_utf8_lossy(std::slice::from_raw_parts(
                errors.GetBufferPointer() as *const u8,
                errors.GetBufferSize(),
            ))
        };
        let message = message.trim_end_matches('\0').trim();
        let path = hlsl_path.display();
        if result.is_err() {
            error!(%path, entry_point, target, "{message}");
        } else {
            warn!(%path, entry_point, target, "{message}");
        }
    }

    dx!(result)?;
    byte_code.ok_or_else(|| eyre!("D3DCompileFromFile produced no byte code").into())
}

/// The blob's contents as the pipeline state expects them.
pub fn shader_bytecode(blob: &ID3DBlob) -> D3D12_SHADER_BYTECODE {
    D3D12_SHADER_BYTECODE {
        pShaderBytecode: unsafe { blob.GetBufferPointer() },
        BytecodeLength: unsafe { blob.GetBufferSize() },
    }
}
