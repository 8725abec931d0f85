use crate::geometry::VERTEX_COLOR_OFFSET;
use d3d12_app_framework::d3d12::compile_shader;
use d3d12_app_framework::d3d12::create_root_signature;
use d3d12_app_framework::d3d12::shader_bytecode;
use d3d12_app_framework::d3d12::BACK_BUFFER_FORMAT;
use d3d12_app_framework::d3d12::DEPTH_STENCIL_FORMAT;
use d3d12_app_framework::dx;
use d3d12_app_framework::HostResult;
use eyre::eyre;
use std::path::PathBuf;
use tracing::debug;
use windows::core::*;
use windows::Win32::Foundation::*;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;

const SHADER_FILE: &str = "color.hlsl";

/// `shaders/color.hlsl` next to the executable, or in the crate when run through cargo.
pub fn shader_path() -> HostResult<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.to_path_buf()))
    {
        candidates.push(exe_dir.join("shaders").join(SHADER_FILE));
    }
    candidates.push(
        std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("shaders")
            .join(SHADER_FILE),
    );

    let found = candidates.iter().find(|path| path.exists()).cloned();
    match found {
        Some(path) => {
            debug!(path = %path.display(), "using shader source");
            Ok(path)
        }
        None => Err(eyre!("{SHADER_FILE} not found, looked in {candidates:?}").into()),
    }
}

/// One root parameter: a descriptor table holding a single CBV at `b0`.
pub fn create_box_root_signature(device: &ID3D12Device) -> HostResult<ID3D12RootSignature> {
    let cbv_table = [D3D12_DESCRIPTOR_RANGE {
        RangeType: D3D12_DESCRIPTOR_RANGE_TYPE_CBV,
        NumDescriptors: 1,
        BaseShaderRegister: 0,
        RegisterSpace: 0,
        OffsetInDescriptorsFromTableStart: D3D12_DESCRIPTOR_RANGE_OFFSET_APPEND,
    }];
    let parameters = [D3D12_ROOT_PARAMETER {
        ParameterType: D3D12_ROOT_PARAMETER_TYPE_DESCRIPTOR_TABLE,
        Anonymous: D3D12_ROOT_PARAMETER_0 {
            DescriptorTable: D3D12_ROOT_DESCRIPTOR_TABLE {
                NumDescriptorRanges: cbv_table.len() as u32,
                pDescriptorRanges: cbv_table.as_ptr(),
            },
        },
        ShaderVisibility: D3D12_SHADER_VISIBILITY_ALL,
    }];
    let desc = D3D12_ROOT_SIGNATURE_DESC {
        NumParameters: parameters.len() as u32,
        pParameters: parameters.as_ptr(),
        NumStaticSamplers: 0,
        pStaticSamplers: std::ptr::null(),
        Flags: D3D12_ROOT_SIGNATURE_FLAG_ALLOW_INPUT_ASSEMBLER_INPUT_LAYOUT,
    };
    create_root_signature(device, &desc)
}

/// Compiles `VS`/`PS` from `color.hlsl` and builds the one pipeline the box needs.
pub fn create_box_pipeline_state(
    device: &ID3D12Device,
    root_signature: &ID3D12RootSignature,
    sample_desc: DXGI_SAMPLE_DESC,
) -> HostResult<ID3D12PipelineState> {
    let shader_path = shader_path()?;
    let vertex_shader = compile_shader(&shader_path, "VS", "vs_5_0")?;
    let pixel_shader = compile_shader(&shader_path, "PS", "ps_5_0")?;

    let input_element_descs = [
        D3D12_INPUT_ELEMENT_DESC {
            SemanticName: s!("POSITION"),
            Format: DXGI_FORMAT_R32G32B32_FLOAT,
            InputSlotClass: D3D12_INPUT_CLASSIFICATION_PER_VERTEX_DATA,
            ..Default::default()
        },
        D3D12_INPUT_ELEMENT_DESC {
            SemanticName: s!("COLOR"),
            Format: DXGI_FORMAT_R32G32B32A32_FLOAT,
            AlignedByteOffset: VERTEX_COLOR_OFFSET,
            InputSlotClass: D3D12_INPUT_CLASSIFICATION_PER_VERTEX_DATA,
            ..Default::default()
        },
    ];

    let mut rtv_formats = [DXGI_FORMAT_UNKNOWN; 8];
    rtv_formats[0] = BACK_BUFFER_FORMAT;

    let pso_desc = D3D12_GRAPHICS_PIPELINE_STATE_DESC {
        pRootSignature: unsafe { std::mem::transmute_copy(root_signature) },
        VS: shader_bytecode(&vertex_shader),
        PS: shader_bytecode(&pixel_shader),
        InputLayout: D3D12_INPUT_LAYOUT_DESC {
            pInputElementDescs: input_element_descs.as_ptr(),
            NumElements: input_element_descs.len() as u32,
        },
        RasterizerState: default_rasterizer_desc(),
        BlendState: default_blend_desc(),
        DepthStencilState: default_depth_stencil_desc(),
        SampleMask: u32::MAX,
        PrimitiveTopologyType: D3D12_PRIMITIVE_TOPOLOGY_TYPE_TRIANGLE,
        NumRenderTargets: 1,
        RTVFormats: rtv_formats,
        DSVFormat: DEPTH_STENCIL_FORMAT,
        SampleDesc: sample_desc,
        ..Default::default()
    };

    let pipeline_state = dx!(unsafe { device.CreateGraphicsPipelineState(&pso_desc) })?;
    Ok(pipeline_state)
}

/// `CD3DX12_RASTERIZER_DESC(D3D12_DEFAULT)`: solid, back faces culled, clockwise is front.
fn default_rasterizer_desc() -> D3D12_RASTERIZER_DESC {
    D3D12_RASTERIZER_DESC {
        FillMode: D3D12_FILL_MODE_SOLID,
        CullMode: D3D12_CULL_MODE_BACK,
        FrontCounterClockwise: FALSE,
        DepthBias: D3D12_DEFAULT_DEPTH_BIAS as i32,
        DepthBiasClamp: D3D12_DEFAULT_DEPTH_BIAS_CLAMP,
        SlopeScaledDepthBias: D3D12_DEFAULT_SLOPE_SCALED_DEPTH_BIAS,
        DepthClipEnable: TRUE,
        MultisampleEnable: FALSE,
        AntialiasedLineEnable: FALSE,
        ForcedSampleCount: 0,
        ConservativeRaster: D3D12_CONSERVATIVE_RASTERIZATION_MODE_OFF,
    }
}

/// `CD3DX12_BLEND_DESC(D3D12_DEFAULT)`: blending off, all channels written.
fn default_blend_desc() -> D3D12_BLEND_DESC {
    D3D12_BLEND_DESC {
        AlphaToCoverageEnable: FALSE,
        IndependentBlendEnable: FALSE,
        RenderTarget: [D3D12_RENDER_TARGET_BLEND_DESC {
            BlendEnable: FALSE,
            LogicOpEnable: FALSE,
            SrcBlend: D3D12_BLEND_ONE,
            DestBlend: D3D12_BLEND_ZERO,
            BlendOp: D3D12_BLEND_OP_ADD,
            SrcBlendAlpha: D3D12_BLEND_ONE,
            DestBlendAlpha: D3D12_BLEND_ZERO,
            BlendOpAlpha: D3D12_BLEND_OP_ADD,
            LogicOp: D3D12_LOGIC_OP_NOOP,
            RenderTargetWriteMask: D3D12_COLOR_WRITE_ENABLE_ALL.0 as u8,
        }; 8],
    }
}

/// `CD3DX12_DEPTH_STENCIL_DESC(D3D12_DEFAULT)`: depth test LESS with writes, stencil off.
fn default_depth_stencil_desc() -> D3D12_DEPTH_STENCIL_DESC {
    let keep = D3D12_DEPTH_STENCILOP_DESC {
        StencilFailOp: D3D12_STENCIL_OP_KEEP,
        StencilDepthFailOp: D3D12_STENCIL_OP_KEEP,
        StencilPassOp: D3D12_STENCIL_OP_KEEP,
        StencilFunc: D3D12_COMPARISON_FUNC_ALWAYS,
    };
    D3D12_DEPTH_STENCIL_DESC {
        DepthEnable: TRUE,
        DepthWriteMask: D3D12_DEPTH_WRITE_MASK_ALL,
        DepthFunc: D3D12_COMPARISON_FUNC_LESS,
        StencilEnable: FALSE,
        StencilReadMask: D3D12_DEFAULT_STENCIL_READ_MASK as u8,
        StencilWriteMask: D3D12_DEFAULT_STENCIL_WRITE_MASK as u8,
        FrontFace: keep,
        BackFace: keep,
    }
}
