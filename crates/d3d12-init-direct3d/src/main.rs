#[cfg(windows)]
mod init_direct3d_app;

#[cfg(windows)]
fn main() {
    use d3d12_app_framework::host::run_sample;
    use init_direct3d_app::InitDirect3dApp;

    std::process::exit(run_sample::<InitDirect3dApp>("Init Direct3D"));
}

#[cfg(not(windows))]
fn main() -> d3d12_app_framework::HostResult<()> {
    d3d12_app_framework::logging::init()?;
    tracing::error!("Init Direct3D needs Windows and a Direct3D 12 runtime");
    Ok(())
}
