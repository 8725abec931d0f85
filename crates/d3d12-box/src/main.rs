#[cfg(windows)]
fn main() {
    use d3d12_app_framework::host::run_sample;
    use d3d12_box::box_app::BoxApp;

    std::process::exit(run_sample::<BoxApp>("Box"));
}

#[cfg(not(windows))]
fn main() -> d3d12_app_framework::HostResult<()> {
    d3d12_app_framework::logging::init()?;
    tracing::error!("Box needs Windows and a Direct3D 12 runtime");
    Ok(())
}
