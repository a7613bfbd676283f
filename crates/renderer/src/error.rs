use thiserror::Error;

/// Failures while bringing up the GPU context. Each variant aborts only the
/// initialization step that failed; callers log the diagnostic and carry on
/// (or exit cleanly) instead of panicking.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create rendering surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to acquire GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
}
