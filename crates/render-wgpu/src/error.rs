use cubefield_common::BLOCK_LEN;

/// Vertex attributes the instanced pipeline binds: position, normal and four
/// transform rows.
pub const REQUIRED_VERTEX_ATTRIBUTES: u32 = 6;

const INSTANCE_STRIDE: u64 = (BLOCK_LEN * std::mem::size_of::<f32>()) as u64;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("GPU cannot run the instanced pipeline: {what} needs {required}, device allows {available}")]
    CapabilityUnavailable {
        what: &'static str,
        required: u64,
        available: u64,
    },
    #[error("no suitable GPU adapter found")]
    NoAdapter,
    #[error("surface creation failed: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("device request failed: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
}

/// Check that a device with `limits` can hold and draw `instance_count` instances.
pub fn check_capabilities(limits: &wgpu::Limits, instance_count: usize) -> Result<(), RenderError> {
    let buffer_size = instance_count as u64 * INSTANCE_STRIDE;
    let checks = [
        ("instance buffer size", buffer_size, limits.max_buffer_size),
        (
            "vertex attributes",
            REQUIRED_VERTEX_ATTRIBUTES as u64,
            limits.max_vertex_attributes as u64,
        ),
        (
            "vertex buffer stride",
            INSTANCE_STRIDE,
            limits.max_vertex_buffer_array_stride as u64,
        ),
    ];
    for (what, required, available) in checks {
        if required > available {
            return Err(RenderError::CapabilityUnavailable {
                what,
                required,
                available,
            });
        }
    }
    Ok(())
}
