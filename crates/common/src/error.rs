/// Errors from loading or validating a [`FieldConfig`](crate::FieldConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("side_count must be odd and at least 1, got {0}")]
    InvalidSideCount(u32),
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },
    #[error("culling_fraction must be in (0, 1], got {0}")]
    CullingFraction(f32),
}

/// Errors from wrapping raw float data as a transform buffer.
#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    #[error("buffer length {len} is not a multiple of 16")]
    RaggedLength { len: usize },
}
