//! wgpu render backend for the cube field.
//!
//! Draws every instance with a single instanced call. The per-instance vertex
//! stream is the flat transform buffer as-is: four `vec4` rows per instance,
//! transposed back into a model matrix in the vertex shader.
//!
//! # Invariants
//! - The renderer never writes the CPU-side transform buffer.
//! - The GPU instance buffer is written only through [`QueueSink`].
//! - Camera motion lives here, outside the update pass.

mod camera;
mod error;
mod gpu;
mod shaders;
mod sink;

pub use camera::FlyCamera;
pub use error::{REQUIRED_VERTEX_ATTRIBUTES, RenderError, check_capabilities};
pub use gpu::InstanceRenderer;
pub use sink::{QueueSink, RunBatcher};
