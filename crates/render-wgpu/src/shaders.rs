/// WGSL shader for the instanced cube field.
///
/// Each instance arrives as the four rows of its transform (the transform
/// buffer stores matrices transposed). Building a matrix from them yields the
/// transpose, so the shader transposes once more to get the model matrix.
pub const FIELD_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) row_0: vec4<f32>,
    @location(3) row_1: vec4<f32>,
    @location(4) row_2: vec4<f32>,
    @location(5) row_3: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
    @location(1) color: vec3<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = transpose(mat4x4<f32>(
        instance.row_0,
        instance.row_1,
        instance.row_2,
        instance.row_3,
    ));
    let world_pos = model * vec4<f32>(vertex.position, 1.0);
    let world_normal = (model * vec4<f32>(vertex.normal, 0.0)).xyz;

    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * world_pos;
    out.world_normal = normalize(world_normal);
    // Tint by face normal so rotation is visible without textures.
    out.color = abs(vertex.normal) * 0.5 + vec3<f32>(0.35, 0.45, 0.6);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let light_dir = normalize(vec3<f32>(0.3, 1.0, 0.5));
    let ambient = 0.3;
    let diffuse = max(dot(in.world_normal, light_dir), 0.0);
    let lighting = ambient + diffuse * 0.7;
    return vec4<f32>(in.color * lighting, 1.0);
}
"#;
