/// Height gradient fill for the immediate backend. The vertex stage passes the
/// model-space z through; the fragment stage maps it onto the color ramp.
pub const GRADIENT_SHADER: &str = r#"
struct Uniforms {
    mvp: mat4x4<f32>,
    low_color: vec4<f32>,
    high_color: vec4<f32>,
    wire_color: vec4<f32>,
    point_color: vec4<f32>,
    height_range: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) height: f32,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = uniforms.mvp * vec4<f32>(position, 1.0);
    out.height = position.z;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let lo = uniforms.height_range.x;
    let span = uniforms.height_range.y - lo;
    var t: f32 = 0.0;
    if (abs(span) > 1e-6) {
        t = clamp((in.height - lo) / span, 0.0, 1.0);
    } else if (in.height >= uniforms.height_range.y) {
        t = 1.0;
    }
    let color = mix(uniforms.low_color.rgb, uniforms.high_color.rgb, t);
    return vec4<f32>(color, 1.0);
}
"#;

/// Flat wireframe color for the immediate backend, unlit.
pub const WIREFRAME_SHADER: &str = r#"
struct Uniforms {
    mvp: mat4x4<f32>,
    low_color: vec4<f32>,
    high_color: vec4<f32>,
    wire_color: vec4<f32>,
    point_color: vec4<f32>,
    height_range: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return uniforms.mvp * vec4<f32>(position, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(uniforms.wire_color.rgb, 1.0);
}
"#;

/// Flat point color for the immediate backend.
pub const POINT_SHADER: &str = r#"
struct Uniforms {
    mvp: mat4x4<f32>,
    low_color: vec4<f32>,
    high_color: vec4<f32>,
    wire_color: vec4<f32>,
    point_color: vec4<f32>,
    height_range: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return uniforms.mvp * vec4<f32>(position, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(uniforms.point_color.rgb, 1.0);
}
"#;

/// Lit surface material for the scene host: ambient plus one directional
/// light, Blinn-Phong highlight. Back faces flip their normal when the
/// material is double-sided.
pub const SCENE_LIT_SHADER: &str = r#"
struct Frame {
    view_proj: mat4x4<f32>,
    eye: vec4<f32>,
    ambient: vec4<f32>,
    light_dir: vec4<f32>,
    light_color: vec4<f32>,
};

struct Material {
    color: vec4<f32>,
    // x = shininess, y = double-sided flag
    params: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: Frame;

@group(1) @binding(0)
var<uniform> material: Material;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(1) normal: vec3<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = frame.view_proj * vec4<f32>(position, 1.0);
    out.world_pos = position;
    out.normal = normal;
    return out;
}

@fragment
fn fs_main(in: VertexOutput, @builtin(front_facing) front: bool) -> @location(0) vec4<f32> {
    var n = vec3<f32>(0.0, 0.0, 1.0);
    if (length(in.normal) > 1e-6) {
        n = normalize(in.normal);
    }
    if (!front && material.params.y > 0.5) {
        n = -n;
    }
    let l = normalize(frame.light_dir.xyz);
    let v = normalize(frame.eye.xyz - in.world_pos);
    let h = normalize(l + v);
    let diffuse = max(dot(n, l), 0.0);
    let specular = pow(max(dot(n, h), 0.0), max(material.params.x, 1.0));
    let lit = material.color.rgb * (frame.ambient.rgb + frame.light_color.rgb * diffuse);
    return vec4<f32>(lit + frame.light_color.rgb * specular * 0.25, 1.0);
}
"#;

/// Unlit flat color for scene host lines and points.
pub const SCENE_FLAT_SHADER: &str = r#"
struct Frame {
    view_proj: mat4x4<f32>,
    eye: vec4<f32>,
    ambient: vec4<f32>,
    light_dir: vec4<f32>,
    light_color: vec4<f32>,
};

struct Material {
    color: vec4<f32>,
    params: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: Frame;

@group(1) @binding(0)
var<uniform> material: Material;

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return frame.view_proj * vec4<f32>(position, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(material.color.rgb, 1.0);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(label: &str, source: &str) {
        let module = naga::front::wgsl::parse_str(source)
            .unwrap_or_else(|e| panic!("{label}: {}", e.emit_to_string(source)));
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .unwrap_or_else(|e| panic!("{label}: {e:?}"));
        for entry in ["vs_main", "fs_main"] {
            assert!(
                module.entry_points.iter().any(|ep| ep.name == entry),
                "{label} is missing {entry}"
            );
        }
    }

    #[test]
    fn immediate_shaders_validate() {
        validate("gradient", GRADIENT_SHADER);
        validate("wireframe", WIREFRAME_SHADER);
        validate("points", POINT_SHADER);
    }

    #[test]
    fn scene_shaders_validate() {
        validate("scene_lit", SCENE_LIT_SHADER);
        validate("scene_flat", SCENE_FLAT_SHADER);
    }

    #[test]
    fn broken_source_is_rejected() {
        assert!(naga::front::wgsl::parse_str("fn vs_main( {").is_err());
    }
}
