use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};
use surfview_render::{
    Geometry, GeometryId, Light, Material, MaterialId, ObjectKind, RenderError, Scene, SceneHost,
};
use wgpu::util::DeviceExt;

use crate::gpu::{self, DepthTarget, GpuContext, NORMAL_LAYOUT, POSITION_LAYOUT};
use crate::shaders;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct FrameUniforms {
    view_proj: [[f32; 4]; 4],
    eye: [f32; 4],
    /// rgb premultiplied by intensity
    ambient: [f32; 4],
    light_dir: [f32; 4],
    light_color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct MaterialUniforms {
    color: [f32; 4],
    /// x = shininess, y = double-sided flag
    params: [f32; 4],
}

impl MaterialUniforms {
    fn from_material(material: &Material) -> Self {
        let [r, g, b] = material.color();
        let params = match *material {
            Material::Phong {
                shininess,
                double_sided,
                ..
            } => [shininess, if double_sided { 1.0 } else { 0.0 }, 0.0, 0.0],
            Material::Points { size, .. } => [0.0, 0.0, size, 0.0],
            Material::Line { .. } => [0.0; 4],
        };
        Self {
            color: [r, g, b, 1.0],
            params,
        }
    }
}

fn frame_uniforms(scene: &Scene, view_proj: Mat4) -> FrameUniforms {
    let mut ambient = [0.0; 4];
    let mut light_dir = [0.0, 0.0, 1.0, 0.0];
    let mut light_color = [0.0; 4];
    for light in &scene.lights {
        match *light {
            Light::Ambient { color, intensity } => {
                for i in 0..3 {
                    ambient[i] += color[i] * intensity;
                }
            }
            Light::Directional {
                color,
                intensity,
                position,
            } => {
                let dir = position.normalize_or_zero();
                light_dir = [dir.x, dir.y, dir.z, 0.0];
                light_color = [color[0] * intensity, color[1] * intensity, color[2] * intensity, 1.0];
            }
        }
    }
    let eye = camera_position(view_proj).extend(1.0).to_array();
    FrameUniforms {
        view_proj: view_proj.to_cols_array_2d(),
        eye,
        ambient,
        light_dir,
        light_color,
    }
}

/// World-space eye of a perspective view-projection: the point whose clip
/// coordinates are `(0, 0, z, 0)`. Orthographic or degenerate matrices have
/// no such point and yield the origin.
fn camera_position(view_proj: Mat4) -> Vec3 {
    let h = view_proj.inverse() * Vec4::new(0.0, 0.0, 1.0, 0.0);
    if h.w.abs() <= f32::EPSILON || !h.is_finite() {
        return Vec3::ZERO;
    }
    h.truncate() / h.w
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DrawCall {
    Indexed(u32),
    Vertices(u32),
}

/// The draw a geometry needs, or `None` when it has no vertices or an empty
/// index list.
fn draw_call(geometry: &Geometry) -> Option<DrawCall> {
    let vertices = geometry.vertex_count() as u32;
    if vertices == 0 {
        return None;
    }
    match &geometry.indices {
        Some(indices) if indices.is_empty() => None,
        Some(indices) => Some(DrawCall::Indexed(indices.len() as u32)),
        None => Some(DrawCall::Vertices(vertices)),
    }
}

struct GpuGeometry {
    positions: wgpu::Buffer,
    normals: Option<wgpu::Buffer>,
    indices: Option<wgpu::Buffer>,
    draw: DrawCall,
}

impl GpuGeometry {
    /// Upload `geometry`. Geometry that draws nothing gets no buffers, since
    /// a zero-sized buffer cannot be bound.
    fn upload(device: &wgpu::Device, geometry: &Geometry) -> Option<Self> {
        let draw = draw_call(geometry)?;
        let vertex_buffer = |label: &str, data: &[f32]| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::VERTEX,
            })
        };
        let positions = vertex_buffer("scene_positions", &geometry.positions);
        let normals = geometry
            .normals
            .as_deref()
            .filter(|normals| !normals.is_empty())
            .map(|normals| vertex_buffer("scene_normals", normals));
        let indices = geometry.indices.as_ref().map(|indices| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("scene_indices"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            })
        });
        Some(Self {
            positions,
            normals,
            indices,
            draw,
        })
    }

    fn destroy(self) {
        self.positions.destroy();
        if let Some(normals) = self.normals {
            normals.destroy();
        }
        if let Some(indices) = self.indices {
            indices.destroy();
        }
    }
}

struct GpuMaterial {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

struct ScenePipelines {
    lit: wgpu::RenderPipeline,
    lines: wgpu::RenderPipeline,
    points: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    depth: DepthTarget,
}

impl ScenePipelines {
    fn destroy(self) {
        self.frame_buffer.destroy();
        self.depth.destroy();
    }
}

/// GPU realization of the retained scene: lit triangles, line lists and
/// point lists drawn into one window surface.
///
/// The host exposes a single display target named by `target_id`.
pub struct WgpuSceneHost {
    gpu: GpuContext,
    target_id: String,
    attached: bool,
    frame_layout: wgpu::BindGroupLayout,
    material_layout: wgpu::BindGroupLayout,
    pipelines: Option<ScenePipelines>,
    /// `None` entries are live ids whose geometry draws nothing.
    geometries: HashMap<GeometryId, Option<GpuGeometry>>,
    materials: HashMap<MaterialId, GpuMaterial>,
    next_id: u64,
}

impl WgpuSceneHost {
    pub fn new(gpu: GpuContext, target_id: impl Into<String>) -> Result<Self, RenderError> {
        let frame_layout = gpu::uniform_layout(&gpu.device, "scene_frame_layout", 1);
        let material_layout = gpu::uniform_layout(&gpu.device, "scene_material_layout", 1);
        let pipelines = build_pipelines(&gpu, &frame_layout, &material_layout)?;
        Ok(Self {
            gpu,
            target_id: target_id.into(),
            attached: false,
            frame_layout,
            material_layout,
            pipelines: Some(pipelines),
            geometries: HashMap::new(),
            materials: HashMap::new(),
            next_id: 0,
        })
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

fn build_pipelines(
    gpu: &GpuContext,
    frame_layout: &wgpu::BindGroupLayout,
    material_layout: &wgpu::BindGroupLayout,
) -> Result<ScenePipelines, RenderError> {
    let device = &gpu.device;
    let format = gpu.format();
    let lit_shader = gpu.compile_shader("scene_lit", shaders::SCENE_LIT_SHADER)?;
    let flat_shader = gpu.compile_shader("scene_flat", shaders::SCENE_FLAT_SHADER)?;

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("scene_pipeline_layout"),
        bind_group_layouts: &[frame_layout, material_layout],
        push_constant_ranges: &[],
    });

    let pipeline = |label: &str,
                    module: &wgpu::ShaderModule,
                    buffers: &[wgpu::VertexBufferLayout<'static>],
                    topology: wgpu::PrimitiveTopology,
                    bias: wgpu::DepthBiasState| {
        gpu.validated(label, |device| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers,
                },
                fragment: Some(wgpu::FragmentState {
                    module,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(gpu::depth_state(bias)),
                multisample: Default::default(),
                multiview: None,
                cache: None,
            })
        })
    };

    // Surface material polygon offset (factor 1, units 1) pushes the fill
    // back behind its edge overlay.
    let lit = pipeline(
        "scene_lit",
        &lit_shader,
        &[POSITION_LAYOUT, NORMAL_LAYOUT],
        wgpu::PrimitiveTopology::TriangleList,
        wgpu::DepthBiasState {
            constant: 1,
            slope_scale: 1.0,
            clamp: 0.0,
        },
    )?;
    let lines = pipeline(
        "scene_lines",
        &flat_shader,
        &[POSITION_LAYOUT],
        wgpu::PrimitiveTopology::LineList,
        Default::default(),
    )?;
    let points = pipeline(
        "scene_points",
        &flat_shader,
        &[POSITION_LAYOUT],
        wgpu::PrimitiveTopology::PointList,
        Default::default(),
    )?;

    let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("scene_frame_uniforms"),
        size: std::mem::size_of::<FrameUniforms>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("scene_frame_bind_group"),
        layout: frame_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: frame_buffer.as_entire_binding(),
        }],
    });
    let (width, height) = gpu.size();
    let depth = DepthTarget::new(device, width, height);

    Ok(ScenePipelines {
        lit,
        lines,
        points,
        frame_buffer,
        frame_bind_group,
        depth,
    })
}

impl SceneHost for WgpuSceneHost {
    fn has_target(&self, target: &str) -> bool {
        target == self.target_id
    }

    fn attach(&mut self, target: &str) -> Option<(u32, u32)> {
        if target != self.target_id {
            return None;
        }
        if self.pipelines.is_none() {
            match build_pipelines(&self.gpu, &self.frame_layout, &self.material_layout) {
                Ok(pipelines) => self.pipelines = Some(pipelines),
                Err(e) => {
                    tracing::error!("failed to rebuild scene pipelines: {e}");
                    return None;
                }
            }
        }
        self.attached = true;
        Some(self.gpu.size())
    }

    fn detach(&mut self) {
        self.attached = false;
    }

    fn create_geometry(&mut self, geometry: Geometry) -> GeometryId {
        let uploaded = GpuGeometry::upload(&self.gpu.device, &geometry);
        let id = GeometryId(self.next());
        tracing::debug!(
            ?id,
            vertices = geometry.vertex_count(),
            draw = ?uploaded.as_ref().map(|g| g.draw),
            "created geometry"
        );
        self.geometries.insert(id, uploaded);
        id
    }

    fn release_geometry(&mut self, id: GeometryId) {
        match self.geometries.remove(&id) {
            Some(geometry) => {
                if let Some(geometry) = geometry {
                    geometry.destroy();
                }
                tracing::debug!(?id, "released geometry");
            }
            None => tracing::warn!(?id, "released unknown geometry"),
        }
    }

    fn create_material(&mut self, material: Material) -> MaterialId {
        let buffer = self
            .gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("scene_material"),
                contents: bytemuck::bytes_of(&MaterialUniforms::from_material(&material)),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let bind_group = self
            .gpu
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("scene_material_bind_group"),
                layout: &self.material_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            });
        let id = MaterialId(self.next());
        self.materials.insert(id, GpuMaterial { buffer, bind_group });
        id
    }

    fn release_material(&mut self, id: MaterialId) {
        match self.materials.remove(&id) {
            Some(material) => material.buffer.destroy(),
            None => tracing::warn!(?id, "released unknown material"),
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.gpu.resize(width, height);
        if let Some(pipelines) = &mut self.pipelines {
            pipelines.depth.destroy();
            pipelines.depth = DepthTarget::new(&self.gpu.device, width, height);
        }
    }

    fn render(&mut self, scene: &Scene, view_proj: Mat4) -> Result<(), RenderError> {
        let Some(pipelines) = &self.pipelines else {
            return Err(RenderError::Disposed);
        };
        if !self.attached {
            return Err(RenderError::NotInitialized);
        }
        let Some(output) = self.gpu.acquire()? else {
            return Ok(());
        };

        self.gpu.queue.write_buffer(
            &pipelines.frame_buffer,
            0,
            bytemuck::bytes_of(&frame_uniforms(scene, view_proj)),
        );

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scene_encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(gpu::clear_color(scene.background)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &pipelines.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            pass.set_bind_group(0, &pipelines.frame_bind_group, &[]);

            for object in scene.walk() {
                let (Some(geometry), Some(material)) = (
                    self.geometries.get(&object.geometry),
                    self.materials.get(&object.material),
                ) else {
                    tracing::warn!(name = object.name, "object references released resources");
                    continue;
                };
                let Some(geometry) = geometry else {
                    continue;
                };

                match (object.kind, geometry.draw) {
                    (ObjectKind::Mesh, DrawCall::Indexed(count)) => {
                        let (Some(normals), Some(indices)) = (&geometry.normals, &geometry.indices)
                        else {
                            continue;
                        };
                        pass.set_pipeline(&pipelines.lit);
                        pass.set_bind_group(1, &material.bind_group, &[]);
                        pass.set_vertex_buffer(0, geometry.positions.slice(..));
                        pass.set_vertex_buffer(1, normals.slice(..));
                        pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                        pass.draw_indexed(0..count, 0, 0..1);
                    }
                    (ObjectKind::LineSegments, DrawCall::Vertices(count)) => {
                        pass.set_pipeline(&pipelines.lines);
                        pass.set_bind_group(1, &material.bind_group, &[]);
                        pass.set_vertex_buffer(0, geometry.positions.slice(..));
                        pass.draw(0..count, 0..1);
                    }
                    (ObjectKind::Points, DrawCall::Vertices(count)) => {
                        pass.set_pipeline(&pipelines.points);
                        pass.set_bind_group(1, &material.bind_group, &[]);
                        pass.set_vertex_buffer(0, geometry.positions.slice(..));
                        pass.draw(0..count, 0..1);
                    }
                    (kind, draw) => {
                        tracing::warn!(name = object.name, ?kind, ?draw, "geometry does not fit object kind");
                    }
                }
            }
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn dispose_renderer(&mut self) {
        if let Some(pipelines) = self.pipelines.take() {
            pipelines.destroy();
            tracing::info!("scene renderer disposed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_blocks_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 64 + 4 * 16);
        assert_eq!(std::mem::size_of::<MaterialUniforms>(), 2 * 16);
    }

    #[test]
    fn default_lights_fold_into_frame_uniforms() {
        let u = frame_uniforms(&Scene::default(), Mat4::IDENTITY);
        assert!((u.ambient[0] - 0.6).abs() < 1e-6);
        assert!((u.light_color[0] - 0.4).abs() < 1e-6);
        let dir = Vec3::new(u.light_dir[0], u.light_dir[1], u.light_dir[2]);
        assert!((dir.length() - 1.0).abs() < 1e-5);
        assert!(dir.y > dir.x);
    }

    #[test]
    fn eye_is_recovered_from_view_projection() {
        let camera = surfview_render::OrbitCamera::default();
        let eye = camera_position(camera.view_projection());
        assert!(eye.distance(camera.eye) < 1e-3);
    }

    fn triangle(indices: Vec<u32>) -> Geometry {
        Geometry {
            positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            indices: Some(indices),
            normals: Some(vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]),
        }
    }

    #[test]
    fn empty_geometry_has_no_draw() {
        assert_eq!(draw_call(&Geometry::from_positions(Vec::new())), None);
        assert_eq!(draw_call(&triangle(Vec::new())), None);
        let no_vertices = Geometry {
            positions: Vec::new(),
            indices: Some(vec![0, 1, 2]),
            normals: None,
        };
        assert_eq!(draw_call(&no_vertices), None);
    }

    #[test]
    fn draw_counts_follow_geometry() {
        assert_eq!(draw_call(&triangle(vec![0, 1, 2])), Some(DrawCall::Indexed(3)));
        let segments = Geometry::from_positions(vec![0.0; 12]);
        assert_eq!(draw_call(&segments), Some(DrawCall::Vertices(4)));
    }

    #[test]
    fn empty_geometry_uploads_no_buffers() {
        let Some((device, _queue)) = gpu::test_device() else {
            return;
        };
        assert!(GpuGeometry::upload(&device, &Geometry::from_positions(Vec::new())).is_none());
        assert!(GpuGeometry::upload(&device, &triangle(Vec::new())).is_none());

        let uploaded = GpuGeometry::upload(&device, &triangle(vec![0, 1, 2])).unwrap();
        assert_eq!(uploaded.draw, DrawCall::Indexed(3));
        assert!(uploaded.normals.is_some());
        assert_eq!(uploaded.indices.as_ref().map(wgpu::Buffer::size), Some(12));
        uploaded.destroy();
    }

    #[test]
    fn surface_material_flags() {
        let u = MaterialUniforms::from_material(&Material::surface());
        assert_eq!(u.params[0], 30.0);
        assert_eq!(u.params[1], 1.0);
        let edges = MaterialUniforms::from_material(&Material::edges());
        assert_eq!(edges.color, [0.0, 0.0, 0.0, 1.0]);
    }
}
