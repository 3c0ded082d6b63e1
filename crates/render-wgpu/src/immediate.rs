use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use surfview_common::{Mesh, PointCloud};
use surfview_mesh::{
    Bounds, HeightGradient, MeshBuffers, build_mesh_buffers, build_point_buffers, dedup_edges,
};
use surfview_render::{
    FixedCamera, FrameContext, RenderError, RenderSurface, SurfaceStats, model_rotation,
};
use wgpu::util::DeviceExt;

use crate::gpu::{self, DepthTarget, GpuContext, POSITION_LAYOUT};
use crate::shaders;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct Uniforms {
    mvp: [[f32; 4]; 4],
    low_color: [f32; 4],
    high_color: [f32; 4],
    wire_color: [f32; 4],
    point_color: [f32; 4],
    /// x = min height, y = max height.
    height_range: [f32; 4],
}

fn rgba(rgb: [f32; 3]) -> [f32; 4] {
    [rgb[0], rgb[1], rgb[2], 1.0]
}

/// Colors and camera of the immediate backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImmediateSettings {
    pub clear_color: [f32; 3],
    pub gradient: HeightGradient,
    pub wire_color: [f32; 3],
    pub point_color: [f32; 3],
    pub camera: FixedCamera,
}

impl Default for ImmediateSettings {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0],
            gradient: HeightGradient::default(),
            wire_color: [0.7, 0.7, 0.7],
            point_color: [1.0, 0.0, 0.0],
            camera: FixedCamera::default(),
        }
    }
}

impl ImmediateSettings {
    fn uniforms(&self, mvp: Mat4) -> Uniforms {
        Uniforms {
            mvp: mvp.to_cols_array_2d(),
            low_color: rgba(self.gradient.low),
            high_color: rgba(self.gradient.high),
            wire_color: rgba(self.wire_color),
            point_color: rgba(self.point_color),
            height_range: [self.gradient.min, self.gradient.max, 0.0, 0.0],
        }
    }
}

/// GPU memory held by one display slot.
trait Release {
    fn release(self);
}

struct MeshUpload {
    /// Vertex and index buffers. `None` for a mesh without faces, which is
    /// displayed but draws nothing.
    buffers: Option<(wgpu::Buffer, wgpu::Buffer)>,
    index_count: u32,
    center: Vec3,
    edges: usize,
}

impl MeshUpload {
    fn new(device: &wgpu::Device, mesh: &MeshBuffers, center: Vec3, edges: usize) -> Self {
        let buffers = (!mesh.indices.is_empty()).then(|| {
            let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("mesh_vertex_buffer"),
                contents: bytemuck::cast_slice(&mesh.positions),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("mesh_index_buffer"),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
            (vertices, indices)
        });
        Self {
            buffers,
            index_count: mesh.index_count() as u32,
            center,
            edges,
        }
    }
}

impl Release for MeshUpload {
    fn release(self) {
        if let Some((vertices, indices)) = self.buffers {
            vertices.destroy();
            indices.destroy();
        }
        tracing::debug!(indices = self.index_count, "released mesh buffers");
    }
}

struct PointUpload {
    /// `None` for an empty cloud.
    buffer: Option<wgpu::Buffer>,
    count: u32,
}

impl PointUpload {
    fn new(device: &wgpu::Device, positions: &[f32]) -> Self {
        let buffer = (!positions.is_empty()).then(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("point_vertex_buffer"),
                contents: bytemuck::cast_slice(positions),
                usage: wgpu::BufferUsages::VERTEX,
            })
        });
        Self {
            buffer,
            count: (positions.len() / 3) as u32,
        }
    }
}

impl Release for PointUpload {
    fn release(self) {
        if let Some(buffer) = self.buffer {
            buffer.destroy();
        }
        tracing::debug!(points = self.count, "released point buffer");
    }
}

/// The mesh and point displays of a surface. Installing into a slot releases
/// what it held; after [`DisplaySlots::dispose`] every display call fails.
struct DisplaySlots<M, P> {
    mesh: Option<M>,
    points: Option<P>,
    disposed: bool,
}

impl<M, P> Default for DisplaySlots<M, P> {
    fn default() -> Self {
        Self {
            mesh: None,
            points: None,
            disposed: false,
        }
    }
}

impl<M: Release, P: Release> DisplaySlots<M, P> {
    fn check_live(&self) -> Result<(), RenderError> {
        if self.disposed {
            Err(RenderError::Disposed)
        } else {
            Ok(())
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn mesh(&self) -> Option<&M> {
        self.mesh.as_ref()
    }

    fn points(&self) -> Option<&P> {
        self.points.as_ref()
    }

    fn install_mesh(&mut self, mesh: M) {
        self.release_mesh();
        self.mesh = Some(mesh);
    }

    fn install_points(&mut self, points: P) {
        self.release_points();
        self.points = Some(points);
    }

    fn release_mesh(&mut self) {
        if let Some(mesh) = self.mesh.take() {
            mesh.release();
        }
    }

    fn release_points(&mut self) {
        if let Some(points) = self.points.take() {
            points.release();
        }
    }

    fn clear(&mut self) {
        self.release_mesh();
        self.release_points();
    }

    /// Release both displays and refuse further use. Returns `false` if the
    /// slots were already disposed.
    fn dispose(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.clear();
        self.disposed = true;
        true
    }
}

struct Pipelines {
    gradient: wgpu::RenderPipeline,
    wireframe: wgpu::RenderPipeline,
    points: wgpu::RenderPipeline,
}

/// Draws the mesh directly from uploaded buffers: a height gradient fill, then
/// the same index buffer again in line polygon mode.
///
/// The model spins about the vertical axis through the mesh bounds center by
/// the angle the presentation loop accumulates.
pub struct ImmediateRenderer {
    gpu: GpuContext,
    settings: ImmediateSettings,
    pipelines: Option<Pipelines>,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    depth: DepthTarget,
    slots: DisplaySlots<MeshUpload, PointUpload>,
}

impl ImmediateRenderer {
    /// Features the immediate backend needs from the adapter.
    pub const REQUIRED_FEATURES: wgpu::Features = wgpu::Features::POLYGON_MODE_LINE;

    pub fn new(gpu: GpuContext, settings: ImmediateSettings) -> Result<Self, RenderError> {
        if !gpu.device.features().contains(Self::REQUIRED_FEATURES) {
            return Err(RenderError::MissingFeature("POLYGON_MODE_LINE".into()));
        }

        let mut settings = settings;
        let (width, height) = gpu.size();
        settings.camera.projection.set_viewport(width, height);

        let device = &gpu.device;
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("immediate_uniforms"),
            contents: bytemuck::bytes_of(&settings.uniforms(Mat4::IDENTITY)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let layout = gpu::uniform_layout(device, "immediate_uniform_layout", 1);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("immediate_bind_group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("immediate_pipeline_layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipelines = build_pipelines(&gpu, &pipeline_layout)?;
        let depth = DepthTarget::new(&gpu.device, width, height);

        tracing::info!(width, height, "immediate renderer ready");
        Ok(Self {
            gpu,
            settings,
            pipelines: Some(pipelines),
            uniform_buffer,
            bind_group,
            depth,
            slots: DisplaySlots::default(),
        })
    }

    pub fn settings(&self) -> &ImmediateSettings {
        &self.settings
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }
}

fn build_pipelines(gpu: &GpuContext, layout: &wgpu::PipelineLayout) -> Result<Pipelines, RenderError> {
    let format = gpu.format();
    let gradient_shader = gpu.compile_shader("gradient", shaders::GRADIENT_SHADER)?;
    let wireframe_shader = gpu.compile_shader("wireframe", shaders::WIREFRAME_SHADER)?;
    let point_shader = gpu.compile_shader("points", shaders::POINT_SHADER)?;

    let pipeline = |label: &str,
                    module: &wgpu::ShaderModule,
                    primitive: wgpu::PrimitiveState,
                    bias: wgpu::DepthBiasState| {
        gpu.validated(label, |device| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[POSITION_LAYOUT],
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
                primitive,
                depth_stencil: Some(gpu::depth_state(bias)),
                multisample: Default::default(),
                multiview: None,
                cache: None,
            })
        })
    };

    let gradient = pipeline(
        "gradient",
        &gradient_shader,
        wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        Default::default(),
    )?;
    // Negative bias pulls the lines toward the camera so they win the depth
    // test against the coincident fill.
    let wireframe = pipeline(
        "wireframe",
        &wireframe_shader,
        wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            polygon_mode: wgpu::PolygonMode::Line,
            ..Default::default()
        },
        wgpu::DepthBiasState {
            constant: -1,
            slope_scale: -1.0,
            clamp: 0.0,
        },
    )?;
    let points = pipeline(
        "points",
        &point_shader,
        wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::PointList,
            ..Default::default()
        },
        Default::default(),
    )?;

    Ok(Pipelines {
        gradient,
        wireframe,
        points,
    })
}

impl RenderSurface for ImmediateRenderer {
    fn show_points(&mut self, points: &PointCloud) -> Result<(), RenderError> {
        self.slots.check_live()?;
        let buffers = build_point_buffers(points);
        self.slots.release_points();

        let upload = PointUpload::new(&self.gpu.device, &buffers.positions);
        tracing::debug!(points = upload.count, "uploaded point buffer");
        self.slots.install_points(upload);
        Ok(())
    }

    fn show_mesh(&mut self, mesh: &Mesh) -> Result<(), RenderError> {
        self.slots.check_live()?;
        let buffers = build_mesh_buffers(mesh)?;
        let edges = dedup_edges(&mesh.faces).len();
        let center = Bounds::from_points(&mesh.vertices)
            .map(|b| b.center())
            .unwrap_or(Vec3::ZERO);
        self.slots.release_mesh();

        let upload = MeshUpload::new(&self.gpu.device, &buffers, center, edges);
        tracing::debug!(
            vertices = buffers.vertex_count(),
            indices = upload.index_count,
            ?center,
            "uploaded mesh buffers"
        );
        self.slots.install_mesh(upload);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), RenderError> {
        self.slots.check_live()?;
        self.slots.clear();
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if self.slots.is_disposed() || width == 0 || height == 0 {
            return Ok(());
        }
        self.gpu.resize(width, height);
        self.depth.destroy();
        self.depth = DepthTarget::new(&self.gpu.device, width, height);
        self.settings.camera.projection.set_viewport(width, height);
        tracing::debug!(width, height, "immediate renderer resized");
        Ok(())
    }

    fn render_frame(&mut self, frame: &FrameContext) -> Result<(), RenderError> {
        self.slots.check_live()?;
        let Some(pipelines) = &self.pipelines else {
            return Err(RenderError::Disposed);
        };
        let Some(output) = self.gpu.acquire()? else {
            return Ok(());
        };

        let center = self.slots.mesh().map_or(Vec3::ZERO, |m| m.center);
        let mvp = self.settings.camera.view_projection() * model_rotation(center, frame.model_angle);
        self.gpu.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&self.settings.uniforms(mvp)),
        );

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("immediate_encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("immediate_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(gpu::clear_color(self.settings.clear_color)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            pass.set_bind_group(0, &self.bind_group, &[]);

            if let Some(MeshUpload {
                buffers: Some((vertices, indices)),
                index_count,
                ..
            }) = self.slots.mesh()
            {
                pass.set_vertex_buffer(0, vertices.slice(..));
                pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);

                pass.set_pipeline(&pipelines.gradient);
                pass.draw_indexed(0..*index_count, 0, 0..1);

                pass.set_pipeline(&pipelines.wireframe);
                pass.draw_indexed(0..*index_count, 0, 0..1);
            }

            if let Some(PointUpload {
                buffer: Some(buffer),
                count,
            }) = self.slots.points()
            {
                pass.set_pipeline(&pipelines.points);
                pass.set_vertex_buffer(0, buffer.slice(..));
                pass.draw(0..*count, 0..1);
            }
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn stats(&self) -> SurfaceStats {
        let mesh = self.slots.mesh();
        let points = self.slots.points();
        SurfaceStats {
            has_mesh: mesh.is_some(),
            has_points: points.is_some(),
            triangles: mesh.map_or(0, |m| m.index_count as usize / 3),
            edges: mesh.map_or(0, |m| m.edges),
            points: points.map_or(0, |p| p.count as usize),
        }
    }

    fn dispose(&mut self) {
        if !self.slots.dispose() {
            return;
        }
        self.depth.destroy();
        self.uniform_buffer.destroy();
        self.pipelines = None;
        tracing::info!("immediate renderer disposed");
    }
}

impl Drop for ImmediateRenderer {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use surfview_common::{Face, Point3};

    use super::*;

    #[test]
    fn uniform_block_matches_wgsl_layout() {
        // mat4 + five vec4s, no padding
        assert_eq!(std::mem::size_of::<Uniforms>(), 64 + 5 * 16);
    }

    #[test]
    fn default_settings_match_viewer_defaults() {
        let s = ImmediateSettings::default();
        assert_eq!(s.clear_color, [0.0, 0.0, 0.0]);
        assert_eq!(s.wire_color, [0.7, 0.7, 0.7]);
        assert_eq!(s.gradient.min, -2.0);
        assert_eq!(s.camera.eye, Vec3::new(6.0, 6.0, 10.0));
    }

    /// Slot contents that log their id when released.
    struct Tracked {
        id: u32,
        log: Rc<RefCell<Vec<u32>>>,
    }

    impl Release for Tracked {
        fn release(self) {
            self.log.borrow_mut().push(self.id);
        }
    }

    fn slots() -> (DisplaySlots<Tracked, Tracked>, impl Fn(u32) -> Tracked, Rc<RefCell<Vec<u32>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let handle = log.clone();
        let make = move |id| Tracked {
            id,
            log: handle.clone(),
        };
        (DisplaySlots::default(), make, log)
    }

    #[test]
    fn replacing_a_display_releases_the_previous_one() {
        let (mut slots, make, log) = slots();
        slots.install_mesh(make(1));
        slots.install_points(make(2));
        assert!(log.borrow().is_empty());

        slots.install_mesh(make(3));
        assert_eq!(*log.borrow(), [1]);
        slots.install_points(make(4));
        assert_eq!(*log.borrow(), [1, 2]);
        assert_eq!(slots.mesh().map(|m| m.id), Some(3));
        assert_eq!(slots.points().map(|p| p.id), Some(4));
    }

    #[test]
    fn show_after_clear_installs_fresh_displays() {
        let (mut slots, make, log) = slots();
        slots.install_mesh(make(1));
        slots.install_points(make(2));
        slots.clear();
        assert_eq!(*log.borrow(), [1, 2]);
        assert!(slots.mesh().is_none() && slots.points().is_none());

        slots.check_live().unwrap();
        slots.install_mesh(make(3));
        assert_eq!(slots.mesh().map(|m| m.id), Some(3));
        assert_eq!(*log.borrow(), [1, 2]);
    }

    #[test]
    fn dispose_releases_everything_once() {
        let (mut slots, make, log) = slots();
        slots.install_mesh(make(1));
        slots.install_points(make(2));

        assert!(slots.dispose());
        assert_eq!(*log.borrow(), [1, 2]);
        assert!(slots.is_disposed());
        assert!(matches!(slots.check_live(), Err(RenderError::Disposed)));

        assert!(!slots.dispose());
        assert_eq!(*log.borrow(), [1, 2]);
    }

    #[test]
    fn empty_inputs_upload_no_buffers() {
        let Some((device, _queue)) = gpu::test_device() else {
            return;
        };
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];

        let faceless = build_mesh_buffers(&Mesh::new(vertices.clone(), Vec::new())).unwrap();
        let upload = MeshUpload::new(&device, &faceless, Vec3::ZERO, 0);
        assert!(upload.buffers.is_none());
        assert_eq!(upload.index_count, 0);
        upload.release();

        let triangle = build_mesh_buffers(&Mesh::new(vertices, vec![Face::new(0, 1, 2)])).unwrap();
        let upload = MeshUpload::new(&device, &triangle, Vec3::ZERO, 3);
        let (vertex_buffer, index_buffer) = upload.buffers.as_ref().unwrap();
        assert_eq!((vertex_buffer.size(), index_buffer.size()), (36, 12));
        upload.release();

        let empty = PointUpload::new(&device, &[]);
        assert!(empty.buffer.is_none());
        assert_eq!(empty.count, 0);
        let one = PointUpload::new(&device, &[1.0, 2.0, 3.0]);
        assert_eq!(one.count, 1);
        assert!(one.buffer.is_some());
        one.release();
    }

    #[test]
    fn uniforms_carry_gradient_range() {
        let s = ImmediateSettings::default();
        let u = s.uniforms(Mat4::IDENTITY);
        assert_eq!(u.height_range[..2], [-2.0, 2.0]);
        assert_eq!(u.low_color, [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(u.high_color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(u.mvp, Mat4::IDENTITY.to_cols_array_2d());
    }
}
