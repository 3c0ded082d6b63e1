use glam::{Mat4, Vec3};
use std::f32::consts::{PI, TAU};

/// Perspective projection parameters. `fov_y` is in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perspective {
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Perspective {
    pub fn new(fov_degrees: f32, near: f32, far: f32) -> Self {
        Self {
            fov_y: fov_degrees.to_radians(),
            aspect: 4.0 / 3.0,
            near,
            far,
        }
    }

    /// Match the aspect ratio to a viewport. Zero-sized viewports keep the
    /// previous aspect.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }
}

/// Rotation by `angle` about the vertical axis through `center`.
pub fn model_rotation(center: Vec3, angle: f32) -> Mat4 {
    Mat4::from_translation(center) * Mat4::from_rotation_z(angle) * Mat4::from_translation(-center)
}

/// Static Z-up camera used by the immediate backend. The scene spins under it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedCamera {
    pub eye: Vec3,
    pub target: Vec3,
    pub projection: Perspective,
}

impl Default for FixedCamera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(6.0, 6.0, 10.0),
            target: Vec3::new(2.0, 2.0, 0.0),
            projection: Perspective::new(45.0, 0.1, 100.0),
        }
    }
}

impl FixedCamera {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Z)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection.matrix() * self.view_matrix()
    }
}

/// Z-up camera steered by [`OrbitControls`]. Used by the retained backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub eye: Vec3,
    pub target: Vec3,
    pub projection: Perspective,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(3.0, 8.0, 3.0),
            target: Vec3::new(2.0, 2.0, 1.0),
            projection: Perspective::new(75.0, 0.1, 1000.0),
        }
    }
}

impl OrbitCamera {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Z)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection.matrix() * self.view_matrix()
    }

    pub fn distance(&self) -> f32 {
        self.eye.distance(self.target)
    }
}

const POLE_EPSILON: f32 = 1e-3;

/// Orbit controls with damped inertia, orbiting around the camera target.
///
/// Pointer input only queues angular deltas; [`OrbitControls::update`] applies
/// a `damping_factor` share of them each tick and decays the rest, so motion
/// eases out over several frames.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitControls {
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    delta_azimuth: f32,
    delta_polar: f32,
    scale: f32,
    enabled: bool,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 0.1,
            max_distance: 500.0,
            delta_azimuth: 0.0,
            delta_polar: 0.0,
            scale: 1.0,
            enabled: true,
        }
    }
}

impl OrbitControls {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Queue an orbit from a pointer drag of `(dx, dy)` pixels on a viewport
    /// `viewport_height` pixels tall. A drag of the full height is one turn.
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: u32) {
        if !self.enabled {
            return;
        }
        let h = viewport_height.max(1) as f32;
        self.delta_azimuth -= TAU * dx / h * self.rotate_speed;
        self.delta_polar -= TAU * dy / h * self.rotate_speed;
    }

    /// Queue a dolly. Positive `delta` moves toward the target.
    pub fn zoom(&mut self, delta: f32) {
        if !self.enabled {
            return;
        }
        self.scale *= 0.95_f32.powf(delta * self.zoom_speed);
    }

    /// Apply queued motion to `camera`. Returns true if the camera moved.
    pub fn update(&mut self, camera: &mut OrbitCamera) -> bool {
        let offset = camera.eye - camera.target;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return false;
        }

        let mut azimuth = offset.y.atan2(offset.x);
        let mut polar = (offset.z / radius).clamp(-1.0, 1.0).acos();

        azimuth += self.delta_azimuth * self.damping_factor;
        polar += self.delta_polar * self.damping_factor;
        polar = polar.clamp(POLE_EPSILON, PI - POLE_EPSILON);

        let new_radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);
        self.scale = 1.0;

        let new_offset = Vec3::new(
            new_radius * polar.sin() * azimuth.cos(),
            new_radius * polar.sin() * azimuth.sin(),
            new_radius * polar.cos(),
        );

        self.delta_azimuth *= 1.0 - self.damping_factor;
        self.delta_polar *= 1.0 - self.damping_factor;

        let moved = new_offset.distance_squared(offset) > 1e-10;
        if moved {
            camera.eye = camera.target + new_offset;
        }
        moved
    }

    /// Stop reacting to input and drop any queued motion.
    pub fn dispose(&mut self) {
        self.enabled = false;
        self.delta_azimuth = 0.0;
        self.delta_polar = 0.0;
        self.scale = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn azimuth(camera: &OrbitCamera) -> f32 {
        let o = camera.eye - camera.target;
        o.y.atan2(o.x)
    }

    #[test]
    fn default_matrices_are_finite() {
        let vp = OrbitCamera::default().view_projection();
        assert!(vp.is_finite());
        assert!(FixedCamera::default().view_projection().is_finite());
    }

    #[test]
    fn resize_keeps_squares_square() {
        let mut p = Perspective::new(45.0, 0.1, 100.0);
        p.set_viewport(1600, 800);
        let m = p.matrix();
        // x scale times aspect equals y scale: no horizontal stretch
        assert!((m.x_axis.x * 2.0 - m.y_axis.y).abs() < 1e-5);

        p.set_viewport(600, 900);
        let m = p.matrix();
        assert!((m.x_axis.x * (600.0 / 900.0) - m.y_axis.y).abs() < 1e-5);
    }

    #[test]
    fn zero_viewport_keeps_aspect() {
        let mut p = Perspective::new(45.0, 0.1, 100.0);
        p.set_viewport(800, 600);
        p.set_viewport(0, 600);
        assert_eq!(p.aspect, 800.0 / 600.0);
    }

    #[test]
    fn model_rotation_fixes_center() {
        let center = Vec3::new(2.0, 2.0, 0.0);
        let m = model_rotation(center, 1.3);
        assert!(m.transform_point3(center).distance(center) < 1e-5);
        let p = m.transform_point3(Vec3::new(3.0, 2.0, 0.5));
        assert!((p.distance(center) - Vec3::new(1.0, 0.0, 0.5).length()).abs() < 1e-5);
        assert!((p.z - 0.5).abs() < 1e-6);
    }

    #[test]
    fn damping_decays_rotation_geometrically() {
        let mut camera = OrbitCamera::default();
        let mut controls = OrbitControls::default();
        controls.rotate(100.0, 0.0, 600);

        let a0 = azimuth(&camera);
        controls.update(&mut camera);
        let a1 = azimuth(&camera);
        controls.update(&mut camera);
        let a2 = azimuth(&camera);

        let step1 = (a1 - a0).abs();
        let step2 = (a2 - a1).abs();
        assert!(step1 > 0.0);
        assert!((step2 / step1 - 0.95).abs() < 1e-3);
    }

    #[test]
    fn polar_angle_never_reaches_pole() {
        let mut camera = OrbitCamera::default();
        let mut controls = OrbitControls::default();
        controls.rotate(0.0, -100_000.0, 600);
        for _ in 0..200 {
            controls.update(&mut camera);
        }
        let o = camera.eye - camera.target;
        assert!(o.z < 0.0);
        assert!(o.truncate().length() > 1e-4);
        assert!(camera.view_projection().is_finite());
    }

    #[test]
    fn zoom_moves_toward_target() {
        let mut camera = OrbitCamera::default();
        let mut controls = OrbitControls::default();
        let before = camera.distance();
        controls.zoom(3.0);
        controls.update(&mut camera);
        assert!(camera.distance() < before);
    }

    #[test]
    fn disposed_controls_ignore_input() {
        let mut camera = OrbitCamera::default();
        let mut controls = OrbitControls::default();
        controls.dispose();
        controls.rotate(500.0, 500.0, 600);
        controls.zoom(10.0);
        assert!(!controls.update(&mut camera));
        assert_eq!(camera, OrbitCamera::default());
    }
}
