use std::time::Duration;

use surfview_input::Action;

use crate::surface::{FrameContext, RenderError, RenderSurface};

/// Longest frame delta fed to the spin clock, in seconds. Keeps the model
/// from jumping after a stall (window drag, breakpoint).
pub const MAX_FRAME_DT: f32 = 0.1;

/// Accumulates the model rotation angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinClock {
    pub angle: f32,
    /// Radians per second.
    pub speed: f32,
}

impl Default for SpinClock {
    fn default() -> Self {
        Self {
            angle: 0.0,
            speed: 0.5,
        }
    }
}

impl SpinClock {
    pub fn with_speed(speed: f32) -> Self {
        Self { angle: 0.0, speed }
    }

    pub fn advance(&mut self, dt: f32) -> f32 {
        self.angle += dt * self.speed;
        self.angle
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

/// Drives a [`RenderSurface`] once per display refresh.
#[derive(Debug, Default)]
pub struct PresentationLoop {
    clock: SpinClock,
    frames: u64,
    stopped: bool,
}

impl PresentationLoop {
    pub fn new(clock: SpinClock) -> Self {
        Self {
            clock,
            frames: 0,
            stopped: false,
        }
    }

    pub fn angle(&self) -> f32 {
        self.clock.angle
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Run one frame: advance the spin, apply `actions` in order, then draw.
    ///
    /// An [`Action::Exit`] stops the loop before anything is drawn. A stopped
    /// loop keeps returning [`LoopControl::Exit`].
    pub fn tick<S: RenderSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        dt: Duration,
        actions: &[Action],
    ) -> Result<LoopControl, RenderError> {
        if self.stopped {
            return Ok(LoopControl::Exit);
        }

        let dt = dt.as_secs_f32().min(MAX_FRAME_DT);
        let model_angle = self.clock.advance(dt);

        for action in actions {
            match *action {
                Action::Exit => {
                    tracing::info!(frames = self.frames, "presentation loop exiting");
                    self.stopped = true;
                    return Ok(LoopControl::Exit);
                }
                Action::Resize { width, height } => surface.resize(width, height)?,
                Action::Orbit { dx, dy } => surface.orbit(dx, dy),
                Action::Zoom(delta) => surface.zoom(delta),
            }
        }

        surface.render_frame(&FrameContext { dt, model_angle })?;
        self.frames += 1;
        Ok(LoopControl::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::SurfaceStats;
    use surfview_common::{Mesh, PointCloud};

    #[derive(Default)]
    struct Recorder {
        frames: Vec<FrameContext>,
        resizes: Vec<(u32, u32)>,
        orbits: usize,
    }

    impl RenderSurface for Recorder {
        fn show_points(&mut self, _: &PointCloud) -> Result<(), RenderError> {
            Ok(())
        }
        fn show_mesh(&mut self, _: &Mesh) -> Result<(), RenderError> {
            Ok(())
        }
        fn clear(&mut self) -> Result<(), RenderError> {
            Ok(())
        }
        fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
            self.resizes.push((width, height));
            Ok(())
        }
        fn render_frame(&mut self, frame: &FrameContext) -> Result<(), RenderError> {
            self.frames.push(*frame);
            Ok(())
        }
        fn orbit(&mut self, _dx: f32, _dy: f32) {
            self.orbits += 1;
        }
        fn stats(&self) -> SurfaceStats {
            SurfaceStats::default()
        }
        fn dispose(&mut self) {}
    }

    #[test]
    fn spin_angle_grows_by_dt_times_speed() {
        let mut clock = SpinClock::default();
        clock.advance(0.02);
        clock.advance(0.02);
        assert!((clock.angle - 0.02).abs() < 1e-6);
    }

    #[test]
    fn exit_stops_without_drawing() {
        let mut surface = Recorder::default();
        let mut frames = PresentationLoop::default();
        let control = frames
            .tick(&mut surface, Duration::from_millis(16), &[Action::Exit])
            .unwrap();
        assert_eq!(control, LoopControl::Exit);
        assert!(surface.frames.is_empty());
        assert!(frames.is_stopped());

        let again = frames
            .tick(&mut surface, Duration::from_millis(16), &[])
            .unwrap();
        assert_eq!(again, LoopControl::Exit);
        assert!(surface.frames.is_empty());
    }

    #[test]
    fn actions_apply_before_the_draw() {
        let mut surface = Recorder::default();
        let mut frames = PresentationLoop::default();
        frames
            .tick(
                &mut surface,
                Duration::from_millis(16),
                &[
                    Action::Resize {
                        width: 320,
                        height: 200,
                    },
                    Action::Orbit { dx: 1.0, dy: 0.0 },
                ],
            )
            .unwrap();
        assert_eq!(surface.resizes, vec![(320, 200)]);
        assert_eq!(surface.orbits, 1);
        assert_eq!(surface.frames.len(), 1);
        assert_eq!(frames.frames(), 1);
    }

    #[test]
    fn long_stall_is_clamped() {
        let mut surface = Recorder::default();
        let mut frames = PresentationLoop::default();
        frames
            .tick(&mut surface, Duration::from_secs(5), &[])
            .unwrap();
        let frame = surface.frames[0];
        assert_eq!(frame.dt, MAX_FRAME_DT);
        assert!((frame.model_angle - MAX_FRAME_DT * 0.5).abs() < 1e-6);
    }

    #[test]
    fn drives_retained_viewer() {
        use crate::{HeadlessHost, RetainedViewer};

        let mut viewer = RetainedViewer::new(HeadlessHost::new().with_target("viewer", 800, 600));
        viewer.initialize("viewer").unwrap();
        let mut frames = PresentationLoop::default();
        for _ in 0..3 {
            frames
                .tick(&mut viewer, Duration::from_millis(16), &[])
                .unwrap();
        }
        assert_eq!(viewer.host().frames(), 3);
    }
}
