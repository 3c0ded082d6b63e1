use surfview_input::{Action, ActionQueue};
use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton, MouseScrollDelta};
use winit::keyboard::KeyCode;

/// Pixels of trackpad scroll that count as one wheel notch.
const PIXELS_PER_NOTCH: f64 = 50.0;

/// Translates raw window input into viewer actions.
#[derive(Debug, Default)]
pub struct InputMapper {
    dragging: bool,
    cursor: Option<PhysicalPosition<f64>>,
}

impl InputMapper {
    pub fn key(&self, key: KeyCode, state: ElementState, queue: &mut ActionQueue) {
        if state == ElementState::Pressed && key == KeyCode::Escape {
            queue.push(Action::Exit);
        }
    }

    pub fn button(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left {
            self.dragging = state == ElementState::Pressed;
        }
    }

    /// Left-drag orbits; plain motion only tracks the cursor.
    pub fn cursor_moved(&mut self, position: PhysicalPosition<f64>, queue: &mut ActionQueue) {
        if let (true, Some(last)) = (self.dragging, self.cursor) {
            queue.push(Action::Orbit {
                dx: (position.x - last.x) as f32,
                dy: (position.y - last.y) as f32,
            });
        }
        self.cursor = Some(position);
    }

    pub fn wheel(&self, delta: MouseScrollDelta, queue: &mut ActionQueue) {
        let notches = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(p) => (p.y / PIXELS_PER_NOTCH) as f32,
        };
        if notches != 0.0 {
            queue.push(Action::Zoom(notches));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_press_exits() {
        let mapper = InputMapper::default();
        let mut queue = ActionQueue::new();
        mapper.key(KeyCode::Escape, ElementState::Released, &mut queue);
        assert!(queue.is_empty());
        mapper.key(KeyCode::KeyQ, ElementState::Pressed, &mut queue);
        assert!(queue.is_empty());
        mapper.key(KeyCode::Escape, ElementState::Pressed, &mut queue);
        assert!(queue.exit_requested());
    }

    #[test]
    fn drag_produces_orbit_deltas() {
        let mut mapper = InputMapper::default();
        let mut queue = ActionQueue::new();
        mapper.cursor_moved(PhysicalPosition::new(10.0, 10.0), &mut queue);
        assert!(queue.is_empty());

        mapper.button(MouseButton::Left, ElementState::Pressed);
        mapper.cursor_moved(PhysicalPosition::new(15.0, 8.0), &mut queue);
        mapper.cursor_moved(PhysicalPosition::new(20.0, 8.0), &mut queue);
        assert_eq!(queue.drain(), vec![Action::Orbit { dx: 10.0, dy: -2.0 }]);

        mapper.button(MouseButton::Left, ElementState::Released);
        mapper.cursor_moved(PhysicalPosition::new(40.0, 40.0), &mut queue);
        assert!(queue.is_empty());
    }

    #[test]
    fn wheel_maps_to_zoom_notches() {
        let mapper = InputMapper::default();
        let mut queue = ActionQueue::new();
        mapper.wheel(MouseScrollDelta::LineDelta(0.0, 2.0), &mut queue);
        mapper.wheel(MouseScrollDelta::LineDelta(0.0, 0.0), &mut queue);
        assert_eq!(queue.drain(), vec![Action::Zoom(2.0)]);

        mapper.wheel(
            MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -100.0)),
            &mut queue,
        );
        assert_eq!(queue.drain(), vec![Action::Zoom(-2.0)]);
    }
}
