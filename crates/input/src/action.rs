/// A viewer-level action produced from raw window input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Stop the presentation loop.
    Exit,
    /// The display surface changed size (physical pixels).
    Resize { width: u32, height: u32 },
    /// Orbit the camera by a pointer delta in pixels.
    Orbit { dx: f32, dy: f32 },
    /// Dolly the camera; positive moves closer.
    Zoom(f32),
}

/// Actions collected between two frames.
#[derive(Debug, Default)]
pub struct ActionQueue {
    pending: Vec<Action>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an action. Consecutive resizes collapse into the latest one, and
    /// consecutive orbit deltas are summed.
    pub fn push(&mut self, action: Action) {
        match (self.pending.last_mut(), action) {
            (Some(Action::Resize { width, height }), Action::Resize { width: w, height: h }) => {
                *width = w;
                *height = h;
            }
            (Some(Action::Orbit { dx, dy }), Action::Orbit { dx: ndx, dy: ndy }) => {
                *dx += ndx;
                *dy += ndy;
            }
            _ => self.pending.push(action),
        }
        tracing::trace!(?action, "queued action");
    }

    pub fn exit_requested(&self) -> bool {
        self.pending.contains(&Action::Exit)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take all queued actions, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.pending)
    }
}
