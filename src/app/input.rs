use crate::render::PointerClick;
use winit::event::{ElementState, MouseButton};

/// Tracks the cursor and turns a left press+release into a click.
#[derive(Default, Debug, Clone, Copy)]
pub struct PointerState {
    position: Option<(f32, f32)>,
    left_pressed_at: Option<(f32, f32)>,
}

impl PointerState {
    pub fn handle_cursor_moved(&mut self, x: f64, y: f64) {
        self.position = Some((x as f32, y as f32));
    }

    pub fn handle_cursor_left(&mut self) {
        self.position = None;
        self.left_pressed_at = None;
    }

    /// Current cursor position as a pointer sample, for hover picking.
    pub fn sample(&self, viewport: (u32, u32)) -> Option<PointerClick> {
        let (x, y) = self.position?;
        Some(PointerClick::new(x, y, viewport.0, viewport.1))
    }

    /// Returns a click on left-button release if the press happened inside
    /// the window. Other buttons are ignored.
    pub fn handle_button(
        &mut self,
        button: MouseButton,
        state: ElementState,
        viewport: (u32, u32),
    ) -> Option<PointerClick> {
        if button != MouseButton::Left {
            return None;
        }
        match state {
            ElementState::Pressed => {
                self.left_pressed_at = self.position;
                None
            }
            ElementState::Released => {
                self.left_pressed_at.take()?;
                let (x, y) = self.position?;
                Some(PointerClick::new(x, y, viewport.0, viewport.1))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PointerState;
    use winit::event::{ElementState, MouseButton};

    #[test]
    fn press_and_release_yields_click_at_release_position() {
        let mut pointer = PointerState::default();
        pointer.handle_cursor_moved(100.0, 50.0);
        assert!(pointer
            .handle_button(MouseButton::Left, ElementState::Pressed, (800, 600))
            .is_none());
        pointer.handle_cursor_moved(102.0, 51.0);
        let click = pointer
            .handle_button(MouseButton::Left, ElementState::Released, (800, 600))
            .unwrap();
        assert_eq!((click.x, click.y), (102.0, 51.0));
        assert_eq!((click.viewport_width, click.viewport_height), (800, 600));
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut pointer = PointerState::default();
        pointer.handle_cursor_moved(10.0, 10.0);
        assert!(pointer
            .handle_button(MouseButton::Left, ElementState::Released, (800, 600))
            .is_none());
    }

    #[test]
    fn leaving_the_window_cancels_a_press() {
        let mut pointer = PointerState::default();
        pointer.handle_cursor_moved(10.0, 10.0);
        pointer.handle_button(MouseButton::Left, ElementState::Pressed, (800, 600));
        pointer.handle_cursor_left();
        pointer.handle_cursor_moved(20.0, 20.0);
        assert!(pointer
            .handle_button(MouseButton::Left, ElementState::Released, (800, 600))
            .is_none());
    }

    #[test]
    fn sample_tracks_the_cursor_until_it_leaves() {
        let mut pointer = PointerState::default();
        assert!(pointer.sample((800, 600)).is_none());
        pointer.handle_cursor_moved(30.0, 40.0);
        let sample = pointer.sample((800, 600)).unwrap();
        assert_eq!((sample.x, sample.y), (30.0, 40.0));
        pointer.handle_cursor_left();
        assert!(pointer.sample((800, 600)).is_none());
    }

    #[test]
    fn right_button_is_ignored() {
        let mut pointer = PointerState::default();
        pointer.handle_cursor_moved(10.0, 10.0);
        pointer.handle_button(MouseButton::Right, ElementState::Pressed, (800, 600));
        assert!(pointer
            .handle_button(MouseButton::Right, ElementState::Released, (800, 600))
            .is_none());
    }
}
