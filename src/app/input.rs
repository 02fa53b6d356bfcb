use egui::Key;

use crate::render::CameraMovement;

/// Fly-mode keys, sampled once per frame from egui's held-key set.
#[derive(Default, Debug, Clone, Copy)]
pub struct InputState {
    movement: CameraMovement,
}

impl InputState {
    pub fn update(&mut self, ctx: &egui::Context) -> CameraMovement {
        // Text fields keep their keystrokes.
        if ctx.wants_keyboard_input() {
            self.movement = CameraMovement::default();
        } else {
            self.movement = ctx.input(|i| movement_from_keys(|key| i.key_down(key)));
        }
        self.movement
    }
}

fn movement_from_keys(is_down: impl Fn(Key) -> bool) -> CameraMovement {
    CameraMovement {
        move_forward: is_down(Key::W),
        move_backward: is_down(Key::S),
        move_left: is_down(Key::A),
        move_right: is_down(Key::D),
        move_up: is_down(Key::Q),
        move_down: is_down(Key::Z),
        aim_left: is_down(Key::ArrowLeft),
        aim_right: is_down(Key::ArrowRight),
        aim_up: is_down(Key::ArrowUp),
        aim_down: is_down(Key::ArrowDown),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_fly_keys() {
        let movement = movement_from_keys(|key| matches!(key, Key::W | Key::Q | Key::ArrowLeft));
        assert!(movement.move_forward && movement.move_up && movement.aim_left);
        assert!(!movement.move_backward && !movement.move_down && !movement.aim_right);
    }

    #[test]
    fn no_keys_means_no_movement() {
        assert!(!movement_from_keys(|_| false).any());
    }
}
