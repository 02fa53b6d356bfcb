use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::{Mat4, Vec3};

/// Radians per second for the arrow keys.
const AIM_SPEED: f32 = 1.8;
const MAX_PITCH: f32 = FRAC_PI_2 - 0.01;
const NEAR_PLANE: f32 = 0.01;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CameraMovement {
    pub move_forward: bool,
    pub move_backward: bool,
    pub move_left: bool,
    pub move_right: bool,
    pub move_up: bool,
    pub move_down: bool,
    pub aim_left: bool,
    pub aim_right: bool,
    pub aim_up: bool,
    pub aim_down: bool,
}

impl CameraMovement {
    pub fn any(&self) -> bool {
        *self != Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraController {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub vertical_fov_deg: f32,
    /// Point the arcball rotates about.
    pub pivot: Vec3,
    move_speed: f32,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 5.0), -FRAC_PI_2, 0.0)
    }
}

impl CameraController {
    pub fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        Self {
            position,
            yaw,
            pitch,
            vertical_fov_deg: 60.0,
            pivot: Vec3::ZERO,
            move_speed: 1.5,
        }
    }

    /// Places the camera so the whole of `extent` around `center` fits the
    /// vertical field of view, looking down -Z.
    pub fn frame_bounds(&mut self, vertical_fov_deg: f32, center: Vec3, extent: Vec3) {
        let radius = 0.5 * extent.length();
        let half_fov = (0.5 * vertical_fov_deg.to_radians()).max(1e-3);
        let distance = if radius > 0.0 {
            radius / half_fov.tan()
        } else {
            3.0
        };
        self.vertical_fov_deg = vertical_fov_deg;
        self.pivot = center;
        self.yaw = -FRAC_PI_2;
        self.pitch = 0.0;
        self.position = center + Vec3::Z * (distance + radius);
        self.move_speed = (radius * 0.5).max(1.5);
    }

    pub fn forward(&self) -> Vec3 {
        self.basis().0
    }

    pub fn nudge(&mut self, yaw_delta: f32, pitch_delta: f32, zoom_delta: f32) {
        self.yaw += yaw_delta;
        self.pitch += pitch_delta;
        wrap_angles(&mut self.yaw, &mut self.pitch);
        if zoom_delta != 0.0 {
            let (forward, _, _) = self.basis();
            self.position += forward * zoom_delta;
        }
    }

    pub fn orbit_around(&mut self, pivot: Vec3, yaw_delta: f32, pitch_delta: f32) {
        self.yaw += yaw_delta;
        self.pitch += pitch_delta;
        wrap_angles(&mut self.yaw, &mut self.pitch);

        let distance = self.position.distance(pivot).max(0.05);
        let (dir, _, _) = self.basis();
        self.position = pivot - dir * distance;
    }

    /// Rotates about the pivot, then moves towards it by `zoom_delta`.
    pub fn orbit(&mut self, yaw_delta: f32, pitch_delta: f32, zoom_delta: f32) {
        self.orbit_around(self.pivot, yaw_delta, pitch_delta);
        if zoom_delta != 0.0 {
            let (forward, _, _) = self.basis();
            let distance = self.position.distance(self.pivot);
            let step = zoom_delta.min(distance - 0.05);
            self.position += forward * step;
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.forward(), Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_infinite_rh(self.vertical_fov_deg.to_radians(), aspect, NEAR_PLANE)
    }

    pub fn view_proj_matrix(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        camera_basis(self.yaw, self.pitch)
    }

    /// Moves along the view direction, the horizontal right vector and
    /// world up.
    pub fn translate_local(&mut self, step: Vec3) {
        let (forward, right, _) = self.basis();
        self.position += right * step.x + Vec3::Y * step.y + forward * step.z;
    }

    /// Applies one frame of fly-mode keys. Returns whether anything moved.
    pub fn update_movement(&mut self, input: &CameraMovement, frame_dt: f32) -> bool {
        if !input.any() {
            return false;
        }
        let axis = |positive: bool, negative: bool| f32::from(positive as u8) - f32::from(negative as u8);

        let aim_step = AIM_SPEED * frame_dt;
        self.yaw += axis(input.aim_right, input.aim_left) * aim_step;
        self.pitch += axis(input.aim_up, input.aim_down) * aim_step;
        wrap_angles(&mut self.yaw, &mut self.pitch);

        let step = Vec3::new(
            axis(input.move_right, input.move_left),
            axis(input.move_up, input.move_down),
            axis(input.move_forward, input.move_backward),
        );
        self.translate_local(step * self.move_speed * frame_dt);
        true
    }
}

fn camera_basis(yaw: f32, pitch: f32) -> (Vec3, Vec3, Vec3) {
    let cos_pitch = pitch.cos();
    let forward = Vec3::new(yaw.cos() * cos_pitch, pitch.sin(), yaw.sin() * cos_pitch);
    let right = Vec3::new(-yaw.sin(), 0.0, yaw.cos());
    let up = right.cross(forward).normalize_or_zero();
    (forward, right, up)
}

/// Keeps yaw in [-pi, pi) and pitch short of straight up or down.
fn wrap_angles(yaw: &mut f32, pitch: &mut f32) {
    if yaw.is_finite() {
        *yaw = (*yaw + PI).rem_euclid(TAU) - PI;
    }
    if pitch.is_finite() {
        *pitch = pitch.clamp(-MAX_PITCH, MAX_PITCH);
    }
}
