use bevy_math::Mat4;
use bevy_math::Vec3;
use d3d12_app_framework::window_state::MouseButtons;
use std::f32::consts::FRAC_PI_4;
use std::f32::consts::PI;

pub const MIN_RADIUS: f32 = 3.0;
pub const MAX_RADIUS: f32 = 15.0;
const PHI_MARGIN: f32 = 0.1;
/// Rotation per pixel of left-button drag, in degrees.
const DEGREES_PER_PIXEL: f32 = 0.25;
/// Zoom per pixel of right-button drag, in world units.
const UNITS_PER_PIXEL: f32 = 0.005;

/// A camera on a sphere around the origin, always looking at it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    /// Azimuth in the xz plane.
    pub theta: f32,
    /// Polar angle from +y.
    pub phi: f32,
    pub radius: f32,
    last_mouse_position: (i32, i32),
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            theta: 1.5 * PI,
            phi: FRAC_PI_4,
            radius: 5.0,
            last_mouse_position: (0, 0),
        }
    }
}

impl OrbitCamera {
    /// Remembers where a drag started.
    pub fn begin_drag(&mut self, x: i32, y: i32) {
        self.last_mouse_position = (x, y);
    }

    /// Left button orbits, right button zooms. Other moves only track the cursor.
    pub fn drag(&mut self, buttons: MouseButtons, x: i32, y: i32) {
        let dx = (x - self.last_mouse_position.0) as f32;
        let dy = (y - self.last_mouse_position.1) as f32;

        if buttons.contains(MouseButtons::LEFT) {
            self.theta += (DEGREES_PER_PIXEL * dx).to_radians();
            self.phi += (DEGREES_PER_PIXEL * dy).to_radians();
            self.phi = self.phi.clamp(PHI_MARGIN, PI - PHI_MARGIN);
        } else if buttons.contains(MouseButtons::RIGHT) {
            self.radius += UNITS_PER_PIXEL * dx - UNITS_PER_PIXEL * dy;
            self.radius = self.radius.clamp(MIN_RADIUS, MAX_RADIUS);
        }

        self.last_mouse_position = (x, y);
    }

    /// Spherical to cartesian.
    pub fn eye_position(&self) -> Vec3 {
        Vec3::new(
            self.radius * self.phi.sin() * self.theta.cos(),
            self.radius * self.phi.cos(),
            self.radius * self.phi.sin() * self.theta.sin(),
        )
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_lh(self.eye_position(), Vec3::ZERO, Vec3::Y)
    }
}

/// Left-handed perspective: 45 degree vertical field of view, near plane 1, far plane 1000.
pub fn projection(aspect_ratio: f32) -> Mat4 {
    Mat4::perspective_lh(0.25 * PI, aspect_ratio, 1.0, 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use bevy_math::Vec4;

    #[test]
    fn starts_behind_and_above_the_box() {
        let eye = OrbitCamera::default().eye_position();
        let expected = 5.0 * FRAC_PI_4.sin();
        assert_relative_eq!(eye.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(eye.y, expected, epsilon = 1e-5);
        assert_relative_eq!(eye.z, -expected, epsilon = 1e-5);
    }

    #[test]
    fn left_drag_rotates_a_quarter_degree_per_pixel() {
        let mut camera = OrbitCamera::default();
        camera.begin_drag(100, 100);
        camera.drag(MouseButtons::LEFT, 104, 100);
        assert_relative_eq!(camera.theta, 1.5 * PI + 1f32.to_radians(), epsilon = 1e-6);
        assert_relative_eq!(camera.phi, FRAC_PI_4, epsilon = 1e-6);
    }

    #[test]
    fn phi_stays_off_the_poles() {
        let mut camera = OrbitCamera::default();
        camera.begin_drag(0, 0);
        camera.drag(MouseButtons::LEFT, 0, 10_000);
        assert_relative_eq!(camera.phi, PI - 0.1);
        camera.drag(MouseButtons::LEFT, 0, -10_000);
        assert_relative_eq!(camera.phi, 0.1);
    }

    #[test]
    fn right_drag_zooms_within_limits() {
        let mut camera = OrbitCamera::default();
        camera.begin_drag(0, 0);
        camera.drag(MouseButtons::RIGHT, 100, 0);
        assert_relative_eq!(camera.radius, 5.5, epsilon = 1e-5);
        camera.drag(MouseButtons::RIGHT, 100, 100);
        assert_relative_eq!(camera.radius, 5.0, epsilon = 1e-5);
        camera.drag(MouseButtons::RIGHT, 10_000, 100);
        assert_relative_eq!(camera.radius, MAX_RADIUS);
        camera.drag(MouseButtons::RIGHT, -10_000, 100);
        assert_relative_eq!(camera.radius, MIN_RADIUS);
    }

    #[test]
    fn moving_without_buttons_only_tracks_the_cursor() {
        let mut camera = OrbitCamera::default();
        camera.begin_drag(0, 0);
        camera.drag(MouseButtons::empty(), 50, 50);
        assert_eq!(camera.theta, OrbitCamera::default().theta);
        // The next drag is measured from where the cursor was last seen.
        camera.drag(MouseButtons::LEFT, 54, 50);
        assert_relative_eq!(camera.theta, 1.5 * PI + 1f32.to_radians(), epsilon = 1e-6);
    }

    #[test]
    fn origin_projects_to_the_middle_of_the_screen() {
        let camera = OrbitCamera::default();
        let world_view_proj = projection(800.0 / 600.0) * camera.view();
        let clip = world_view_proj * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!(clip.w > 0.0);
        let ndc = clip / clip.w;
        assert_relative_eq!(ndc.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(ndc.y, 0.0, epsilon = 1e-5);
        assert!((0.0..=1.0).contains(&ndc.z));
    }

    #[test]
    fn the_top_of_the_box_appears_above_its_centre() {
        let camera = OrbitCamera::default();
        let world_view_proj = projection(1.0) * camera.view();
        let top = world_view_proj * Vec4::new(0.0, 1.0, 0.0, 1.0);
        assert!(top.y / top.w > 0.0);
    }
}
